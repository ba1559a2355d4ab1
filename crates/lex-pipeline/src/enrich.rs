//! Stage 2: AI enrichment run against Stage-1 records already in the
//! store — case-law summaries and amendment explanations. Neither kind is
//! re-embedded from scratch; only the new text is generated and upserted.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use lex_core::config::constants::{AMENDMENT_COLLECTION, CASELAW_COLLECTION, CASELAW_SUMMARY_COLLECTION};
use lex_core::model::{Amendment, Caselaw, CaselawSummary, SUMMARY_MIN_SOURCE_CHARS, SUMMARY_TRUNCATE_CHARS};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::embed_upsert::embed_and_upsert;
use crate::stats::RunStats;

#[derive(Debug, Clone)]
pub struct EnrichmentClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub concurrency: usize,
}

/// Calls a text-generation LLM the same way the teacher's `generate_impl`
/// builds a Claude Messages API request — bearer/header auth, a system +
/// user prompt, explicit status-code branching — bounded here by a
/// concurrency semaphore rather than WASM host state.
pub struct EnrichmentClient {
    client: reqwest::Client,
    config: EnrichmentClientConfig,
    semaphore: Arc<Semaphore>,
}

impl EnrichmentClient {
    pub fn new(client: reqwest::Client, config: EnrichmentClientConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self { client, config, semaphore }
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String> {
        let _permit = self.semaphore.acquire().await.expect("semaphore never closed");

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 1024,
            "system": system_prompt,
            "messages": [{ "role": "user", "content": user_prompt }],
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|err| format!("HTTP request failed: {err}"))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|err| format!("failed to read response body: {err}"))?;

        if !status.is_success() {
            return Err(format!("enrichment API error ({status}): {response_text}"));
        }

        let parsed: serde_json::Value =
            serde_json::from_str(&response_text).map_err(|err| format!("failed to parse response JSON: {err}"))?;

        parsed["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "unexpected response structure (no content[0].text)".to_string())
    }
}

/// Truncates `text` to at most `SUMMARY_TRUNCATE_CHARS`, reporting whether
/// truncation happened.
fn truncate_for_enrichment(text: &str) -> (&str, bool) {
    match text.char_indices().nth(SUMMARY_TRUNCATE_CHARS) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

const SUMMARY_SYSTEM_PROMPT: &str =
    "You summarise UK court judgments for legal researchers. Produce a concise, neutral summary of the holding, \
     the key facts, and the outcome. Do not include citations to external sources.";

/// Generates a `CaselawSummary` for every `Caselaw` record that does not
/// already have one, skipping any whose `text` is shorter than
/// `SUMMARY_MIN_SOURCE_CHARS`.
#[tracing::instrument(skip(ctx, client))]
pub async fn run_caselaw_summaries(ctx: &PipelineContext, client: &EnrichmentClient) -> RunStats {
    let mut stats = RunStats::default();

    let caselaws: Vec<Caselaw> = match lex_store::scroll_all(&ctx.store, CASELAW_COLLECTION).await {
        Ok(records) => records,
        Err(err) => {
            warn!(%err, "failed to scroll caselaw collection for enrichment");
            stats.aborted += 1;
            return stats;
        }
    };
    let summaries: Vec<CaselawSummary> = match lex_store::scroll_all(&ctx.store, CASELAW_SUMMARY_COLLECTION).await {
        Ok(records) => records,
        Err(err) => {
            warn!(%err, "failed to scroll caselaw_summary collection for enrichment");
            stats.aborted += 1;
            return stats;
        }
    };
    let has_summary: std::collections::HashSet<String> = summaries.into_iter().map(|s| s.caselaw_id).collect();

    for caselaw in caselaws {
        if ctx.is_cancelled() {
            info!("enrichment interrupted, stopping");
            break;
        }
        if has_summary.contains(&caselaw.id) {
            stats.skipped_existing += 1;
            continue;
        }
        if caselaw.text.chars().count() < SUMMARY_MIN_SOURCE_CHARS {
            stats.skipped_recoverable += 1;
            continue;
        }

        let (source_text, truncated) = truncate_for_enrichment(&caselaw.text);
        let prompt = format!("Judgment: {}\n\n{}", caselaw.name, source_text);

        let started = Instant::now();
        let summary_text = match client.generate(SUMMARY_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!(caselaw_id = caselaw.id, err, "summary generation failed");
                stats.skipped_recoverable += 1;
                continue;
            }
        };
        info!(caselaw_id = caselaw.id, elapsed_ms = started.elapsed().as_millis() as u64, "generated caselaw summary");

        let summary = CaselawSummary {
            id: CaselawSummary::id_for(&caselaw.id),
            caselaw_id: caselaw.id.clone(),
            court: caselaw.court,
            division: caselaw.division,
            year: caselaw.year,
            number: caselaw.number,
            name: caselaw.name.clone(),
            cite_as: caselaw.cite_as.clone(),
            date: caselaw.date,
            text: summary_text.clone(),
            ai_model: client.config.model.clone(),
            ai_timestamp: Utc::now(),
            source_text_length: caselaw.text.chars().count(),
            source_text_truncated: truncated,
            created_at: Utc::now(),
        };

        match embed_and_upsert(ctx, CASELAW_SUMMARY_COLLECTION, &summary.id, &summary_text, &summary).await {
            Ok(()) => stats.upserted += 1,
            Err(err) => {
                warn!(%err, caselaw_id = caselaw.id, "failed to upsert caselaw summary");
                stats.skipped_recoverable += 1;
            }
        }
    }

    stats
}

const EXPLANATION_SYSTEM_PROMPT: &str =
    "You explain changes to UK legislation for legal researchers. In one or two sentences, state what the \
     amending provision does to the changed provision. Do not speculate beyond what the type of effect implies.";

/// Generates `ai_explanation` for every `Amendment` record that does not
/// already have one.
#[tracing::instrument(skip(ctx, client))]
pub async fn run_amendment_explanations(ctx: &PipelineContext, client: &EnrichmentClient) -> RunStats {
    let mut stats = RunStats::default();

    let amendments: Vec<Amendment> = match lex_store::scroll_all(&ctx.store, AMENDMENT_COLLECTION).await {
        Ok(records) => records,
        Err(err) => {
            warn!(%err, "failed to scroll amendment collection for enrichment");
            stats.aborted += 1;
            return stats;
        }
    };

    for mut amendment in amendments {
        if ctx.is_cancelled() {
            info!("enrichment interrupted, stopping");
            break;
        }
        if amendment.ai_explanation.is_some() {
            stats.skipped_existing += 1;
            continue;
        }

        let prompt = format!(
            "Changed: {} ({}), provision {}\nAffecting: {} ({}), provision {}\nType of effect: {}",
            amendment.changed_legislation,
            amendment.changed_year,
            amendment.changed_provision.as_deref().unwrap_or("unspecified"),
            amendment.affecting_legislation,
            amendment.affecting_year,
            amendment.affecting_provision.as_deref().unwrap_or("unspecified"),
            amendment.type_of_effect,
        );

        let explanation = match client.generate(EXPLANATION_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!(amendment_id = amendment.id, err, "explanation generation failed");
                stats.skipped_recoverable += 1;
                continue;
            }
        };

        amendment.ai_explanation = Some(explanation);
        let text = format!("{} {}", amendment.changed_legislation, amendment.type_of_effect);

        match embed_and_upsert(ctx, AMENDMENT_COLLECTION, &amendment.id, &text, &amendment).await {
            Ok(()) => stats.upserted += 1,
            Err(err) => {
                warn!(%err, amendment_id = amendment.id, "failed to upsert amendment explanation");
                stats.skipped_recoverable += 1;
            }
        }
    }

    stats
}
