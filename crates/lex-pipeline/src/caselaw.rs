//! Stage-1 pipeline for `Caselaw` and `CaselawSection`, one judgment per
//! fetched document, sections derived from the same XML as the header.

use futures::StreamExt;
use lex_core::config::constants::{CASELAW_COLLECTION, CASELAW_SECTION_COLLECTION};
use lex_core::model::Court;
use lex_core::outcome::ParseOutcome;
use lex_store::get_existing_ids;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::embed_upsert::embed_and_upsert;
use crate::error::{categorize_scrape_error, record_failure};
use crate::stats::RunStats;

const SCRAPE_BATCH: usize = 25;

#[tracing::instrument(skip(ctx), fields(courts = ?courts))]
pub async fn run(ctx: &PipelineContext, years: Vec<i32>, courts: Vec<Court>, limit: Option<usize>) -> RunStats {
    let mut stats = RunStats::default();
    let stream = lex_scrape::caselaw::scrape(&ctx.caselaw_fetcher, years, courts, limit);
    let mut chunks = stream.chunks(SCRAPE_BATCH);

    while let Some(chunk) = chunks.next().await {
        if ctx.is_cancelled() {
            info!("ingest interrupted, stopping after in-flight chunk");
            break;
        }

        let mut parsed_docs = Vec::new();
        for item in chunk {
            stats.scraped += 1;
            match item {
                Ok((url, bytes)) => match lex_parse::caselaw::parse_caselaw(&bytes, &url) {
                    ParseOutcome::Ok(caselaw) => {
                        stats.parsed += 1;
                        parsed_docs.push((caselaw, bytes, url));
                    }
                    ParseOutcome::Skip { url, reason } => info!(url, reason, "judgment skipped"),
                    ParseOutcome::Fail { url, category, detail } => {
                        warn!(url, ?category, detail, "judgment parse failed");
                        if record_failure(&mut stats, category) {
                            return stats;
                        }
                    }
                },
                Err(err) => {
                    let category = categorize_scrape_error(&err);
                    warn!(?category, "judgment fetch failed");
                    if record_failure(&mut stats, category) {
                        return stats;
                    }
                }
            }
        }

        if parsed_docs.is_empty() {
            continue;
        }

        let ids: Vec<String> = parsed_docs.iter().map(|(cl, _, _)| cl.id.clone()).collect();
        let existing = get_existing_ids(&ctx.store, CASELAW_COLLECTION, &ids).await;

        for (caselaw, xml, url) in parsed_docs {
            if existing.contains(&caselaw.id) {
                stats.skipped_existing += 1;
                continue;
            }

            let text = format!("{}\n\n{}", caselaw.name, caselaw.text);
            if let Err(err) = embed_and_upsert(ctx, CASELAW_COLLECTION, &caselaw.id, &text, &caselaw).await {
                warn!(%err, url, "failed to upsert judgment");
                stats.skipped_recoverable += 1;
                continue;
            }
            stats.upserted += 1;

            if run_sections(ctx, &mut stats, &xml, &caselaw.id).await {
                return stats;
            }
        }
    }

    stats
}

/// Returns `true` if a non-recoverable category was hit and the caller must
/// abort the whole run.
async fn run_sections(ctx: &PipelineContext, stats: &mut RunStats, xml: &[u8], caselaw_id: &str) -> bool {
    for outcome in lex_parse::caselaw::parse_sections(xml, caselaw_id) {
        match outcome {
            ParseOutcome::Ok(section) => {
                match embed_and_upsert(ctx, CASELAW_SECTION_COLLECTION, &section.id, &section.text, &section).await {
                    Ok(()) => stats.upserted += 1,
                    Err(err) => {
                        warn!(%err, section_id = section.id, "failed to upsert judgment paragraph");
                        stats.skipped_recoverable += 1;
                    }
                }
            }
            ParseOutcome::Skip { url, reason } => info!(url, reason, "judgment paragraph skipped"),
            ParseOutcome::Fail { url, category, detail } => {
                warn!(url, ?category, detail, "judgment paragraph parse failed");
                if record_failure(stats, category) {
                    return true;
                }
            }
        }
    }
    false
}
