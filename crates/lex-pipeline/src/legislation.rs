//! Stage-1 pipeline for `Legislation`, `LegislationSection`, and
//! `ExplanatoryNote` — all three come off the same `data.xml` fetch,
//! explanatory notes being fetched alongside the legislation they annotate.

use std::collections::HashSet;

use futures::StreamExt;
use lex_core::config::constants::{EXPLANATORY_NOTE_COLLECTION, LEGISLATION_COLLECTION, LEGISLATION_SECTION_COLLECTION};
use lex_core::model::LegislationType;
use lex_core::outcome::ParseOutcome;
use lex_store::get_existing_ids;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::embed_upsert::embed_and_upsert;
use crate::error::{categorize_scrape_error, record_failure};
use crate::stats::RunStats;

const SCRAPE_BATCH: usize = 25;

/// Runs the legislation Stage-1 pipeline for one type across `years`.
///
/// `force_refresh` carries ids that must be re-embedded and re-upserted even
/// if already present (amendments-led mode's targeted staleness refresh);
/// every other already-present id is counted as `skipped_existing` rather
/// than re-embedded, since legislation text is static once scraped and the
/// dense-embedding call is the expensive step to avoid repeating.
#[tracing::instrument(skip(ctx, force_refresh), fields(kind = ?kind))]
pub async fn run(
    ctx: &PipelineContext,
    kind: LegislationType,
    years: Vec<i32>,
    limit: Option<usize>,
    force_refresh: &HashSet<String>,
) -> RunStats {
    let mut stats = RunStats::default();
    let stream = lex_scrape::legislation::scrape(&ctx.legislation_fetcher, kind, years, limit);
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
                Ok((url, bytes)) => {
                    let legislation_outcome = lex_parse::legislation::parse_legislation(&bytes, &url);
                    match legislation_outcome {
                        ParseOutcome::Ok(legislation) => {
                            stats.parsed += 1;
                            parsed_docs.push((legislation, bytes, url));
                        }
                        ParseOutcome::Skip { url, reason } => {
                            info!(url, reason, "legislation document skipped");
                        }
                        ParseOutcome::Fail { url, category, detail } => {
                            warn!(url, ?category, detail, "legislation parse failed");
                            if record_failure(&mut stats, category) {
                                return stats;
                            }
                        }
                    }
                }
                Err(err) => {
                    let category = categorize_scrape_error(&err);
                    warn!(?category, "legislation fetch failed");
                    if record_failure(&mut stats, category) {
                        return stats;
                    }
                }
            }
        }

        if parsed_docs.is_empty() {
            continue;
        }

        let ids: Vec<String> = parsed_docs.iter().map(|(l, _, _)| l.id.clone()).collect();
        let existing = get_existing_ids(&ctx.store, LEGISLATION_COLLECTION, &ids).await;

        for (legislation, xml, url) in parsed_docs {
            if already_ingested(&legislation.id, &existing, force_refresh) {
                stats.skipped_existing += 1;
                continue;
            }

            let text = match &legislation.description {
                Some(description) => format!("{}\n\n{description}", legislation.title),
                None => legislation.title.clone(),
            };

            if let Err(err) = embed_and_upsert(ctx, LEGISLATION_COLLECTION, &legislation.id, &text, &legislation).await {
                warn!(%err, url, "failed to upsert legislation record");
                stats.skipped_recoverable += 1;
                continue;
            }
            stats.upserted += 1;

            if run_sections(ctx, &mut stats, &xml, &legislation.id).await {
                return stats;
            }
            if run_explanatory_notes(ctx, &mut stats, &xml, &legislation.id).await {
                return stats;
            }
        }
    }

    stats
}

/// Returns `true` if a non-recoverable category was hit and the caller must
/// abort the whole run.
pub(crate) async fn run_sections(ctx: &PipelineContext, stats: &mut RunStats, xml: &[u8], legislation_id: &str) -> bool {
    for outcome in lex_parse::legislation::parse_sections(xml, legislation_id) {
        match outcome {
            ParseOutcome::Ok(section) => {
                let text = match &section.title {
                    Some(title) => format!("{title}\n\n{}", section.text),
                    None => section.text.clone(),
                };
                match embed_and_upsert(ctx, LEGISLATION_SECTION_COLLECTION, &section.id, &text, &section).await {
                    Ok(()) => stats.upserted += 1,
                    Err(err) => {
                        warn!(%err, section_id = section.id, "failed to upsert legislation section");
                        stats.skipped_recoverable += 1;
                    }
                }
            }
            ParseOutcome::Skip { url, reason } => info!(url, reason, "section skipped"),
            ParseOutcome::Fail { url, category, detail } => {
                warn!(url, ?category, detail, "section parse failed");
                if record_failure(stats, category) {
                    return true;
                }
            }
        }
    }
    false
}

/// Returns `true` if a non-recoverable category was hit and the caller must
/// abort the whole run.
pub(crate) async fn run_explanatory_notes(ctx: &PipelineContext, stats: &mut RunStats, xml: &[u8], legislation_id: &str) -> bool {
    for outcome in lex_parse::explanatory_note::parse(xml, legislation_id) {
        match outcome {
            ParseOutcome::Ok(note) => {
                match embed_and_upsert(ctx, EXPLANATORY_NOTE_COLLECTION, &note.id, &note.text, &note).await {
                    Ok(()) => stats.upserted += 1,
                    Err(err) => {
                        warn!(%err, note_id = note.id, "failed to upsert explanatory note");
                        stats.skipped_recoverable += 1;
                    }
                }
            }
            ParseOutcome::Skip { url, reason } => info!(url, reason, "explanatory note skipped"),
            ParseOutcome::Fail { url, category, detail } => {
                warn!(url, ?category, detail, "explanatory note parse failed");
                if record_failure(stats, category) {
                    return true;
                }
            }
        }
    }
    false
}

/// An id already present in the store is skipped unless it's in the
/// amendments-led `force_refresh` set for this run (spec.md §4.4's
/// "re-scrape only that set" targeted refresh).
fn already_ingested(id: &str, existing: &HashSet<String>, force_refresh: &HashSet<String>) -> bool {
    existing.contains(id) && !force_refresh.contains(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// spec.md §8 scenario 1: `ukpga/2024/1` already present, daily mode,
    /// no force-refresh -> skipped rather than re-upserted.
    #[test]
    fn daily_reingest_of_an_existing_id_is_skipped() {
        let existing: HashSet<String> = ["ukpga/2024/1".to_string()].into_iter().collect();
        let force_refresh: HashSet<String> = HashSet::new();
        assert!(already_ingested("ukpga/2024/1", &existing, &force_refresh));
    }

    #[test]
    fn an_id_not_yet_present_is_not_skipped() {
        let existing: HashSet<String> = HashSet::new();
        let force_refresh: HashSet<String> = HashSet::new();
        assert!(!already_ingested("ukpga/2024/1", &existing, &force_refresh));
    }

    /// amendments-led mode overrides the skip for ids it marked stale.
    #[test]
    fn force_refresh_overrides_an_existing_skip() {
        let existing: HashSet<String> = ["ukpga/2020/1".to_string()].into_iter().collect();
        let force_refresh: HashSet<String> = ["ukpga/2020/1".to_string()].into_iter().collect();
        assert!(!already_ingested("ukpga/2020/1", &existing, &force_refresh));
    }
}
