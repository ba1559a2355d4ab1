//! Stage-1 pipeline for `Amendment`: one changes-index HTML page scraped per
//! affected year, parsed row-by-row, each row upserted independently so a
//! single malformed row never drops the rest of the page.

use futures::StreamExt;
use lex_core::config::constants::AMENDMENT_COLLECTION;
use lex_core::outcome::ParseOutcome;
use lex_store::get_existing_ids;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::embed_upsert::embed_and_upsert;
use crate::error::{categorize_scrape_error, record_failure};
use crate::stats::RunStats;

const SCRAPE_BATCH: usize = 25;

fn amendment_text(amendment: &lex_core::model::Amendment) -> String {
    let mut parts = vec![
        format!("{} {}", amendment.changed_legislation, amendment.type_of_effect),
        amendment.affecting_legislation.clone(),
    ];
    if let Some(provision) = &amendment.changed_provision {
        parts.push(provision.clone());
    }
    if let Some(provision) = &amendment.affecting_provision {
        parts.push(provision.clone());
    }
    parts.join("\n")
}

#[tracing::instrument(skip(ctx))]
pub async fn run(ctx: &PipelineContext, years_affected: Vec<i32>, limit: Option<usize>) -> RunStats {
    let mut stats = RunStats::default();
    let stream = lex_scrape::amendments::scrape(&ctx.legislation_fetcher, years_affected, limit);
    let mut chunks = stream.chunks(SCRAPE_BATCH);

    while let Some(chunk) = chunks.next().await {
        if ctx.is_cancelled() {
            info!("ingest interrupted, stopping after in-flight chunk");
            break;
        }

        let mut parsed_rows = Vec::new();
        for item in chunk {
            stats.scraped += 1;
            match item {
                Ok((url, bytes)) => {
                    let html = String::from_utf8_lossy(&bytes).into_owned();
                    for outcome in lex_parse::amendment::parse(&html, &url) {
                        match outcome {
                            ParseOutcome::Ok(amendment) => {
                                stats.parsed += 1;
                                parsed_rows.push(amendment);
                            }
                            ParseOutcome::Skip { url, reason } => info!(url, reason, "amendment row skipped"),
                            ParseOutcome::Fail { url, category, detail } => {
                                warn!(url, ?category, detail, "amendment row failed to parse");
                                if record_failure(&mut stats, category) {
                                    return stats;
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    let category = categorize_scrape_error(&err);
                    warn!(?category, "amendment page fetch failed");
                    if record_failure(&mut stats, category) {
                        return stats;
                    }
                }
            }
        }

        if parsed_rows.is_empty() {
            continue;
        }

        let ids: Vec<String> = parsed_rows.iter().map(|row| row.id.clone()).collect();
        let existing = get_existing_ids(&ctx.store, AMENDMENT_COLLECTION, &ids).await;

        for amendment in parsed_rows {
            if existing.contains(&amendment.id) {
                stats.skipped_existing += 1;
                continue;
            }

            let text = amendment_text(&amendment);
            match embed_and_upsert(ctx, AMENDMENT_COLLECTION, &amendment.id, &text, &amendment).await {
                Ok(()) => stats.upserted += 1,
                Err(err) => {
                    warn!(%err, amendment_id = amendment.id, "failed to upsert amendment");
                    stats.skipped_recoverable += 1;
                }
            }
        }
    }

    stats
}
