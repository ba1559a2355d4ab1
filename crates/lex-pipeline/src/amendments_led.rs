//! Mode 3: amendment-led smart incremental refresh.
//!
//! Scrapes recent amendments, derives which already-ingested legislation is
//! now stale relative to them, and re-scrapes only that set before running
//! Stage-2 enrichment.

use std::collections::{HashMap, HashSet};

use chrono::Datelike;
use lex_core::config::constants::{LEGISLATION_COLLECTION, AMENDMENT_COLLECTION};
use lex_core::model::Amendment;
use lex_core::outcome::ParseOutcome;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::embed_upsert::embed_and_upsert;
use crate::legislation::{run_explanatory_notes, run_sections};
use crate::stats::RunStats;

const DEFAULT_YEARS_BACK: i32 = 2;

/// Runs steps (a)-(e) of the amendment-led mode: scrape recent amendments,
/// find legislation ids that are stale relative to them, and re-fetch just
/// those. Step (f) (Stage-2 enrichment) is the caller's responsibility —
/// it runs uniformly across every kind, not just the amendment-led delta.
pub async fn run(ctx: &PipelineContext, years_back: Option<i32>, current_year: i32) -> RunStats {
    let years_back = years_back.unwrap_or(DEFAULT_YEARS_BACK).max(1);
    let recent_years: Vec<i32> = ((current_year - years_back + 1)..=current_year).collect();

    let mut stats = crate::amendment::run(ctx, recent_years.clone(), None).await;

    let amendments: Vec<Amendment> = match lex_store::scroll_all(&ctx.store, AMENDMENT_COLLECTION).await {
        Ok(records) => records,
        Err(err) => {
            warn!(%err, "failed to scroll amendments for staleness detection");
            stats.aborted += 1;
            return stats;
        }
    };

    let recent_year_set: HashSet<i32> = recent_years.into_iter().collect();
    let mut max_affecting_year: HashMap<String, i32> = HashMap::new();
    for amendment in &amendments {
        if !recent_year_set.contains(&amendment.affecting_year) {
            continue;
        }
        let candidate_id = format!("{}/data.xml", amendment.changed_url);
        max_affecting_year
            .entry(candidate_id)
            .and_modify(|year| *year = (*year).max(amendment.affecting_year))
            .or_insert(amendment.affecting_year);
    }

    if max_affecting_year.is_empty() {
        info!("no recent amendments reference any legislation, nothing to rescrape");
        return stats;
    }

    let candidate_ids: Vec<String> = max_affecting_year.keys().cloned().collect();
    let metadata = lex_store::get_existing_ids_with_metadata(&ctx.store, LEGISLATION_COLLECTION, &candidate_ids).await;

    let mut stale_ids = Vec::new();
    for (id, max_year) in &max_affecting_year {
        let modified_date = metadata
            .get(id)
            .and_then(|payload| lex_store::payload_string_field(payload, "modified_date"));
        if is_stale(modified_date.as_deref(), *max_year) {
            stale_ids.push(id.clone());
        }
    }

    info!(stale_count = stale_ids.len(), candidate_count = candidate_ids.len(), "amendment-led staleness detection complete");

    for legislation_id in stale_ids {
        if ctx.is_cancelled() {
            info!("amendment-led rescrape interrupted, stopping");
            break;
        }

        let response = match ctx.legislation_fetcher.get(&legislation_id).await {
            Ok(response) => response,
            Err(err) => {
                warn!(legislation_id, %err, "failed to fetch stale legislation");
                stats.skipped_recoverable += 1;
                continue;
            }
        };
        stats.scraped += 1;

        let legislation = match lex_parse::legislation::parse_legislation(&response.bytes, &legislation_id) {
            ParseOutcome::Ok(legislation) => legislation,
            ParseOutcome::Skip { url, reason } => {
                info!(url, reason, "stale legislation skipped on reparse");
                continue;
            }
            ParseOutcome::Fail { url, category, detail } => {
                warn!(url, ?category, detail, "stale legislation failed to reparse");
                if crate::error::record_failure(&mut stats, category) {
                    return stats;
                }
                continue;
            }
        };
        stats.parsed += 1;

        let text = match &legislation.description {
            Some(description) => format!("{}\n\n{description}", legislation.title),
            None => legislation.title.clone(),
        };

        if let Err(err) = embed_and_upsert(ctx, LEGISLATION_COLLECTION, &legislation.id, &text, &legislation).await {
            warn!(%err, legislation_id, "failed to upsert refreshed legislation");
            stats.skipped_recoverable += 1;
            continue;
        }
        stats.upserted += 1;

        if run_sections(ctx, &mut stats, &response.bytes, &legislation.id).await {
            return stats;
        }
        if run_explanatory_notes(ctx, &mut stats, &response.bytes, &legislation.id).await {
            return stats;
        }
    }

    stats
}

fn parse_year(date: &str) -> Option<i32> {
    chrono::DateTime::parse_from_rfc3339(date)
        .map(|dt| dt.year())
        .ok()
        .or_else(|| date.get(0..4).and_then(|s| s.parse().ok()))
}

/// spec.md §3/§4.4's staleness test: a legislation record is stale relative
/// to `max_affecting_year` if it's missing from the store entirely, its
/// `modified_date` is unparseable, or `year(modified_date) < max_affecting_year`.
fn is_stale(modified_date: Option<&str>, max_affecting_year: i32) -> bool {
    match modified_date.and_then(parse_year) {
        Some(modified_year) => modified_year < max_affecting_year,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_year_reads_rfc3339_dates() {
        assert_eq!(parse_year("2019-05-01T00:00:00Z"), Some(2019));
    }

    #[test]
    fn parse_year_falls_back_to_leading_digits() {
        assert_eq!(parse_year("2019-05-01"), Some(2019));
    }

    /// spec.md §8 scenario 2: legislation modified 2024-06-01, amendment
    /// affecting_year 2025 -> stale, and must be re-scraped.
    #[test]
    fn amendment_led_staleness_scenario_marks_record_stale() {
        assert!(is_stale(Some("2024-06-01"), 2025));
    }

    #[test]
    fn modified_year_at_or_after_max_affecting_year_is_not_stale() {
        assert!(!is_stale(Some("2025-01-01"), 2025));
        assert!(!is_stale(Some("2026-03-01"), 2025));
    }

    #[test]
    fn missing_legislation_record_is_stale() {
        assert!(is_stale(None, 2025));
    }

    #[test]
    fn unparseable_modified_date_is_stale() {
        assert!(is_stale(Some("not-a-date"), 2025));
    }
}
