//! Top-level ingest dispatcher: picks the year list for the requested mode
//! and runs every kind's Stage-1 pipeline (and, if enabled, Stage-2
//! enrichment) across it.

use std::collections::HashSet;

use lex_core::model::{Court, LegislationType};
use tracing::info;

use crate::context::PipelineContext;
use crate::enrich::EnrichmentClient;
use crate::stats::RunStats;
use crate::{amendment, amendments_led, caselaw, enrich, legislation};

const FULL_INGEST_START_YEAR: i32 = 1267;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    Daily,
    Full,
    AmendmentsLed,
}

/// Mirrors the pipeline-run configuration shape: `{mode, limit,
/// years, enable_pdf_fallback, years_back, enable_summaries}`. PDF fallback
/// is handled entirely inside `lex-pdf` and wired in by the caller, so it
/// is not threaded through here.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: IngestMode,
    pub limit: Option<usize>,
    pub years: Option<Vec<i32>>,
    pub years_back: Option<i32>,
    pub enable_summaries: bool,
    pub current_year: i32,
}

impl RunConfig {
    fn resolved_years(&self) -> Vec<i32> {
        match self.mode {
            IngestMode::Daily => vec![self.current_year - 1, self.current_year],
            IngestMode::Full => self
                .years
                .clone()
                .unwrap_or_else(|| (FULL_INGEST_START_YEAR..=self.current_year).collect()),
            IngestMode::AmendmentsLed => Vec::new(),
        }
    }
}

/// Runs the requested mode across every kind, merging per-kind stats into
/// one total. Stage-2 enrichment runs afterward if `enable_summaries` is
/// set and `client` is provided — a missing client with summaries enabled
/// is a configuration error the caller should have caught before calling in.
pub async fn run_ingest(ctx: &PipelineContext, config: &RunConfig, enrichment_client: Option<&EnrichmentClient>) -> RunStats {
    let mut stats = RunStats::default();

    match config.mode {
        IngestMode::AmendmentsLed => {
            let delta = amendments_led::run(ctx, config.years_back, config.current_year).await;
            stats.merge(delta);
        }
        IngestMode::Daily | IngestMode::Full => {
            let years = config.resolved_years();
            info!(mode = ?config.mode, year_count = years.len(), "starting stage-1 ingest");

            for kind in LegislationType::ALL {
                if ctx.is_cancelled() || stats.aborted > 0 {
                    break;
                }
                let force_refresh = HashSet::new();
                let result = legislation::run(ctx, kind, years.clone(), config.limit, &force_refresh).await;
                stats.merge(result);
            }

            if !ctx.is_cancelled() && stats.aborted == 0 {
                let result = amendment::run(ctx, years.clone(), config.limit).await;
                stats.merge(result);
            }

            if !ctx.is_cancelled() && stats.aborted == 0 {
                let result = caselaw::run(ctx, years, Court::ALL.to_vec(), config.limit).await;
                stats.merge(result);
            }
        }
    }

    if config.enable_summaries && !ctx.is_cancelled() && stats.aborted == 0 {
        if let Some(client) = enrichment_client {
            info!("starting stage-2 enrichment");
            stats.merge(enrich::run_caselaw_summaries(ctx, client).await);
            stats.merge(enrich::run_amendment_explanations(ctx, client).await);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_mode_resolves_two_years() {
        let config = RunConfig {
            mode: IngestMode::Daily,
            limit: None,
            years: None,
            years_back: None,
            enable_summaries: false,
            current_year: 2026,
        };
        assert_eq!(config.resolved_years(), vec![2025, 2026]);
    }

    #[test]
    fn full_mode_defaults_to_historical_range() {
        let config = RunConfig {
            mode: IngestMode::Full,
            limit: None,
            years: None,
            years_back: None,
            enable_summaries: false,
            current_year: 1270,
        };
        assert_eq!(config.resolved_years(), vec![1267, 1268, 1269, 1270]);
    }

    #[test]
    fn full_mode_honours_explicit_years() {
        let config = RunConfig {
            mode: IngestMode::Full,
            limit: None,
            years: Some(vec![2000, 2001]),
            years_back: None,
            enable_summaries: false,
            current_year: 2026,
        };
        assert_eq!(config.resolved_years(), vec![2000, 2001]);
    }
}
