//! Pipeline-level error type and the fetch/store error → [`ErrorCategory`]
//! mapping used to decide whether a failure is recoverable.

use lex_core::error::ErrorCategory;
use thiserror::Error;

use crate::stats::RunStats;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("vector store error: {0}")]
    Store(#[from] lex_store::error::StoreError),

    #[error("scrape error: {0}")]
    Scrape(#[from] lex_scrape::ScrapeError),

    #[error("legacy tracking file error: {0}")]
    Tracking(String),
}

/// Categorises a fetch failure taxonomy. `NotFound` is folded
/// into `PdfFallback` at the scraper layer already (a 404 on a legislation
/// `data.xml` means the document is PDF-only), so by the time a `FetchError`
/// reaches the pipeline it is either a genuine transient/rate-limit failure
/// (`HttpError`, recoverable) or a circuit-breaker trip (also `HttpError`,
/// recoverable — the run continues with the next record once the breaker
/// half-opens).
pub fn categorize_fetch_error(error: &lex_fetch::FetchError) -> ErrorCategory {
    match error {
        lex_fetch::FetchError::NotFound { .. } => ErrorCategory::PdfFallback,
        _ => ErrorCategory::HttpError,
    }
}

/// Same mapping, for errors surfaced through a scraper's stream rather than
/// a direct `Fetcher` call.
pub fn categorize_scrape_error(error: &lex_scrape::ScrapeError) -> ErrorCategory {
    match error {
        lex_scrape::ScrapeError::Fetch(fetch_error) => categorize_fetch_error(fetch_error),
        _ => ErrorCategory::ParseError,
    }
}

/// Categorises a PDF-subsystem failure. None of these are ever promoted to
/// the non-recoverable categories: a bad PDF or failed OCR call degrades to
/// a skipped enrichment, not an aborted run.
pub fn categorize_pdf_error(_error: &lex_pdf::PdfError) -> ErrorCategory {
    ErrorCategory::FileError
}

/// Applies spec.md §7's per-record error policy at the point a category is
/// known: recoverable categories are counted and the caller keeps going;
/// `memory_error`/`encoding_error` are non-recoverable and must abort the
/// whole pipeline run. Returns `true` when the caller must stop now.
pub fn record_failure(stats: &mut RunStats, category: ErrorCategory) -> bool {
    if category.is_recoverable() {
        stats.skipped_recoverable += 1;
        false
    } else {
        stats.aborted += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_category_counts_and_continues() {
        let mut stats = RunStats::default();
        let stop = record_failure(&mut stats, ErrorCategory::ParseError);
        assert!(!stop);
        assert_eq!(stats.skipped_recoverable, 1);
        assert_eq!(stats.aborted, 0);
    }

    #[test]
    fn memory_error_aborts() {
        let mut stats = RunStats::default();
        let stop = record_failure(&mut stats, ErrorCategory::MemoryError);
        assert!(stop);
        assert_eq!(stats.aborted, 1);
        assert_eq!(stats.skipped_recoverable, 0);
    }

    #[test]
    fn encoding_error_aborts() {
        let mut stats = RunStats::default();
        let stop = record_failure(&mut stats, ErrorCategory::EncodingError);
        assert!(stop);
        assert_eq!(stats.aborted, 1);
    }
}
