//! Error taxonomy shared by every stage of the ingestion pipeline.
//!
//! Categorisation is deterministic: each producer (fetcher, parser,
//! embedder, ...) tags its own failures with one of these categories rather
//! than relying on string-sniffing an arbitrary error, the way the Python
//! original's `error_utils.py` had to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    PdfFallback,
    HttpError,
    ParseError,
    ValidationError,
    MemoryError,
    EncodingError,
    FileError,
    UnknownError,
}

impl ErrorCategory {
    /// Recoverable categories are logged and skipped; non-recoverable ones
    /// must abort the pipeline.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, ErrorCategory::MemoryError | ErrorCategory::EncodingError)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("amendment id requires both changed_url and affecting_url to be non-empty")]
    EmptyAmendmentUrl,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_encoding_are_non_recoverable() {
        assert!(!ErrorCategory::MemoryError.is_recoverable());
        assert!(!ErrorCategory::EncodingError.is_recoverable());
    }

    #[test]
    fn others_are_recoverable() {
        for cat in [
            ErrorCategory::PdfFallback,
            ErrorCategory::HttpError,
            ErrorCategory::ParseError,
            ErrorCategory::ValidationError,
            ErrorCategory::FileError,
            ErrorCategory::UnknownError,
        ] {
            assert!(cat.is_recoverable());
        }
    }
}
