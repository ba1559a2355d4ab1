//! Outcome tagged union: replaces exception-for-control-flow
//! (`ProcessedException` in the original) with an explicit value the
//! orchestrator switches on.

use crate::error::ErrorCategory;

#[derive(Debug)]
pub enum ParseOutcome<T> {
    /// Parsed successfully.
    Ok(T),
    /// Source content is structurally unsuitable (e.g. PDF-only); never
    /// retry this URL, but do not treat it as a failure.
    Skip { url: String, reason: String },
    /// Parse failed with a categorised, recoverable-or-not error.
    Fail {
        url: String,
        category: ErrorCategory,
        detail: String,
    },
}

impl<T> ParseOutcome<T> {
    pub fn ok(value: T) -> Self {
        ParseOutcome::Ok(value)
    }

    pub fn skip(url: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseOutcome::Skip {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn fail(url: impl Into<String>, category: ErrorCategory, detail: impl Into<String>) -> Self {
        ParseOutcome::Fail {
            url: url.into(),
            category,
            detail: detail.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ParseOutcome::Ok(_))
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            ParseOutcome::Ok(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_round_trips() {
        let outcome = ParseOutcome::ok(42);
        assert!(outcome.is_ok());
        assert_eq!(outcome.into_record(), Some(42));
    }

    #[test]
    fn skip_is_not_ok() {
        let outcome: ParseOutcome<i32> = ParseOutcome::skip("http://x", "pdf-only");
        assert!(!outcome.is_ok());
        assert!(outcome.into_record().is_none());
    }

    #[test]
    fn fail_carries_category() {
        let outcome: ParseOutcome<i32> =
            ParseOutcome::fail("http://x", ErrorCategory::ParseError, "bad xml");
        match outcome {
            ParseOutcome::Fail { category, .. } => assert_eq!(category, ErrorCategory::ParseError),
            _ => panic!("expected Fail"),
        }
    }
}
