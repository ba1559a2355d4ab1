use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("rate limited: {url} (retry_after={retry_after:?})")]
    RateLimited {
        url: String,
        retry_after: Option<u64>,
    },

    #[error("transient failure fetching {url} after {attempts} attempts: {status:?}")]
    Transient {
        url: String,
        status: Option<u16>,
        attempts: u32,
    },

    #[error("circuit breaker open, retry after {retry_after_secs}s")]
    CircuitOpen { retry_after_secs: u64 },

    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    /// `NotFound` (HTTP 404) at the scraper must never be retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::NotFound { .. } | FetchError::CircuitOpen { .. })
    }
}
