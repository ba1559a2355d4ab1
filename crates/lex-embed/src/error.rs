use thiserror::Error;

/// Failure modes for a single embedding request.
///
/// Callers that need a vector unconditionally (see [`crate::dense::DenseEmbedder::embed`])
/// never see this type directly — it is absorbed into a zero-vector fallback after
/// retries are exhausted.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding endpoint rate limited the request")]
    RateLimited,

    #[error("embedding endpoint returned status {status}")]
    Http { status: u16 },

    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("embedding response body was malformed: {0}")]
    Malformed(String),

    #[error("embedding cache backend failed: {0}")]
    Cache(String),
}
