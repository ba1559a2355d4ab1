use std::time::Duration;

use lex_core::config::constants::DENSE_DIM;
use serde::Deserialize;
use tracing::warn;

use crate::error::EmbedError;

/// Maximum characters sent to the remote embedding model. Beyond this the
/// provider would reject the request outright (roughly 8K tokens for a
/// 3-large-class embedding model), so we truncate client-side instead of
/// letting the request fail.
const DEFAULT_MAX_INPUT_CHARS: usize = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct DenseEmbedderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_input_chars: usize,
}

impl DenseEmbedderConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions: DENSE_DIM,
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Remote dense embedding client.
///
/// [`DenseEmbedder::embed`] never returns an error: after `max_retries`
/// attempts it logs and falls back to a zero vector of the configured
/// dimensionality, so a single unreachable embedding endpoint degrades
/// retrieval quality for that record rather than aborting the pipeline.
#[derive(Clone)]
pub struct DenseEmbedder {
    client: reqwest::Client,
    config: DenseEmbedderConfig,
}

impl DenseEmbedder {
    pub fn new(client: reqwest::Client, config: DenseEmbedderConfig) -> Self {
        Self { client, config }
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub async fn embed(&self, text: &str) -> Vec<f32> {
        let truncated = truncate_chars(text, self.config.max_input_chars);

        for attempt in 0..self.config.max_retries {
            match self.request(truncated).await {
                Ok(vector) => return vector,
                Err(EmbedError::RateLimited) if attempt + 1 < self.config.max_retries => {
                    let backoff = self.config.base_backoff * 2u32.pow(attempt);
                    warn!(attempt, ?backoff, "embedding rate limited, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(EmbedError::RateLimited) => {
                    warn!(
                        max_retries = self.config.max_retries,
                        "embedding rate limit exceeded after all retries, falling back to zero vector"
                    );
                    break;
                }
                Err(err) => {
                    warn!(%err, "dense embedding request failed, falling back to zero vector");
                    break;
                }
            }
        }

        vec![0.0; self.config.dimensions]
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "model": self.config.model,
                "input": text,
                "dimensions": self.config.dimensions,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(EmbedError::RateLimited);
        }
        if !status.is_success() {
            return Err(EmbedError::Http { status: status.as_u16() });
        }

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| EmbedError::Malformed("empty data array".to_string()))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_leaves_short_text_untouched() {
        assert_eq!(truncate_chars("hello", 30_000), "hello");
    }

    #[test]
    fn truncate_chars_cuts_at_char_boundary() {
        let text = "a".repeat(10);
        assert_eq!(truncate_chars(&text, 4), "aaaa");
    }

    #[test]
    fn config_defaults_match_dense_dimension() {
        let config = DenseEmbedderConfig::new("https://example.test", "key", "model");
        assert_eq!(config.dimensions, DENSE_DIM);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }
}
