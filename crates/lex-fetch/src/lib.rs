//! Adaptive-rate-limited HTTP fetcher, with retry, a circuit breaker, and an
//! optional in-process response cache. Every outbound call to the canonical
//! source goes through one `Fetcher` instance per process.

pub mod breaker;
pub mod cache;
pub mod error;
pub mod ratelimit;

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{info, warn};

pub use breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use cache::{CachedResponse, ResponseCache};
pub use error::FetchError;
pub use ratelimit::{AdaptiveRateLimiter, RateLimiterConfig};

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub bytes: Bytes,
}

impl Response {
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.bytes.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub rate_limiter: RateLimiterConfig,
    pub breaker: CircuitBreakerConfig,
    pub cache_ttl: Duration,
    pub cache_max_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 5,
            rate_limiter: RateLimiterConfig::default(),
            breaker: CircuitBreakerConfig::default(),
            cache_ttl: Duration::from_secs(300),
            cache_max_bytes: 64 * 1024 * 1024,
        }
    }
}

impl FetcherConfig {
    /// Case-law scraping uses a harsher-growth, floorless rate limiter and a
    /// higher retry budget.
    pub fn caselaw() -> Self {
        Self {
            rate_limiter: RateLimiterConfig::caselaw(),
            max_retries: 30,
            ..Self::default()
        }
    }
}

/// Shared, per-process HTTP client wrapping the adaptive rate limiter,
/// circuit breaker, and response cache. Cheap to clone (internals are
/// `Arc`-free here; callers share one instance behind an `Arc` instead).
pub struct Fetcher {
    client: reqwest::Client,
    rate_limiter: AdaptiveRateLimiter,
    breaker: CircuitBreaker,
    cache: ResponseCache,
    max_retries: u32,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            rate_limiter: AdaptiveRateLimiter::new(config.rate_limiter),
            breaker: CircuitBreaker::new(config.breaker),
            cache: ResponseCache::new(config.cache_ttl, config.cache_max_bytes),
            max_retries: config.max_retries,
        })
    }

    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        if let Some(cached) = self.cache.get(url).await {
            return Ok(Response {
                status: cached.status,
                bytes: Bytes::from(cached.body),
            });
        }

        let response = self.request(reqwest::Method::GET, url).await?;

        self.cache
            .put(
                url.to_string(),
                CachedResponse {
                    status: response.status,
                    body: response.bytes.to_vec(),
                },
            )
            .await;

        Ok(response)
    }

    pub async fn head(&self, url: &str) -> Result<Response, FetchError> {
        self.request(reqwest::Method::HEAD, url).await
    }

    async fn request(&self, method: reqwest::Method, url: &str) -> Result<Response, FetchError> {
        self.breaker
            .check()
            .await
            .map_err(|open| FetchError::CircuitOpen {
                retry_after_secs: open.retry_after_secs,
            })?;

        let mut last_status: Option<u16> = None;

        for attempt in 0..self.max_retries {
            self.rate_limiter.throttle().await;

            let result = self
                .client
                .request(method.clone(), url)
                .send()
                .await;

            let resp = match result {
                Ok(resp) => resp,
                Err(err) => {
                    self.breaker.on_failure().await;
                    warn!(url, attempt, error = %err, "transient network error");
                    backoff_sleep(attempt).await;
                    continue;
                }
            };

            let status = resp.status();
            last_status = Some(status.as_u16());

            if status == StatusCode::NOT_FOUND {
                self.breaker.on_success().await;
                return Err(FetchError::NotFound { url: url.to_string() });
            }

            if status.as_u16() == 429 || status.as_u16() == 436 {
                let retry_after = resp
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                self.rate_limiter.record_rate_limit(retry_after).await;
                if attempt + 1 >= self.max_retries {
                    return Err(FetchError::RateLimited {
                        url: url.to_string(),
                        retry_after,
                    });
                }
                continue;
            }

            if status.is_server_error() {
                self.breaker.on_failure().await;
                warn!(url, attempt, status = status.as_u16(), "server error, retrying");
                backoff_sleep(attempt).await;
                continue;
            }

            let bytes = resp.bytes().await?;
            self.rate_limiter.record_success().await;
            self.breaker.on_success().await;
            info!(url, status = status.as_u16(), "fetch succeeded");
            return Ok(Response {
                status: status.as_u16(),
                bytes,
            });
        }

        Err(FetchError::Transient {
            url: url.to_string(),
            status: last_status,
            attempts: self.max_retries,
        })
    }
}

async fn backoff_sleep(attempt: u32) {
    let secs = 0.5 * 2f64.powi(attempt as i32);
    tokio::time::sleep(Duration::from_secs_f64(secs.min(30.0))).await;
}
