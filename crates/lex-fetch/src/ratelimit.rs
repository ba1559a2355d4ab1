//! Adaptive rate limiter, ported field-for-field from the original
//! `AdaptiveRateLimiter` (Python), replacing wall-clock `time.time()`/
//! `collections.deque` with `Instant`/`VecDeque` and a `tokio::sync::Mutex`
//! so the shared state is visible to every worker.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::info;

const SUCCESS_WINDOW: usize = 10_000;
const RATE_LIMIT_WINDOW: usize = 100;
/// Consecutive tracked successes required before the delay is allowed to decay.
const SUCCESS_DECAY_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    pub min_delay: f64,
    pub max_delay: f64,
    pub success_reduction_factor: f64,
    pub failure_increase_factor: f64,
}

impl Default for RateLimiterConfig {
    /// Defaults for legislation.gov.uk scraping.
    fn default() -> Self {
        Self {
            min_delay: 0.2,
            max_delay: 300.0,
            success_reduction_factor: 0.95,
            failure_increase_factor: 2.0,
        }
    }
}

impl RateLimiterConfig {
    /// Harsher growth / no floor delay for case-law scraping.
    pub fn caselaw() -> Self {
        Self {
            min_delay: 0.0,
            max_delay: 300.0,
            success_reduction_factor: 0.95,
            failure_increase_factor: 3.0,
        }
    }
}

struct State {
    config: RateLimiterConfig,
    current_delay: f64,
    successful_requests: VecDeque<Instant>,
    rate_limit_events: VecDeque<(Instant, Option<u64>)>,
}

pub struct AdaptiveRateLimiter {
    state: Mutex<State>,
}

impl AdaptiveRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            state: Mutex::new(State {
                current_delay: config.min_delay,
                config,
                successful_requests: VecDeque::with_capacity(64),
                rate_limit_events: VecDeque::with_capacity(16),
            }),
        }
    }

    /// Sleep for the current delay, then return. Call immediately before
    /// issuing a request.
    pub async fn throttle(&self) {
        let delay = self.current_delay().await;
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }
    }

    pub async fn current_delay(&self) -> f64 {
        self.state.lock().await.current_delay
    }

    pub async fn record_success(&self) {
        let mut state = self.state.lock().await;
        state.successful_requests.push_back(Instant::now());
        while state.successful_requests.len() > SUCCESS_WINDOW {
            state.successful_requests.pop_front();
        }

        if state.successful_requests.len() > SUCCESS_DECAY_THRESHOLD
            && state.current_delay > state.config.min_delay
        {
            state.current_delay *= state.config.success_reduction_factor;
            state.current_delay = state.current_delay.max(state.config.min_delay);
        }
    }

    pub async fn record_rate_limit(&self, retry_after: Option<u64>) {
        let mut state = self.state.lock().await;
        state.rate_limit_events.push_back((Instant::now(), retry_after));
        while state.rate_limit_events.len() > RATE_LIMIT_WINDOW {
            state.rate_limit_events.pop_front();
        }

        state.current_delay = match retry_after {
            Some(secs) => secs as f64,
            None => {
                let increased = state.current_delay * state.config.failure_increase_factor + 0.5;
                increased.min(state.config.max_delay)
            }
        };

        info!(
            new_delay = state.current_delay,
            retry_after = retry_after,
            recent_rate_limits = state.rate_limit_events.len(),
            "rate limit recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delay_bounded_within_min_max() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        for _ in 0..5 {
            limiter.record_rate_limit(None).await;
        }
        let delay = limiter.current_delay().await;
        assert!(delay >= 0.2 && delay <= 300.0);
    }

    #[tokio::test]
    async fn retry_after_is_adopted_immediately() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        limiter.record_rate_limit(Some(12)).await;
        assert_eq!(limiter.current_delay().await, 12.0);
    }

    #[tokio::test]
    async fn sustained_success_decays_delay_toward_minimum() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        limiter.record_rate_limit(Some(10)).await;
        assert_eq!(limiter.current_delay().await, 10.0);

        for _ in 0..(SUCCESS_DECAY_THRESHOLD + 1) {
            limiter.record_success().await;
        }
        let delay = limiter.current_delay().await;
        assert!(delay < 10.0);
        assert!(delay >= 0.2);
    }

    #[tokio::test]
    async fn exponential_growth_without_retry_after() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        let before = limiter.current_delay().await;
        limiter.record_rate_limit(None).await;
        let after = limiter.current_delay().await;
        assert_eq!(after, (before * 2.0 + 0.5).min(300.0));
    }
}
