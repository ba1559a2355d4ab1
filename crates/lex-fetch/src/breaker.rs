//! Circuit breaker, ported from the original `CircuitBreaker` (Python).

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 10,
            recovery_timeout: Duration::from_secs(300),
        }
    }
}

struct State {
    config: CircuitBreakerConfig,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    state: BreakerState,
}

pub struct CircuitBreaker {
    state: Mutex<State>,
}

/// Returned by [`CircuitBreaker::check`] when the breaker is open.
#[derive(Debug, Clone, Copy)]
pub struct BreakerOpen {
    pub retry_after_secs: u64,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: Mutex::new(State {
                config,
                failure_count: 0,
                last_failure_time: None,
                state: BreakerState::Closed,
            }),
        }
    }

    /// Call before attempting a request. `Err` means the breaker is open and
    /// the caller must not attempt the call.
    pub async fn check(&self) -> Result<(), BreakerOpen> {
        let mut state = self.state.lock().await;
        if state.state == BreakerState::Open {
            let elapsed = state
                .last_failure_time
                .map(|t| t.elapsed())
                .unwrap_or(Duration::MAX);
            if elapsed > state.config.recovery_timeout {
                state.state = BreakerState::HalfOpen;
                info!("circuit breaker entering half-open state");
            } else {
                let remaining = state.config.recovery_timeout.saturating_sub(elapsed);
                return Err(BreakerOpen {
                    retry_after_secs: remaining.as_secs(),
                });
            }
        }
        Ok(())
    }

    pub async fn on_success(&self) {
        let mut state = self.state.lock().await;
        if state.state == BreakerState::HalfOpen {
            state.state = BreakerState::Closed;
            info!("circuit breaker closed after successful recovery");
        }
        state.failure_count = 0;
    }

    pub async fn on_failure(&self) {
        let mut state = self.state.lock().await;
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());

        if state.failure_count >= state.config.failure_threshold {
            state.state = BreakerState::Open;
            warn!(
                failure_count = state.failure_count,
                recovery_timeout_secs = state.config.recovery_timeout.as_secs(),
                "circuit breaker opened"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(300),
        });
        for _ in 0..3 {
            breaker.on_failure().await;
        }
        assert!(breaker.check().await.is_err());
    }

    #[tokio::test]
    async fn stays_closed_below_threshold() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(300),
        });
        breaker.on_failure().await;
        breaker.on_failure().await;
        assert!(breaker.check().await.is_ok());
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(300),
        });
        breaker.on_failure().await;
        breaker.on_failure().await;
        breaker.on_success().await;
        breaker.on_failure().await;
        breaker.on_failure().await;
        assert!(breaker.check().await.is_ok());
    }

    #[tokio::test]
    async fn half_open_after_recovery_timeout() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_millis(10),
        });
        breaker.on_failure().await;
        assert!(breaker.check().await.is_err());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(breaker.check().await.is_ok());
        breaker.on_success().await;
    }
}
