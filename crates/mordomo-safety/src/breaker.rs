//! Circuit breaker for the LLM providers: after 3 consecutive failures the
//! agent answers with the degraded template for 60 s instead of calling out.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_secs: u64) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery: Duration::from_secs(recovery_secs),
            state: Mutex::new(BreakerState { consecutive_failures: 0, opened_at: None }),
        }
    }

    /// While open, no provider call is made at all.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match state.opened_at {
            Some(at) if at.elapsed() < self.recovery => true,
            Some(_) => {
                // Half-open: allow the next attempt through.
                state.opened_at = None;
                state.consecutive_failures = 0;
                info!("circuit breaker half-open, allowing a probe call");
                false
            }
            None => false,
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.failure_threshold && state.opened_at.is_none() {
            state.opened_at = Some(Instant::now());
            warn!(
                failures = state.consecutive_failures,
                "circuit breaker opened"
            );
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_failures = 0;
        state.opened_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(3, 60);
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn success_resets() {
        let cb = CircuitBreaker::new(2, 60);
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(!cb.is_open());
    }

    #[test]
    fn recovers_after_window() {
        let cb = CircuitBreaker::new(1, 0);
        cb.record_failure();
        // recovery = 0s: immediately half-open
        assert!(!cb.is_open());
    }
}
