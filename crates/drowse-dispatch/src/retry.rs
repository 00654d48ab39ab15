//! Reusable retry policy.
//!
//! Exponential backoff (`unit * 2^attempt`, capped) with a small random
//! jitter so concurrent callers don't land on the upstream in lockstep.
//! The retryable predicate is supplied per call site.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Why a retried operation ultimately failed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-retryable error aborted the loop.
    Aborted(E),
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: E },
}

/// Bounded-attempt retry policy with capped exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
    cap: Duration,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            unit: Duration::from_secs(1),
            cap: Duration::from_secs(15),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom attempt budget and default backoff shape.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Fully custom policy (tests use millisecond units and zero jitter).
    pub fn new(max_attempts: u32, unit: Duration, cap: Duration, max_jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
            cap,
            max_jitter,
        }
    }

    /// Attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before the attempt following failed attempt `attempt`
    /// (1-based): `min(unit * 2^attempt, cap)` plus jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let backoff = self.unit.saturating_mul(factor).min(self.cap);
        backoff + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Run `op` until it succeeds, fails non-retryably, or the attempt
    /// budget is exhausted. `op` receives the 1-based attempt number.
    pub async fn run<T, E, P, Op, Fut>(&self, is_retryable: P, mut op: Op) -> Result<T, RetryError<E>>
    where
        E: Display,
        P: Fn(&E) -> bool,
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(RetryError::Aborted(e)),
                Err(e) => {
                    if attempt >= self.max_attempts {
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                    let delay = self.delay_for(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
