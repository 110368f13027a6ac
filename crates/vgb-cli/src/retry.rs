//! Declarative retry with exponential backoff
//!
//! A [`RetryPolicy`] says how many attempts to make and how long to wait
//! between them; [`retry`] runs an async operation against it. Failures are
//! transient by definition here: they are logged at debug level and never
//! returned, the caller only learns whether some attempt succeeded.

use crate::clock::Clock;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Attempt cap and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Wait after the first failed attempt
    pub base_delay: Duration,

    /// Factor applied to the wait after every further failure
    pub multiplier: u32,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
        }
    }

    /// Wait that follows the `failed`-th failed attempt (1-based)
    pub fn delay_after(&self, failed: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(failed.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// The waits between attempts; one fewer than `max_attempts`
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(move |failed| self.delay_after(failed))
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// `op` receives the 1-based attempt number. No wait follows the final
/// attempt.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    operation: &str,
    mut op: F,
) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Succeeded after retry");
                }
                return Some(value);
            }
            Err(err) => {
                if attempt == policy.max_attempts {
                    debug!(operation, attempt, error = %err, "Retry attempts exhausted");
                    break;
                }

                let delay = policy.delay_after(attempt);
                debug!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_secs = delay.as_secs_f64(),
                    error = %err,
                    "Attempt failed, backing off"
                );
                clock.sleep(delay).await;
            }
        }
    }

    None
}
