//! Backoff for operations that fail with retriable envelopes.
//!
//! Only errors whose [`ErrorClass`](crate::ErrorClass) is retriable are
//! retried; everything else is returned on the first failure.

use crate::{ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::hash::{BuildHasher, RandomState};
use std::time::Duration;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles per attempt.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay.
    pub max_delay_ms: u64,
    /// Symmetric jitter applied to each delay, in percent.
    pub jitter_ratio_pct: u32,
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ratio_pct: 0,
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    #[must_use]
    pub fn delay_after(self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(30);
        let nominal = self
            .base_delay_ms
            .saturating_mul(1u64 << doublings)
            .min(self.max_delay_ms);
        let range = nominal.saturating_mul(u64::from(self.jitter_ratio_pct.min(100))) / 100;
        if range == 0 {
            return Duration::from_millis(nominal);
        }

        let offset = RandomState::new().hash_one(attempt) % (range * 2 + 1);
        let jittered = nominal - range + offset;
        Duration::from_millis(jittered.min(self.max_delay_ms))
    }

    /// One delay per retry the policy allows.
    pub fn backoff(self) -> impl Iterator<Item = Duration> {
        (1..self.max_attempts.max(1)).map(move |attempt| self.delay_after(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 25,
            max_delay_ms: 1_000,
            jitter_ratio_pct: 20,
        }
    }
}

/// Run `op` until it succeeds, fails non-retriably, or `policy` runs out.
///
/// `on_retry` sees the 1-based attempt that just failed and its error.
/// Cancellation is checked before every attempt and interrupts the backoff sleep.
pub async fn retry_with_backoff<T, F, Fut, Obs>(
    ctx: &RequestContext,
    policy: RetryPolicy,
    operation: &'static str,
    mut op: F,
    mut on_retry: Obs,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    Obs: FnMut(u32, &ErrorEnvelope),
{
    let mut delays = policy.backoff();
    let mut attempt = 1u32;
    loop {
        ctx.ensure_not_cancelled(operation)?;
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        let Some(delay) = delays.next().filter(|_| error.class.is_retriable()) else {
            return Err(error);
        };

        on_retry(attempt, &error);
        tokio::select! {
            biased;
            () = ctx.cancelled() => {},
            () = tokio::time::sleep(delay) => {},
        }
        attempt = attempt.saturating_add(1);
    }
}
