//! Bounded-retry readiness polling.

use std::{future::Future, time::Duration};

use eyre::Result;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::AvailabilityTimeoutError;

/// A probe retry budget: how many attempts and how long to sleep between them.
///
/// Each client kind carries its own named policy since startup latency differs a lot
/// between implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of probe attempts.
    pub max_retries: u32,
    /// Sleep between consecutive attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub const fn new(max_retries: u32, interval: Duration) -> Self {
        Self { max_retries, interval }
    }

    /// Total time spent sleeping if every attempt fails.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_retries.saturating_sub(1)
    }

    /// Runs `probe` under this policy. See [`wait_for_availability`].
    pub async fn wait<T, F, Fut>(&self, probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        wait_for_availability(probe, self.max_retries, self.interval).await
    }
}

/// Calls `probe` up to `max_retries` times, sleeping `interval` between attempts, and
/// returns the first successful result.
///
/// Failed attempts are expected while a service boots and are only logged. Once the
/// budget is spent the call fails with [`AvailabilityTimeoutError`]. With
/// `max_retries == 0` the probe is never invoked.
pub async fn wait_for_availability<T, F, Fut>(
    mut probe: F,
    max_retries: u32,
    interval: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 1..=max_retries {
        match probe().await {
            Ok(value) => {
                debug!(attempt, max_retries, "probe succeeded");
                return Ok(value);
            }
            Err(err) => {
                debug!(attempt, max_retries, error = %err, "probe not successful yet");
            }
        }

        if attempt < max_retries {
            sleep(interval).await;
        }
    }

    warn!(max_retries, ?interval, "retry budget exhausted");
    Err(AvailabilityTimeoutError { max_retries, interval }.into())
}
