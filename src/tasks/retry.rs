use crate::config::MetricHubConfig;
use anyhow::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry behaviour of queued jobs: exponential backoff with jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Jitter factor (0.0 to 1.0). 0.25 means ±25% of the delay.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            jitter_factor: 0.25,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        jitter_factor: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &MetricHubConfig) -> Self {
        Self::new(
            config.task_max_attempts,
            Duration::from_millis(config.task_initial_backoff_ms),
            Duration::from_millis(config.task_max_backoff_ms),
            0.25,
        )
    }

    /// Delay before the retry that follows failed attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_backoff.as_millis() as u64;
        let exponential_factor = 1u64 << attempt.min(16);
        let capped_ms = base_ms
            .saturating_mul(exponential_factor)
            .min(self.max_backoff.as_millis() as u64);

        let jitter_range = (capped_ms as f64 * self.jitter_factor) as u64;
        let jitter = if jitter_range > 0 {
            rand::rng().random_range(0..=jitter_range * 2) as i64 - jitter_range as i64
        } else {
            0
        };

        Duration::from_millis((capped_ms as i64 + jitter).max(0) as u64)
    }
}

/// Runs `operation` until it succeeds or the policy runs out of attempts.
///
/// Every failure but the last is logged at warn level, the last one at error level.
pub async fn retry_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt - 1);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {:#}",
                    label, attempt, policy.max_attempts, delay, err
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                error!(
                    "{} failed permanently after {} attempts: {:?}",
                    label, attempt, err
                );
                return Err(err);
            }
        }
    }
}
