//! Deploy pipeline tuning.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Options for one [`Deployer`](crate::Deployer).
///
/// Every field has a default so a partial TOML table is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployOptions {
    /// Maximum uploads in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per remote call timeout, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Maximum manifest entries per populate call.
    #[serde(default = "default_populate_batch_size")]
    pub populate_batch_size: usize,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_concurrency() -> usize {
    4
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_populate_batch_size() -> usize {
    1000
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            call_timeout_secs: default_call_timeout_secs(),
            populate_batch_size: default_populate_batch_size(),
            retry: RetryPolicy::default(),
        }
    }
}

impl DeployOptions {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Backoff for retryable upload failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per file, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff cap, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based), with ±25% jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = (self.initial_delay_ms as f64 / 1000.0) * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_delay_ms as f64 / 1000.0);
        let jitter = capped * 0.25;
        let offset = (SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as f64
            / 1_000_000_000.0)
            * 2.0
            - 1.0; // [-1.0, 1.0)
        Duration::from_secs_f64((capped + jitter * offset).max(0.0))
    }
}
