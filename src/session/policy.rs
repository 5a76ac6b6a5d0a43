//! Retry policy shared by startup and per-operation retries.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::{apply_jitter, linear_backoff};

/// Immutable retry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    jitter_ratio: f64,
}

impl RetryPolicy {
    /// Create a policy without jitter. `max_attempts` is raised to at least 1.
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            jitter_ratio: 0.0,
        }
    }

    /// Set the jitter ratio, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, ratio: f64) -> Self {
        self.jitter_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    pub fn jitter_ratio(&self) -> f64 {
        self.jitter_ratio
    }

    /// Wait after failed startup attempt `attempt`: `base * attempt`.
    pub fn startup_delay(&self, attempt: u32) -> Duration {
        apply_jitter(linear_backoff(attempt, self.base_delay_ms), self.jitter_ratio)
    }

    /// Wait after failed operation attempt `attempt`: `base / 4 * attempt`.
    pub fn operation_delay(&self, attempt: u32) -> Duration {
        apply_jitter(linear_backoff(attempt, self.base_delay_ms / 4), self.jitter_ratio)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay_ms).with_jitter(config.jitter_ratio)
    }
}
