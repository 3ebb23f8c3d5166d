//! Draft synchronisation configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for draft saves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each further retry
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Attempts to make, never less than one
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the given failed attempt (0-based): `base × 2^attempt`
    #[inline]
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

/// Draft synchronisation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period before a background save fires
    pub debounce_ms: u64,
    /// Save retry policy
    pub retry: RetryPolicy,
    /// Number of wizard pages
    pub total_steps: u8,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With debounce delay
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With number of wizard pages
    #[inline]
    #[must_use]
    pub fn with_total_steps(mut self, total_steps: u8) -> Self {
        self.total_steps = total_steps;
        self
    }

    /// Debounce delay
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            retry: RetryPolicy::default(),
            total_steps: 4,
        }
    }
}
