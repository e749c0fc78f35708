//! Monitor configuration - constructed by the bootstrap layer.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("recipient must not be empty")]
    EmptyRecipient,
    #[error("min price {min} exceeds max price {max}")]
    InvertedBounds { min: u64, max: u64 },
    #[error("poll interval must be non-zero")]
    ZeroInterval,
    #[error("error backoff must be non-zero")]
    ZeroBackoff,
}

/// Acceptance filter plus cadence. Loaded once before the loop starts,
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Inclusive lower price bound (Stars).
    pub min_price: u64,
    /// Inclusive upper price bound (Stars).
    pub max_price: u64,
    /// Only act on limited-release gifts.
    pub only_limited: bool,
    /// Destination for purchases and notifications.
    pub recipient: String,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_price: 0,
            max_price: u64::MAX,
            only_limited: false,
            recipient: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

impl MonitorConfig {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self { recipient: recipient.into(), ..Default::default() }
    }

    pub fn with_price_range(mut self, min: u64, max: u64) -> Self { self.min_price = min; self.max_price = max; self }
    pub fn with_only_limited(mut self, only: bool) -> Self { self.only_limited = only; self }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll_interval = interval; self }
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self { self.error_backoff = backoff; self }

    /// Fail fast: the loop must never start with an invalid policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recipient.trim().is_empty() {
            return Err(ConfigError::EmptyRecipient);
        }
        if self.min_price > self.max_price {
            return Err(ConfigError::InvertedBounds { min: self.min_price, max: self.max_price });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.error_backoff.is_zero() {
            return Err(ConfigError::ZeroBackoff);
        }
        Ok(())
    }
}
