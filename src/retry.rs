use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DubError, Result};

/// Exponential backoff shared by the transcript and translation stages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Number of outer attempts
    pub max_retries: u32,
    /// Delay before the second attempt (seconds)
    pub base_delay_secs: f64,
    /// Upper bound for any single delay (seconds)
    pub max_delay_secs: f64,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_secs: 1.0,
            max_delay_secs: 10.0,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay in seconds after the 0-indexed `attempt`:
    /// `min(max_delay, base_delay * backoff_factor^attempt)`
    pub fn delay_secs(&self, attempt: u32) -> f64 {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay_secs * self.backoff_factor.powi(exponent);
        if delay.is_nan() {
            // zero base times an overflowed power
            0.0
        } else {
            delay.min(self.max_delay_secs)
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.delay_secs(attempt).max(0.0))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(DubError::Config("retry.max_retries must be at least 1".to_string()));
        }
        if !(self.base_delay_secs >= 0.0 && self.base_delay_secs.is_finite()) {
            return Err(DubError::Config("retry.base_delay_secs must be >= 0".to_string()));
        }
        if !(self.max_delay_secs >= 0.0 && self.max_delay_secs.is_finite()) {
            return Err(DubError::Config("retry.max_delay_secs must be >= 0".to_string()));
        }
        // a factor below 1 would shrink delays and break monotonicity
        if !(self.backoff_factor >= 1.0 && self.backoff_factor.is_finite()) {
            return Err(DubError::Config("retry.backoff_factor must be >= 1".to_string()));
        }
        Ok(())
    }
}
