//! Engine configuration.

use std::time::Duration;

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session close hour {0} is out of range (expected 0..24)")]
    InvalidCloseHour(u32),
}

/// Tunables for an [`crate::orderbook::Orderbook`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Local hour of day at which the trading session closes and
    /// good-for-day orders are cancelled (0..24)
    pub session_close_hour: u32,

    /// Slack added to the housekeeper's wait past the session boundary, so
    /// the wake lands strictly after the close
    pub prune_slack: Duration,

    /// Order storage to pre-allocate
    pub order_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_close_hour: 16,
            prune_slack: Duration::from_millis(100),
            order_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Validate field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_close_hour >= 24 {
            return Err(ConfigError::InvalidCloseHour(self.session_close_hour));
        }
        Ok(())
    }
}
