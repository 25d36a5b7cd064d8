//! Trade engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, TradeError, constants};

/// Timing and sizing knobs for the trade engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    /// How long a session may stay PENDING (`TRADE_TIMEOUT`).
    pub trade_timeout: Duration,
    /// How long a LOCKED session waits for execution (`LOCK_TIMEOUT`).
    pub lock_timeout: Duration,
    /// Interval between background janitor sweeps.
    pub sweep_interval: Duration,
    /// Maximum number of items in one offer.
    pub max_items_per_offer: usize,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            trade_timeout: Duration::from_secs(constants::DEFAULT_TRADE_TIMEOUT_SECS),
            lock_timeout: Duration::from_secs(constants::DEFAULT_LOCK_TIMEOUT_SECS),
            sweep_interval: Duration::from_millis(constants::DEFAULT_SWEEP_INTERVAL_MS),
            max_items_per_offer: constants::DEFAULT_MAX_ITEMS_PER_OFFER,
        }
    }
}

impl TradeConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// `Configuration` if the document is malformed or fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| TradeError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations under which trades could never complete.
    ///
    /// # Errors
    /// `Configuration` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.trade_timeout.is_zero() {
            return Err(TradeError::Configuration("trade_timeout must be > 0".into()));
        }
        if self.lock_timeout.is_zero() {
            return Err(TradeError::Configuration("lock_timeout must be > 0".into()));
        }
        if self.lock_timeout >= self.trade_timeout {
            return Err(TradeError::Configuration(format!(
                "lock_timeout ({:?}) must be shorter than trade_timeout ({:?})",
                self.lock_timeout, self.trade_timeout
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(TradeError::Configuration("sweep_interval must be > 0".into()));
        }
        if self.max_items_per_offer == 0 {
            return Err(TradeError::Configuration(
                "max_items_per_offer must be > 0".into(),
            ));
        }
        Ok(())
    }
}
