//! System-wide constants for the Roost trading engine.

/// Default lifetime of a PENDING session, in seconds (`TRADE_TIMEOUT`).
pub const DEFAULT_TRADE_TIMEOUT_SECS: u64 = 300;

/// Default window between LOCK and EXECUTE, in seconds (`LOCK_TIMEOUT`).
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 10;

/// Default interval between background janitor sweeps, in milliseconds.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5_000;

/// Default cap on the number of items in one offer.
pub const DEFAULT_MAX_ITEMS_PER_OFFER: usize = 20;
