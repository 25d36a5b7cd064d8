//! # roost-types
//!
//! Shared types, errors, and configuration for the **Roost** trading engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`SessionId`], [`PlayerId`], [`ItemId`]
//! - **Item model**: [`ItemKind`], [`ItemRecord`], [`TradeItem`]
//! - **Offer model**: [`TradeOffer`]
//! - **Session model**: [`TradeSession`], [`TradeStatus`], [`CancelReason`], [`Party`],
//!   [`SessionSummary`]
//! - **Settlement output**: [`TransferResult`]
//! - **Configuration**: [`TradeConfig`]
//! - **Time**: [`Clock`], [`SystemClock`]
//! - **Errors**: [`TradeError`] with `TR_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod item;
pub mod offer;
pub mod session;
pub mod transfer;

// Re-export all primary types at crate root for ergonomic imports:
//   use roost_types::{TradeSession, TradeStatus, ItemRecord, ...};

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::ManualClock;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use item::*;
pub use offer::*;
pub use session::*;
pub use transfer::*;

// Constants are accessed via `roost_types::constants::FOO`
// (not re-exported to avoid name collisions).
