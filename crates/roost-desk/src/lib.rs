//! # roost-desk
//!
//! The service face of the Roost trading engine.
//!
//! [`TradeDesk`] wires the negotiation and settlement planes to an
//! inventory store and a clock, serializes operations per session, and
//! hands out owned snapshots. The janitor removes finished sessions and
//! cancels expired ones, either on demand via [`TradeDesk::sweep`] or on a
//! tokio interval via [`spawn_janitor`].
//!
//! ```text
//! request_trade → add_item / remove_item / set_confirmation
//!     → request_lock → execute            (COMPLETED)
//!     ↘ cancel / on_disconnect / janitor  (CANCELLED)
//! ```

pub mod desk;
pub mod janitor;

pub use desk::TradeDesk;
pub use janitor::{JanitorHandle, SweepReport, spawn_janitor, sweep};
