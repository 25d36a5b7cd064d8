//! # roost-negotiation
//!
//! **Negotiation Plane**: session registry, offer editing, two-phase
//! validation, and the lock step that freezes a trade.
//!
//! ## Architecture
//!
//! 1. **SessionRegistry**: owns sessions plus the player and item indices
//! 2. **negotiation**: add/remove items and toggle confirmation while PENDING
//! 3. **validation**: re-reads the inventory store; never trusts snapshots
//! 4. **lock_manager**: PENDING → LOCKED, reserving every offered item
//!
//! ## Session Flow
//!
//! ```text
//! create_session → add_item/remove_item/set_confirmation (PENDING)
//!     → validate_session → lock (LOCKED) → settlement
//! ```
//!
//! Every function that mutates a session expects the caller to hold that
//! session's mutex.

pub mod lock_manager;
pub mod negotiation;
pub mod registry;
pub mod validation;

pub use lock_manager::lock;
pub use negotiation::{add_item, party_for, remove_item, require_pending, set_confirmation};
pub use registry::{SessionRegistry, SharedSession};
pub use validation::{OfferValidation, validate_offer, validate_session};
