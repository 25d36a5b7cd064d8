//! # roost-settlement
//!
//! **Finality Plane**: executes LOCKED trades as one atomic two-way
//! exchange against the inventory store.
//!
//! ## Architecture
//!
//! The executor receives a LOCKED session from the negotiation plane and:
//! 1. Re-validates both offers (the second of the two validation passes)
//! 2. Removes and re-inserts every record under a rollback journal
//! 3. Checks that no item was created or destroyed
//! 4. Marks the session COMPLETED and releases its reservations
//! 5. Returns a [`TransferResult`](roost_types::TransferResult) with a receipt hash
//!
//! Any failure leaves both inventories exactly as they were and the
//! session CANCELLED.

pub mod conservation;
pub mod executor;
pub mod journal;
pub mod receipt;

pub use conservation::verify_conservation;
pub use executor::execute;
pub use journal::SettlementJournal;
pub use receipt::receipt_hash;
