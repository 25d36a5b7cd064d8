//! # roost-inventory
//!
//! The inventory store is an external collaborator of the trade engine:
//! it owns every player's eggs and chickens, assigns item IDs, and is
//! mutated by many subsystems. This crate defines the narrow interface the
//! trade engine consumes ([`InventoryStore`]) and a thread-safe in-memory
//! implementation ([`MemoryInventory`]).

pub mod memory;
pub mod store;

pub use memory::MemoryInventory;
pub use store::InventoryStore;
