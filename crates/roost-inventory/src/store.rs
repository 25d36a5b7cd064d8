//! The inventory store collaborator.
//!
//! Player inventories are owned by the game's inventory service and are
//! mutated by many subsystems besides trading (selling, hatching, feeding).
//! The trade engine only borrows these four operations and never caches
//! what it reads.

use roost_types::{ItemId, ItemKind, ItemRecord, PlayerId, Result};

/// Read/remove/insert access to per-player egg and chicken collections.
///
/// Implementations synchronize internally; every method takes `&self`.
pub trait InventoryStore: Send + Sync {
    /// Look up one record by ID within the given family.
    fn find_item(&self, player: PlayerId, item_id: &ItemId, kind: ItemKind)
    -> Result<Option<ItemRecord>>;

    /// Remove one record, returning it, or `None` if the player does not hold it.
    fn remove_item(
        &self,
        player: PlayerId,
        item_id: &ItemId,
        kind: ItemKind,
    ) -> Result<Option<ItemRecord>>;

    /// Store `record` under `record.id`. Returns the ID it was stored under.
    ///
    /// # Errors
    /// `Inventory` if a record with that ID already exists for the player.
    fn insert_item(&self, player: PlayerId, record: ItemRecord, kind: ItemKind) -> Result<ItemId>;

    /// A fresh ID never handed out before.
    fn generate_id(&self) -> ItemId;
}
