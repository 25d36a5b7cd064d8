//! In-memory inventory store.
//!
//! Tracks each player's eggs and chickens in separate maps keyed by item
//! ID. Used by tests and by single-process servers that persist elsewhere.

use std::collections::HashMap;

use parking_lot::RwLock;
use roost_types::{ItemId, ItemKind, ItemRecord, PlayerId, Result, TradeError};
use uuid::Uuid;

use crate::store::InventoryStore;

/// One player's holdings.
#[derive(Debug, Default, Clone)]
struct PlayerInventory {
    eggs: HashMap<ItemId, ItemRecord>,
    chickens: HashMap<ItemId, ItemRecord>,
}

impl PlayerInventory {
    fn bucket(&self, kind: ItemKind) -> &HashMap<ItemId, ItemRecord> {
        match kind {
            ItemKind::Egg => &self.eggs,
            ItemKind::Chicken => &self.chickens,
        }
    }

    fn bucket_mut(&mut self, kind: ItemKind) -> &mut HashMap<ItemId, ItemRecord> {
        match kind {
            ItemKind::Egg => &mut self.eggs,
            ItemKind::Chicken => &mut self.chickens,
        }
    }
}

/// Thread-safe in-memory [`InventoryStore`].
#[derive(Debug, Default)]
pub struct MemoryInventory {
    players: RwLock<HashMap<PlayerId, PlayerInventory>>,
}

impl MemoryInventory {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give a player a record, keeping its ID. Used to seed inventories.
    ///
    /// # Errors
    /// `Inventory` if the player already holds a record with that ID.
    pub fn grant(&self, player: PlayerId, record: ItemRecord) -> Result<ItemId> {
        let kind = record.kind;
        self.insert_item(player, record, kind)
    }

    /// Every record the player holds, eggs first, each family sorted by ID.
    #[must_use]
    pub fn items(&self, player: PlayerId) -> Vec<ItemRecord> {
        let players = self.players.read();
        let Some(inv) = players.get(&player) else {
            return Vec::new();
        };
        let mut eggs: Vec<_> = inv.eggs.values().cloned().collect();
        let mut chickens: Vec<_> = inv.chickens.values().cloned().collect();
        eggs.sort_by(|a, b| a.id.cmp(&b.id));
        chickens.sort_by(|a, b| a.id.cmp(&b.id));
        eggs.extend(chickens);
        eggs
    }

    /// Does the player hold this record?
    #[must_use]
    pub fn holds(&self, player: PlayerId, item_id: &ItemId, kind: ItemKind) -> bool {
        self.players
            .read()
            .get(&player)
            .is_some_and(|inv| inv.bucket(kind).contains_key(item_id))
    }

    /// Number of records of one family the player holds.
    #[must_use]
    pub fn count(&self, player: PlayerId, kind: ItemKind) -> usize {
        self.players
            .read()
            .get(&player)
            .map_or(0, |inv| inv.bucket(kind).len())
    }
}

impl InventoryStore for MemoryInventory {
    fn find_item(
        &self,
        player: PlayerId,
        item_id: &ItemId,
        kind: ItemKind,
    ) -> Result<Option<ItemRecord>> {
        Ok(self
            .players
            .read()
            .get(&player)
            .and_then(|inv| inv.bucket(kind).get(item_id))
            .cloned())
    }

    fn remove_item(
        &self,
        player: PlayerId,
        item_id: &ItemId,
        kind: ItemKind,
    ) -> Result<Option<ItemRecord>> {
        let mut players = self.players.write();
        Ok(players
            .get_mut(&player)
            .and_then(|inv| inv.bucket_mut(kind).remove(item_id)))
    }

    fn insert_item(&self, player: PlayerId, record: ItemRecord, kind: ItemKind) -> Result<ItemId> {
        if record.kind != kind {
            return Err(TradeError::Inventory(format!(
                "record {} is a {}, not a {kind}",
                record.id, record.kind
            )));
        }
        let mut players = self.players.write();
        let bucket = players.entry(player).or_default().bucket_mut(kind);
        if bucket.contains_key(&record.id) {
            return Err(TradeError::Inventory(format!(
                "{player} already holds {}",
                record.id
            )));
        }
        let id = record.id.clone();
        bucket.insert(id.clone(), record);
        tracing::trace!(player = %player, item = %id, kind = %kind, "Inventory insert");
        Ok(id)
    }

    fn generate_id(&self) -> ItemId {
        ItemId(Uuid::now_v7().to_string())
    }
}
