//! Inventory item model: eggs and chickens.
//!
//! An [`ItemRecord`] is the authoritative record held by the inventory
//! store. A [`TradeItem`] is a reference to one record plus a display
//! snapshot taken when it was offered; the snapshot is never used to
//! decide anything.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ItemId;

/// The two tradeable item families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ItemKind {
    Egg,
    Chicken,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Egg => write!(f, "EGG"),
            Self::Chicken => write!(f, "CHICKEN"),
        }
    }
}

/// One egg or chicken as stored in a player's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Inventory-assigned identifier. Changes whenever the item changes owner.
    pub id: ItemId,
    /// Egg or chicken.
    pub kind: ItemKind,
    /// Catalog species key (e.g. "silkie", "golden-egg").
    pub species: String,
    /// Catalog rarity key (e.g. "common", "legendary").
    pub rarity: String,
    /// Money produced but not yet collected by the current owner.
    pub accrued_value: Decimal,
    /// Remaining per-item state (hatch progress, nickname, ...).
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ItemRecord {
    #[must_use]
    pub fn new(
        id: ItemId,
        kind: ItemKind,
        species: impl Into<String>,
        rarity: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            species: species.into(),
            rarity: rarity.into(),
            accrued_value: Decimal::ZERO,
            attributes: BTreeMap::new(),
        }
    }

    /// Clear owner-specific accumulated state. The receiving player starts
    /// the item fresh.
    pub fn reset_for_new_owner(&mut self) {
        self.accrued_value = Decimal::ZERO;
    }

    /// SHA-256 over every field that survives a change of ownership.
    ///
    /// Two records with the same fingerprint are the same item as far as
    /// conservation is concerned; `id` and `accrued_value` are excluded.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"roost:item:v1:");
        hasher.update(self.kind.to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.species.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.rarity.as_bytes());
        hasher.update([0u8]);
        // BTreeMap iterates in key order, so this is canonical.
        for (key, value) in &self.attributes {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.to_string().as_bytes());
            hasher.update([0u8]);
        }
        hasher.finalize().into()
    }

    /// Short hex form of [`fingerprint`](Self::fingerprint) for logs.
    #[must_use]
    pub fn fingerprint_short(&self) -> String {
        hex::encode(&self.fingerprint()[..6])
    }
}

/// A reference to one inventory record inside an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeItem {
    pub kind: ItemKind,
    pub item_id: ItemId,
    /// Copy of the record at offer time, for display only.
    pub snapshot: ItemRecord,
}

impl TradeItem {
    /// Build a trade reference from the record currently in the inventory.
    #[must_use]
    pub fn from_record(record: &ItemRecord) -> Self {
        Self {
            kind: record.kind,
            item_id: record.id.clone(),
            snapshot: record.clone(),
        }
    }
}

/// Fixture records for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl ItemRecord {
    /// A record with a random species and some uncollected value.
    pub fn dummy(id: &str, kind: ItemKind) -> Self {
        const SPECIES: [&str; 4] = ["silkie", "leghorn", "orpington", "brahma"];
        let idx = usize::try_from(rand::random::<u32>() % 4).unwrap_or(0);
        let mut record = Self::new(ItemId::from(id), kind, SPECIES[idx], "common");
        record.accrued_value = Decimal::new(i64::from(rand::random::<u16>()) + 1, 2);
        record
    }
}
