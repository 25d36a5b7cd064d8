//! One participant's side of a trade.

use serde::{Deserialize, Serialize};

use crate::{ItemId, TradeItem};

/// The items one party proposes to give away, plus their confirmation mark.
///
/// Any change to `items` clears `confirmed`: a player can never be held to
/// an offer they have not seen in its final form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeOffer {
    items: Vec<TradeItem>,
    confirmed: bool,
}

impl TradeOffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[TradeItem] {
        &self.items
    }

    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.confirmed = confirmed;
    }

    #[must_use]
    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.items.iter().any(|i| &i.item_id == item_id)
    }

    /// Append an item. Returns `false` (and changes nothing) if an item with
    /// the same ID is already offered.
    pub fn insert(&mut self, item: TradeItem) -> bool {
        if self.contains(&item.item_id) {
            return false;
        }
        self.items.push(item);
        self.confirmed = false;
        true
    }

    /// Remove an item by ID, preserving the order of the rest.
    pub fn remove(&mut self, item_id: &ItemId) -> Option<TradeItem> {
        let pos = self.items.iter().position(|i| &i.item_id == item_id)?;
        self.confirmed = false;
        Some(self.items.remove(pos))
    }

    /// Item IDs in offer order.
    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter().map(|i| &i.item_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
