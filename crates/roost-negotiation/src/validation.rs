//! Validation engine.
//!
//! Confirms that a session is still live and that every offered item is
//! still in its owner's inventory. Runs twice per trade: before LOCK and
//! again immediately before EXECUTE, because other subsystems may sell,
//! hatch, or consume an item while the trade sits locked. The second run
//! must never be skipped.

use chrono::{DateTime, Utc};
use roost_inventory::InventoryStore;
use roost_types::{
    ExpiryWindow, ItemId, Party, PlayerId, Result, TradeConfig, TradeError, TradeOffer,
    TradeSession,
};

/// Outcome of checking one offer against its owner's inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferValidation {
    /// Offered items the owner no longer holds, in offer order.
    pub missing: Vec<ItemId>,
}

impl OfferValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check every item of `offer` against `owner`'s inventory by ID and kind.
///
/// Does not stop at the first miss: the result lists every missing item.
///
/// # Errors
/// Only if the inventory store itself fails.
pub fn validate_offer(
    store: &dyn InventoryStore,
    owner: PlayerId,
    offer: &TradeOffer,
) -> Result<OfferValidation> {
    let mut missing = Vec::new();
    for item in offer.items() {
        if store.find_item(owner, &item.item_id, item.kind)?.is_none() {
            missing.push(item.item_id.clone());
        }
    }
    Ok(OfferValidation { missing })
}

/// Check that `session` may still proceed.
///
/// # Errors
/// - `InvalidState` if the session is COMPLETED or CANCELLED
/// - `Expired` if more than `trade_timeout` has passed since it started
/// - `MissingItems` for the first side (A, then B) with missing items
pub fn validate_session(
    session: &TradeSession,
    store: &dyn InventoryStore,
    config: &TradeConfig,
    now: DateTime<Utc>,
) -> Result<()> {
    if session.is_terminal() {
        return Err(TradeError::InvalidState {
            operation: "validate",
            status: session.status,
        });
    }
    if session.negotiation_expired(now, config.trade_timeout) {
        return Err(TradeError::Expired {
            window: ExpiryWindow::Negotiation,
            limit: config.trade_timeout,
        });
    }

    for party in [Party::A, Party::B] {
        let owner = session.player(party);
        let result = validate_offer(store, owner, session.offer(party))?;
        if !result.is_valid() {
            tracing::warn!(
                session = %session.id,
                owner = %owner,
                missing = ?result.missing,
                "Offered items no longer in inventory"
            );
            return Err(TradeError::MissingItems {
                owner,
                missing: result.missing,
            });
        }
    }
    Ok(())
}
