//! Offer negotiation.
//!
//! While a session is PENDING each participant edits their own offer and
//! toggles their own confirmation mark. Every edit clears the editor's
//! confirmation; nothing here ever touches the partner's offer.
//!
//! Callers must hold the session mutex for the duration of each call.

use roost_types::{
    ItemId, Party, PlayerId, Result, TradeError, TradeItem, TradeSession, TradeStatus,
};

use crate::registry::SessionRegistry;

/// Resolve `player` to their side of `session`.
///
/// # Errors
/// `NotAParticipant` if the player is neither party.
pub fn party_for(session: &TradeSession, player: PlayerId) -> Result<Party> {
    session
        .party_of(player)
        .ok_or(TradeError::NotAParticipant {
            player,
            session: session.id,
        })
}

/// Fail with `InvalidState` naming `operation` unless the session is PENDING.
///
/// # Errors
/// `InvalidState` for LOCKED, COMPLETED, and CANCELLED sessions.
pub fn require_pending(session: &TradeSession, operation: &'static str) -> Result<()> {
    if session.status == TradeStatus::Pending {
        Ok(())
    } else {
        Err(TradeError::InvalidState {
            operation,
            status: session.status,
        })
    }
}

/// Append `item` to the caller's offer and clear their confirmation.
///
/// # Errors
/// - `NotAParticipant` if the caller is neither party
/// - `InvalidState` unless the session is PENDING
/// - `ItemLocked` if another LOCKED session reserves the item
/// - `DuplicateItem` if the caller already offers it
/// - `OfferFull` if the offer already holds `max_items` items
pub fn add_item(
    session: &mut TradeSession,
    registry: &SessionRegistry,
    player: PlayerId,
    item: TradeItem,
    max_items: usize,
) -> Result<()> {
    let party = party_for(session, player)?;
    require_pending(session, "add items to")?;

    if let Some(holder) = registry.locking_session(&item.item_id) {
        if holder != session.id {
            return Err(TradeError::ItemLocked {
                item: item.item_id,
                session: holder,
            });
        }
    }

    let offer = session.offer_mut(party);
    if offer.contains(&item.item_id) {
        return Err(TradeError::DuplicateItem(item.item_id));
    }
    if offer.len() >= max_items {
        return Err(TradeError::OfferFull { limit: max_items });
    }

    let item_id = item.item_id.clone();
    let kind = item.kind;
    offer.insert(item);

    tracing::debug!(
        session = %session.id,
        player = %player,
        item = %item_id,
        kind = %kind,
        offered = session.offer(party).len(),
        "Item added to offer"
    );
    Ok(())
}

/// Remove an item from the caller's offer and clear their confirmation.
///
/// Removing and re-adding the same ID is allowed.
///
/// # Errors
/// - `NotAParticipant` if the caller is neither party
/// - `InvalidState` unless the session is PENDING
/// - `ItemNotOffered` if the item is not in the caller's offer
pub fn remove_item(
    session: &mut TradeSession,
    player: PlayerId,
    item_id: &ItemId,
) -> Result<TradeItem> {
    let party = party_for(session, player)?;
    require_pending(session, "remove items from")?;

    let removed = session
        .offer_mut(party)
        .remove(item_id)
        .ok_or_else(|| TradeError::ItemNotOffered(item_id.clone()))?;

    tracing::debug!(
        session = %session.id,
        player = %player,
        item = %item_id,
        offered = session.offer(party).len(),
        "Item removed from offer"
    );
    Ok(removed)
}

/// Set the caller's own confirmation mark. The partner's mark is untouched.
///
/// # Errors
/// - `NotAParticipant` if the caller is neither party
/// - `InvalidState` unless the session is PENDING
pub fn set_confirmation(
    session: &mut TradeSession,
    player: PlayerId,
    confirmed: bool,
) -> Result<()> {
    let party = party_for(session, player)?;
    require_pending(session, "confirm")?;

    session.offer_mut(party).set_confirmed(confirmed);

    tracing::debug!(
        session = %session.id,
        player = %player,
        confirmed,
        both = session.both_confirmed(),
        "Confirmation updated"
    );
    Ok(())
}
