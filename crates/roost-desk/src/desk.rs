//! The trade desk: the single entry point for every trade operation.
//!
//! Each call resolves the session, takes that session's mutex, runs the
//! negotiation / lock / settlement step with the current clock reading,
//! and returns an owned snapshot. Operations on different sessions run in
//! parallel; operations on the same session are serialized.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use roost_inventory::InventoryStore;
use roost_negotiation::{SessionRegistry, SharedSession, party_for, require_pending};
use roost_types::{
    CancelReason, Clock, ItemId, ItemKind, PlayerId, Result, SessionId, SessionSummary,
    SystemClock, TradeConfig, TradeError, TradeItem, TradeSession, TransferResult,
};

use crate::janitor::{self, SweepReport};

/// Owns the session registry and serializes access to each session.
pub struct TradeDesk {
    registry: SessionRegistry,
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    config: TradeConfig,
}

impl TradeDesk {
    /// Build a desk over `store`.
    ///
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn new(
        store: Arc<dyn InventoryStore>,
        clock: Arc<dyn Clock>,
        config: TradeConfig,
    ) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            trade_timeout = ?config.trade_timeout,
            lock_timeout = ?config.lock_timeout,
            max_items = config.max_items_per_offer,
            "Trade desk ready"
        );
        Ok(Self {
            registry: SessionRegistry::new(),
            store,
            clock,
            config,
        })
    }

    /// A desk on the system clock with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            store,
            clock: Arc::new(SystemClock),
            config: TradeConfig::default(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn session(&self, id: SessionId) -> Result<SharedSession> {
        self.registry.require(id)
    }

    // -----------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------

    /// Open a trade between `requester` (party A) and `partner` (party B).
    ///
    /// # Errors
    /// `SelfTrade` or `AlreadyInSession`.
    pub fn request_trade(&self, requester: PlayerId, partner: PlayerId) -> Result<TradeSession> {
        let shared = self
            .registry
            .create_session(requester, partner, self.now())?;
        let snapshot = shared.lock().clone();
        Ok(snapshot)
    }

    /// Offer one of the caller's items. The record is read from the
    /// caller's inventory at this moment to take the display snapshot.
    ///
    /// # Errors
    /// `SessionNotFound`, `NotAParticipant`, `InvalidState`, `MissingItems`
    /// if the caller does not hold the item, or any conflict from
    /// [`roost_negotiation::add_item`].
    pub fn add_item(
        &self,
        session_id: SessionId,
        player: PlayerId,
        kind: ItemKind,
        item_id: &ItemId,
    ) -> Result<TradeSession> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock();
        party_for(&session, player)?;
        require_pending(&session, "add items to")?;

        let record = self
            .store
            .find_item(player, item_id, kind)?
            .ok_or_else(|| TradeError::MissingItems {
                owner: player,
                missing: vec![item_id.clone()],
            })?;
        roost_negotiation::add_item(
            &mut session,
            &self.registry,
            player,
            TradeItem::from_record(&record),
            self.config.max_items_per_offer,
        )?;
        Ok(session.clone())
    }

    /// Withdraw an item from the caller's offer.
    ///
    /// # Errors
    /// `SessionNotFound`, `NotAParticipant`, `InvalidState`, `ItemNotOffered`.
    pub fn remove_item(
        &self,
        session_id: SessionId,
        player: PlayerId,
        item_id: &ItemId,
    ) -> Result<TradeItem> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock();
        roost_negotiation::remove_item(&mut session, player, item_id)
    }

    /// Set or clear the caller's confirmation mark.
    ///
    /// # Errors
    /// `SessionNotFound`, `NotAParticipant`, `InvalidState`.
    pub fn set_confirmation(
        &self,
        session_id: SessionId,
        player: PlayerId,
        confirmed: bool,
    ) -> Result<TradeSession> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock();
        roost_negotiation::set_confirmation(&mut session, player, confirmed)?;
        Ok(session.clone())
    }

    /// Freeze the trade. Either party may ask once both have confirmed.
    ///
    /// On failure the session is left PENDING with nothing reserved.
    ///
    /// # Errors
    /// `SessionNotFound`, `NotAParticipant`, or any error from
    /// [`roost_negotiation::lock`].
    pub fn request_lock(&self, session_id: SessionId, player: PlayerId) -> Result<TradeSession> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock();
        party_for(&session, player)?;
        roost_negotiation::lock(
            &mut session,
            &self.registry,
            self.store.as_ref(),
            &self.config,
            self.now(),
        )?;
        Ok(session.clone())
    }

    /// Perform the exchange for a LOCKED session.
    ///
    /// # Errors
    /// `SessionNotFound`, `NotAParticipant`, or any error from
    /// [`roost_settlement::execute`]; every error after the LOCKED check
    /// leaves the session CANCELLED.
    pub fn execute(&self, session_id: SessionId, player: PlayerId) -> Result<TransferResult> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock();
        party_for(&session, player)?;
        roost_settlement::execute(
            &mut session,
            &self.registry,
            self.store.as_ref(),
            &self.config,
            self.now(),
        )
    }

    /// Back out of a PENDING or LOCKED trade.
    ///
    /// # Errors
    /// `SessionNotFound`, `NotAParticipant`, or `InvalidState` if the
    /// session already ended.
    pub fn cancel(&self, session_id: SessionId, player: PlayerId) -> Result<TradeSession> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock();
        party_for(&session, player)?;
        session.mark_cancelled(CancelReason::PlayerRequest(player), self.now())?;
        self.registry.release(&session);
        tracing::info!(session = %session.id, player = %player, "Trade cancelled by player");
        Ok(session.clone())
    }

    /// Cancel whatever the player was trading. Safe to call any number of
    /// times; returns the cancelled session, or `None` if there was nothing
    /// to cancel.
    ///
    /// # Errors
    /// Only on an internal state-machine fault.
    pub fn on_disconnect(&self, player: PlayerId) -> Result<Option<TradeSession>> {
        let Some(shared) = self.registry.active_session_for(player) else {
            return Ok(None);
        };
        let mut session = shared.lock();
        // May have ended between the index lookup and taking the mutex.
        if session.is_terminal() {
            return Ok(None);
        }
        session.mark_cancelled(CancelReason::Disconnect(player), self.now())?;
        self.registry.release(&session);
        tracing::info!(session = %session.id, player = %player, "Trade cancelled on disconnect");
        Ok(Some(session.clone()))
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Snapshot of a session.
    ///
    /// # Errors
    /// `SessionNotFound`.
    pub fn get_session(&self, session_id: SessionId) -> Result<TradeSession> {
        let shared = self.session(session_id)?;
        let snapshot = shared.lock().clone();
        Ok(snapshot)
    }

    /// The player's non-terminal session, if any.
    #[must_use]
    pub fn active_session_for(&self, player: PlayerId) -> Option<TradeSession> {
        let shared = self.registry.active_session_for(player)?;
        let session = shared.lock();
        if session.is_terminal() {
            None
        } else {
            Some(session.clone())
        }
    }

    /// Human-readable status line for a session.
    ///
    /// # Errors
    /// `SessionNotFound`.
    pub fn summary(&self, session_id: SessionId) -> Result<SessionSummary> {
        let shared = self.session(session_id)?;
        let summary = shared.lock().summary();
        Ok(summary)
    }

    // -----------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------

    /// Run one janitor pass at the current clock reading.
    pub fn sweep(&self) -> SweepReport {
        janitor::sweep(&self.registry, &self.config, self.now())
    }

    /// Drop every session. For test isolation.
    pub fn reset(&self) {
        self.registry.reset();
        tracing::debug!("Trade desk reset");
    }

    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &TradeConfig {
        &self.config
    }
}
