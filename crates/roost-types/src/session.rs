//! # TradeSession: one negotiated exchange between two players
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  lock   ┌────────┐  execute   ┌───────────┐
//!   │ PENDING ├────────▶│ LOCKED ├───────────▶│ COMPLETED │
//!   └────┬────┘         └───┬────┘            └───────────┘
//!        │ cancel/timeout   │ cancel/lock-timeout/validation failure
//!        ▼                  ▼
//!   ┌───────────────────────────┐
//!   │         CANCELLED         │
//!   └───────────────────────────┘
//! ```
//!
//! Transitions are monotonic. `locked_item_ids` is non-empty only while the
//! session is LOCKED, and is then exactly the union of both offers.

use std::{collections::BTreeSet, fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItemId, PlayerId, SessionId, TradeError, TradeOffer, clock};

/// Lifecycle state of a trade session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Both players may edit and confirm their offers.
    Pending,
    /// Offers are frozen and every offered item is reserved.
    Locked,
    /// Items were exchanged. **Terminal.**
    Completed,
    /// The trade was abandoned. No inventory was touched. **Terminal.**
    Cancelled,
}

impl TradeStatus {
    /// Can a session in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Locked | Self::Cancelled)
                | (Self::Locked, Self::Completed | Self::Cancelled)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Locked => write!(f, "LOCKED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Why a session ended up CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelReason {
    /// A participant backed out.
    PlayerRequest(PlayerId),
    /// A participant left the server.
    Disconnect(PlayerId),
    /// Negotiation outlived the trade timeout.
    NegotiationTimeout,
    /// Nobody executed the locked trade inside the lock window.
    LockTimeout,
    /// The pre-execution re-validation failed.
    ValidationFailed,
    /// The inventory store failed during the exchange and it was rolled back.
    SettlementFailed,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerRequest(p) => write!(f, "cancelled by {p}"),
            Self::Disconnect(p) => write!(f, "{p} disconnected"),
            Self::NegotiationTimeout => write!(f, "negotiation timed out"),
            Self::LockTimeout => write!(f, "lock window elapsed"),
            Self::ValidationFailed => write!(f, "items changed before execution"),
            Self::SettlementFailed => write!(f, "settlement failed"),
        }
    }
}

/// Addresses one side of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    A,
    B,
}

/// A trade between exactly two players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSession {
    pub id: SessionId,
    /// The player who requested the trade.
    pub party_a: PlayerId,
    /// The player who was asked.
    pub party_b: PlayerId,
    pub offer_a: TradeOffer,
    pub offer_b: TradeOffer,
    pub status: TradeStatus,
    /// Items reserved against use in any other session while LOCKED.
    pub locked_item_ids: BTreeSet<ItemId>,
    pub started_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    /// When the session reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<CancelReason>,
}

impl TradeSession {
    /// A fresh PENDING session with two empty, unconfirmed offers.
    #[must_use]
    pub fn new(party_a: PlayerId, party_b: PlayerId, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            party_a,
            party_b,
            offer_a: TradeOffer::new(),
            offer_b: TradeOffer::new(),
            status: TradeStatus::Pending,
            locked_item_ids: BTreeSet::new(),
            started_at: now,
            locked_at: None,
            ended_at: None,
            cancel_reason: None,
        }
    }

    /// Which side `player` is on, if any.
    #[must_use]
    pub fn party_of(&self, player: PlayerId) -> Option<Party> {
        if player == self.party_a {
            Some(Party::A)
        } else if player == self.party_b {
            Some(Party::B)
        } else {
            None
        }
    }

    #[must_use]
    pub fn player(&self, party: Party) -> PlayerId {
        match party {
            Party::A => self.party_a,
            Party::B => self.party_b,
        }
    }

    #[must_use]
    pub fn offer(&self, party: Party) -> &TradeOffer {
        match party {
            Party::A => &self.offer_a,
            Party::B => &self.offer_b,
        }
    }

    pub fn offer_mut(&mut self, party: Party) -> &mut TradeOffer {
        match party {
            Party::A => &mut self.offer_a,
            Party::B => &mut self.offer_b,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn both_confirmed(&self) -> bool {
        self.offer_a.is_confirmed() && self.offer_b.is_confirmed()
    }

    /// Union of both offers' item IDs.
    #[must_use]
    pub fn offered_item_ids(&self) -> BTreeSet<ItemId> {
        self.offer_a
            .item_ids()
            .chain(self.offer_b.item_ids())
            .cloned()
            .collect()
    }

    /// Has negotiation outlived `trade_timeout`?
    #[must_use]
    pub fn negotiation_expired(&self, now: DateTime<Utc>, trade_timeout: Duration) -> bool {
        clock::elapsed_exceeds(self.started_at, now, trade_timeout)
    }

    /// Has the lock window elapsed? Always `false` for a session never locked.
    #[must_use]
    pub fn lock_expired(&self, now: DateTime<Utc>, lock_timeout: Duration) -> bool {
        self.locked_at
            .is_some_and(|at| clock::elapsed_exceeds(at, now, lock_timeout))
    }

    fn transition(&mut self, target: TradeStatus, operation: &'static str) -> crate::Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(TradeError::InvalidState {
                operation,
                status: self.status,
            });
        }
        self.status = target;
        Ok(())
    }

    /// PENDING → LOCKED. Reserves the union of both offers.
    ///
    /// # Errors
    /// `InvalidState` unless the session is PENDING.
    pub fn mark_locked(&mut self, now: DateTime<Utc>) -> crate::Result<()> {
        self.transition(TradeStatus::Locked, "lock")?;
        self.locked_item_ids = self.offered_item_ids();
        self.locked_at = Some(now);
        Ok(())
    }

    /// LOCKED → COMPLETED. Clears the reservation set.
    ///
    /// # Errors
    /// `InvalidState` unless the session is LOCKED.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> crate::Result<()> {
        self.transition(TradeStatus::Completed, "complete")?;
        self.locked_item_ids.clear();
        self.ended_at = Some(now);
        Ok(())
    }

    /// PENDING/LOCKED → CANCELLED. Clears the reservation set.
    ///
    /// # Errors
    /// `InvalidState` if the session is already terminal.
    pub fn mark_cancelled(
        &mut self,
        reason: CancelReason,
        now: DateTime<Utc>,
    ) -> crate::Result<()> {
        self.transition(TradeStatus::Cancelled, "cancel")?;
        self.locked_item_ids.clear();
        self.ended_at = Some(now);
        self.cancel_reason = Some(reason);
        Ok(())
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            status: self.status,
            party_a: self.party_a,
            items_a: self.offer_a.len(),
            confirmed_a: self.offer_a.is_confirmed(),
            party_b: self.party_b,
            items_b: self.offer_b.len(),
            confirmed_b: self.offer_b.is_confirmed(),
        }
    }
}

/// Compact, human-readable view of a session for UI and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub status: TradeStatus,
    pub party_a: PlayerId,
    pub items_a: usize,
    pub confirmed_a: bool,
    pub party_b: PlayerId,
    pub items_b: usize,
    pub confirmed_b: bool,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(count: usize, confirmed: bool) -> String {
            let noun = if count == 1 { "item" } else { "items" };
            let mark = if confirmed { "confirmed" } else { "unconfirmed" };
            format!("{count} {noun}, {mark}")
        }
        write!(
            f,
            "{} [{}] {} ({}) <-> {} ({})",
            self.id,
            self.status,
            self.party_a,
            side(self.items_a, self.confirmed_a),
            self.party_b,
            side(self.items_b, self.confirmed_b),
        )
    }
}
