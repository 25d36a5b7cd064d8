//! Error types for the Roost trading engine.
//!
//! All errors use the `TR_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Session / registry errors
//! - 2xx: State machine and timing errors
//! - 3xx: Item conflict errors
//! - 4xx: Validation errors
//! - 5xx: Inventory / settlement errors
//! - 9xx: General / internal errors
//!
//! Every variant is recoverable: callers turn it into a structured failure
//! for the player. [`TradeError::kind`] gives the coarse category.

use std::{fmt, time::Duration};

use thiserror::Error;

use crate::{ItemId, PlayerId, SessionId, TradeStatus};

/// Which timeout elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWindow {
    /// The PENDING lifetime (`TRADE_TIMEOUT`).
    Negotiation,
    /// The LOCKED-to-execute window (`LOCK_TIMEOUT`).
    Lock,
}

impl fmt::Display for ExpiryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negotiation => write!(f, "negotiation"),
            Self::Lock => write!(f, "lock"),
        }
    }
}

/// Central error enum for all trade operations.
#[derive(Debug, Error)]
pub enum TradeError {
    // =================================================================
    // Session / Registry Errors (1xx)
    // =================================================================
    /// No session with this ID is registered.
    #[error("TR_ERR_100: Trade session not found: {0}")]
    SessionNotFound(SessionId),

    /// A player tried to open a trade with themselves.
    #[error("TR_ERR_101: Self-trade rejected for {0}")]
    SelfTrade(PlayerId),

    /// The player already has a non-terminal session.
    #[error("TR_ERR_102: {player} is already trading in {session}")]
    AlreadyInSession { player: PlayerId, session: SessionId },

    /// The caller is neither party to the session.
    #[error("TR_ERR_103: {player} is not a participant in {session}")]
    NotAParticipant { player: PlayerId, session: SessionId },

    // =================================================================
    // State / Timing Errors (2xx)
    // =================================================================
    /// The operation is not allowed in the session's current status.
    #[error("TR_ERR_200: Cannot {operation} a {status} trade")]
    InvalidState {
        operation: &'static str,
        status: TradeStatus,
    },

    /// A timeout elapsed.
    #[error("TR_ERR_201: Trade {window} window of {limit:?} elapsed")]
    Expired { window: ExpiryWindow, limit: Duration },

    /// Locking requires both offers to be confirmed.
    #[error("TR_ERR_202: Waiting for confirmation from {waiting_on:?}")]
    NotConfirmed { waiting_on: Vec<PlayerId> },

    // =================================================================
    // Item Conflict Errors (3xx)
    // =================================================================
    /// The item is already in this player's offer.
    #[error("TR_ERR_300: Item {0} already offered")]
    DuplicateItem(ItemId),

    /// The item is reserved by another LOCKED session.
    #[error("TR_ERR_301: Item {item} is locked by {session}")]
    ItemLocked { item: ItemId, session: SessionId },

    /// The offer already holds the maximum number of items.
    #[error("TR_ERR_302: Offer is full ({limit} items)")]
    OfferFull { limit: usize },

    // =================================================================
    // Validation Errors (4xx)
    // =================================================================
    /// Offered items are no longer in their owner's inventory.
    #[error("TR_ERR_400: {owner} no longer has {} offered item(s): {missing:?}", .missing.len())]
    MissingItems { owner: PlayerId, missing: Vec<ItemId> },

    /// The item is not part of the caller's offer.
    #[error("TR_ERR_401: Item {0} is not in the offer")]
    ItemNotOffered(ItemId),

    // =================================================================
    // Inventory / Settlement Errors (5xx)
    // =================================================================
    /// The inventory store reported a failure.
    #[error("TR_ERR_500: Inventory store error: {0}")]
    Inventory(String),

    /// The exchange failed midway and every moved item was restored.
    #[error("TR_ERR_501: Settlement aborted and rolled back: {reason}")]
    SettlementAborted { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TR_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("TR_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Coarse error category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidState,
    NotAParticipant,
    ItemConflict,
    MissingItems,
    Expired,
    NotFound,
    Inventory,
    Internal,
}

impl TradeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::SelfTrade(_)
            | Self::AlreadyInSession { .. }
            | Self::InvalidState { .. }
            | Self::NotConfirmed { .. } => ErrorKind::InvalidState,
            Self::NotAParticipant { .. } => ErrorKind::NotAParticipant,
            Self::DuplicateItem(_) | Self::ItemLocked { .. } | Self::OfferFull { .. } => {
                ErrorKind::ItemConflict
            }
            Self::MissingItems { .. } | Self::ItemNotOffered(_) => ErrorKind::MissingItems,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::Inventory(_) | Self::SettlementAborted { .. } => ErrorKind::Inventory,
            Self::Internal(_) | Self::Configuration(_) => ErrorKind::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = TradeError::SessionNotFound(SessionId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("TR_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn invalid_state_display() {
        let err = TradeError::InvalidState {
            operation: "add items to",
            status: TradeStatus::Locked,
        };
        let msg = format!("{err}");
        assert!(msg.contains("TR_ERR_200"));
        assert!(msg.contains("LOCKED"));
    }

    #[test]
    fn missing_items_display_counts() {
        let err = TradeError::MissingItems {
            owner: PlayerId(9),
            missing: vec![ItemId::from("e1"), ItemId::from("e2")],
        };
        let msg = format!("{err}");
        assert!(msg.contains("player:9"));
        assert!(msg.contains("2 offered item(s)"), "Got: {msg}");
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            TradeError::DuplicateItem(ItemId::from("x")).kind(),
            ErrorKind::ItemConflict
        );
        assert_eq!(
            TradeError::ItemLocked {
                item: ItemId::from("x"),
                session: SessionId::new()
            }
            .kind(),
            ErrorKind::ItemConflict
        );
        assert_eq!(
            TradeError::Expired {
                window: ExpiryWindow::Lock,
                limit: Duration::from_secs(10)
            }
            .kind(),
            ErrorKind::Expired
        );
        assert_eq!(
            TradeError::NotConfirmed { waiting_on: vec![] }.kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            TradeError::NotAParticipant {
                player: PlayerId(3),
                session: SessionId::new()
            }
            .kind(),
            ErrorKind::NotAParticipant
        );
    }

    #[test]
    fn all_errors_have_tr_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(TradeError::SelfTrade(PlayerId(1))),
            Box::new(TradeError::OfferFull { limit: 20 }),
            Box::new(TradeError::Inventory("disk".into())),
            Box::new(TradeError::Internal("test".into())),
            Box::new(TradeError::SettlementAborted {
                reason: "insert failed".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("TR_ERR_"),
                "Error missing TR_ERR_ prefix: {msg}"
            );
        }
    }
}
