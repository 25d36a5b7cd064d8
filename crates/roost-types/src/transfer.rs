//! The outcome of a completed exchange, returned for client notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItemRecord, PlayerId, SessionId};

/// What each party received from a COMPLETED trade.
///
/// Every delivered record carries its new, receiver-side ID and has had
/// its accumulated state reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub session_id: SessionId,
    pub party_a: PlayerId,
    pub party_b: PlayerId,
    /// Records now in party A's inventory (formerly party B's offer).
    pub party_a_received: Vec<ItemRecord>,
    /// Records now in party B's inventory (formerly party A's offer).
    pub party_b_received: Vec<ItemRecord>,
    pub completed_at: DateTime<Utc>,
    /// SHA-256 over the session ID and every delivered (owner, id, fingerprint).
    pub receipt_hash: [u8; 32],
}

impl TransferResult {
    /// Items delivered to `player`, or an empty slice if they were not a party.
    #[must_use]
    pub fn received_by(&self, player: PlayerId) -> &[ItemRecord] {
        if player == self.party_a {
            &self.party_a_received
        } else if player == self.party_b {
            &self.party_b_received
        } else {
            &[]
        }
    }

    /// Total number of records that changed hands.
    #[must_use]
    pub fn items_moved(&self) -> usize {
        self.party_a_received.len() + self.party_b_received.len()
    }

    #[must_use]
    pub fn receipt_hex(&self) -> String {
        hex::encode(self.receipt_hash)
    }
}
