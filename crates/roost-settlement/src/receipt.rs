//! Receipt hash for a completed exchange.
//!
//! ```text
//! SHA-256("roost:receipt:v1:" || session_id || for each delivered record:
//!         owner || new_id || fingerprint)
//! ```
//!
//! Records are hashed party A's receipts first, then party B's, each in
//! delivery order, so the same exchange always hashes the same way.

use roost_types::{ItemRecord, PlayerId, SessionId};
use sha2::{Digest, Sha256};

/// Compute the receipt hash for a completed exchange.
#[must_use]
pub fn receipt_hash(
    session_id: SessionId,
    deliveries: &[(PlayerId, &[ItemRecord])],
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"roost:receipt:v1:");
    hasher.update(session_id.0.as_bytes());
    for (owner, records) in deliveries {
        for record in *records {
            hasher.update(owner.0.to_be_bytes());
            hasher.update(record.id.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(record.fingerprint());
        }
    }
    hasher.finalize().into()
}
