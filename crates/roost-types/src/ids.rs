//! Identifiers used throughout Roost.
//!
//! Session IDs use UUIDv7 (millisecond timestamp + 74 random bits) so they
//! sort by creation time and never collide in practice. Player and item IDs
//! are owned by external collaborators and are wrapped as-is.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Unique identifier for one trade session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trade:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// Game-side player identifier. Assigned by the player service, never by us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// Identifier of one inventory record (an egg or a chicken).
///
/// The inventory store generates these; the trade engine treats them as
/// opaque strings and only compares them for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_uniqueness() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_ordering() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert!(a < b);
    }

    #[test]
    fn display_prefixes() {
        assert_eq!(format!("{}", PlayerId(42)), "player:42");
        assert_eq!(format!("{}", ItemId::from("egg-1")), "egg-1");
        assert!(format!("{}", SessionId::new()).starts_with("trade:"));
    }

    #[test]
    fn serde_roundtrips() {
        let sid = SessionId::new();
        let json = serde_json::to_string(&sid).unwrap();
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(sid, back);

        let iid = ItemId::new("chicken-7");
        let json = serde_json::to_string(&iid).unwrap();
        let back: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(iid, back);
    }
}
