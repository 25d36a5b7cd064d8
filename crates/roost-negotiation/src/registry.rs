//! Trade session registry.
//!
//! Owns every live [`TradeSession`] and three indices over them:
//! session ID → session, player → their non-terminal session, and
//! item → the LOCKED session reserving it.
//!
//! ## Locking
//!
//! Each session sits behind its own `Mutex`; callers hold it for the whole
//! of any mutating operation. The indices share one `RwLock` that is only
//! ever held while reading or writing the maps themselves. Lock order is
//! always session mutex first, then index lock. The registry never takes a
//! session mutex while holding the index lock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use roost_types::{ItemId, PlayerId, Result, SessionId, TradeError, TradeSession};

/// A session shared between the registry and in-flight operations.
pub type SharedSession = Arc<Mutex<TradeSession>>;

#[derive(Default)]
struct Indices {
    sessions: HashMap<SessionId, SharedSession>,
    by_player: HashMap<PlayerId, SessionId>,
    locked_items: HashMap<ItemId, SessionId>,
}

/// Process-wide store of trade sessions.
///
/// Constructed explicitly and owned by the trade desk; there is no global
/// instance. [`reset`](Self::reset) drops everything for test isolation.
#[derive(Default)]
pub struct SessionRegistry {
    indices: RwLock<Indices>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a PENDING session between two players.
    ///
    /// Expiry is not checked here: a player whose PENDING session has timed
    /// out but not yet been swept is still rejected until the janitor runs.
    ///
    /// # Errors
    /// - `SelfTrade` if both parties are the same player
    /// - `AlreadyInSession` if either party already has a non-terminal session
    pub fn create_session(
        &self,
        party_a: PlayerId,
        party_b: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<SharedSession> {
        if party_a == party_b {
            tracing::warn!(player = %party_a, "Self-trade request rejected");
            return Err(TradeError::SelfTrade(party_a));
        }

        let session = TradeSession::new(party_a, party_b, now);
        let id = session.id;

        let mut idx = self.indices.write();
        for player in [party_a, party_b] {
            if let Some(&existing) = idx.by_player.get(&player) {
                return Err(TradeError::AlreadyInSession {
                    player,
                    session: existing,
                });
            }
        }
        if idx.sessions.contains_key(&id) {
            return Err(TradeError::Internal(format!("session ID collision: {id}")));
        }

        let shared = Arc::new(Mutex::new(session));
        idx.sessions.insert(id, Arc::clone(&shared));
        idx.by_player.insert(party_a, id);
        idx.by_player.insert(party_b, id);
        drop(idx);

        tracing::info!(
            session = %id,
            party_a = %party_a,
            party_b = %party_b,
            "Trade session created"
        );
        Ok(shared)
    }

    /// Look up a session by ID.
    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<SharedSession> {
        self.indices.read().sessions.get(&id).cloned()
    }

    /// Look up a session by ID, failing with `SessionNotFound`.
    ///
    /// # Errors
    /// `SessionNotFound` if no session with this ID is registered.
    pub fn require(&self, id: SessionId) -> Result<SharedSession> {
        self.get(id).ok_or(TradeError::SessionNotFound(id))
    }

    /// The player's non-terminal session, if any. O(1) via the player index.
    ///
    /// The index is updated right after a session turns terminal, so a
    /// caller may briefly see a terminal session; the status check under the
    /// session mutex filters it out.
    #[must_use]
    pub fn active_session_for(&self, player: PlayerId) -> Option<SharedSession> {
        let shared = {
            let idx = self.indices.read();
            let id = idx.by_player.get(&player)?;
            idx.sessions.get(id).cloned()?
        };
        if shared.lock().is_terminal() {
            return None;
        }
        Some(shared)
    }

    /// The LOCKED session currently reserving `item`, if any.
    #[must_use]
    pub fn locking_session(&self, item: &ItemId) -> Option<SessionId> {
        self.indices.read().locked_items.get(item).copied()
    }

    /// Is `item` reserved by any LOCKED session?
    #[must_use]
    pub fn is_item_globally_locked(&self, item: &ItemId) -> bool {
        self.indices.read().locked_items.contains_key(item)
    }

    /// Reserve every item in `items` for `session`, all or nothing.
    ///
    /// # Errors
    /// `ItemLocked` naming the first item already reserved by another
    /// session; in that case nothing is reserved.
    pub fn reserve_items<'a>(
        &self,
        session: SessionId,
        items: impl IntoIterator<Item = &'a ItemId> + Clone,
    ) -> Result<()> {
        let mut idx = self.indices.write();
        for item in items.clone() {
            if let Some(&holder) = idx.locked_items.get(item) {
                if holder != session {
                    return Err(TradeError::ItemLocked {
                        item: item.clone(),
                        session: holder,
                    });
                }
            }
        }
        for item in items {
            idx.locked_items.insert(item.clone(), session);
        }
        Ok(())
    }

    /// Drop every item reservation held by `session`.
    pub fn release_items(&self, session: SessionId) {
        self.indices
            .write()
            .locked_items
            .retain(|_, holder| *holder != session);
    }

    /// Forget `session` in the player index so both parties may trade again.
    /// The session itself stays registered until the janitor removes it.
    pub fn release_players(&self, session: &TradeSession) {
        let mut idx = self.indices.write();
        for player in [session.party_a, session.party_b] {
            if idx.by_player.get(&player) == Some(&session.id) {
                idx.by_player.remove(&player);
            }
        }
    }

    /// Clear every index entry for a session that just turned terminal.
    pub fn release(&self, session: &TradeSession) {
        self.release_items(session.id);
        self.release_players(session);
    }

    /// Delete a session and every index entry pointing at it.
    pub fn remove(&self, id: SessionId) -> Option<SharedSession> {
        let mut idx = self.indices.write();
        let removed = idx.sessions.remove(&id)?;
        idx.by_player.retain(|_, sid| *sid != id);
        idx.locked_items.retain(|_, sid| *sid != id);
        Some(removed)
    }

    /// Every registered session, in no particular order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(SessionId, SharedSession)> {
        self.indices
            .read()
            .sessions
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect()
    }

    /// Number of registered sessions (including terminal ones not yet swept).
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.read().sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.read().sessions.is_empty()
    }

    /// Number of items currently reserved by LOCKED sessions.
    #[must_use]
    pub fn locked_item_count(&self) -> usize {
        self.indices.read().locked_items.len()
    }

    /// Drop every session and index entry.
    pub fn reset(&self) {
        *self.indices.write() = Indices::default();
    }
}
