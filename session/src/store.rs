// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store abstraction
//!
//! A key-value store of serialized session snapshots plus a notice channel,
//! the minimal get/put/publish surface a horizontally-scaled deployment
//! needs. The in-memory implementation backs single-process deployments and
//! tests; a networked store only has to honor the same trait.

use std::collections::HashMap;

use anyhow::{Context, Result};
use goban_core::game::SessionSnapshot;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::SessionId;

/// What kind of mutation a notice announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// A move was applied and the turn changed
    Turn,
    /// Undo state changed (requested, accepted or rejected)
    Undo,
    /// A clock ran out
    Timeout,
    /// The session reached a terminal state
    Ended,
}

/// Cross-process notification that a session snapshot changed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreNotice {
    /// Which session changed
    pub session_id: SessionId,
    /// What changed
    pub kind: NoticeKind,
}

/// Get/put/publish semantics over serialized session snapshots
pub trait SessionStore: Send + Sync {
    /// Persist the snapshot under its session id
    fn put(&self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Fetch the snapshot for a session id, if present
    fn get(&self, id: &str) -> Result<Option<SessionSnapshot>>;

    /// Drop the snapshot for a session id
    fn remove(&self, id: &str) -> Result<()>;

    /// Announce a snapshot change to subscribers
    fn publish(&self, notice: StoreNotice);

    /// Receive snapshot-change notices
    fn subscribe(&self) -> broadcast::Receiver<StoreNotice>;
}

/// In-memory store for single-process deployments and tests
pub struct MemoryStore {
    entries: RwLock<HashMap<SessionId, String>>,
    notices_tx: broadcast::Sender<StoreNotice>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (notices_tx, _) = broadcast::channel(100);
        Self {
            entries: RwLock::new(HashMap::new()),
            notices_tx,
        }
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn put(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let serialized =
            serde_json::to_string(snapshot).context("Failed to serialize session snapshot")?;
        self.entries.write().insert(snapshot.id.clone(), serialized);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SessionSnapshot>> {
        let entries = self.entries.read();
        match entries.get(id) {
            Some(serialized) => {
                let snapshot = serde_json::from_str(serialized)
                    .context("Failed to deserialize session snapshot")?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.entries.write().remove(id);
        Ok(())
    }

    fn publish(&self, notice: StoreNotice) {
        // No subscribers is fine; the notice is simply dropped.
        let _ = self.notices_tx.send(notice);
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreNotice> {
        self.notices_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goban_core::game::{GameSession, Player};
    use goban_core::time::TimeSettings;
    use goban_core::Color;

    fn snapshot(id: &str) -> SessionSnapshot {
        GameSession::new(
            id.to_string(),
            9,
            [Player::human(Color::Black), Player::human(Color::White)],
            TimeSettings::default(),
        )
        .unwrap()
        .snapshot()
    }

    #[test]
    fn put_get_remove_round_trip() {
        let store = MemoryStore::new();
        store.put(&snapshot("s1")).unwrap();

        let loaded = store.get("s1").unwrap().unwrap();
        assert_eq!(loaded.id, "s1");
        assert_eq!(loaded.board_size, 9);
        assert!(store.get("s2").unwrap().is_none());

        store.remove("s1").unwrap();
        assert!(store.get("s1").unwrap().is_none());
    }

    #[tokio::test]
    async fn notices_reach_subscribers() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store.publish(StoreNotice {
            session_id: "s1".to_string(),
            kind: NoticeKind::Turn,
        });

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.session_id, "s1");
        assert_eq!(notice.kind, NoticeKind::Turn);
    }
}
