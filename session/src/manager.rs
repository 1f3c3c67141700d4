// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session manager
//!   * create_session / get_session / remove_session
//!   * broadcast ManagerEvent via tokio::sync::broadcast
//!   * evicts terminal sessions after a retention window

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use goban_core::game::{GameSession, Player};
use goban_core::time::TimeSettings;
use tokio::sync::{broadcast, RwLock};

use crate::actor::{spawn_session, SeatProviders, SessionEvent, SessionHandle};
use crate::config::EngineConfig;
use crate::store::SessionStore;
use crate::SessionId;

/// Events emitted by the manager
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    /// A new session was created
    SessionCreated(SessionId),
    /// A session reached a terminal state and was evicted
    SessionEnded(SessionId),
}

/// Owns the handles of all live sessions in this process
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
    store: Arc<dyn SessionStore>,
    config: EngineConfig,
    events_tx: broadcast::Sender<ManagerEvent>,
    /// Keep a receiver alive to prevent channel closure
    _events_rx: broadcast::Receiver<ManagerEvent>,
}

impl SessionManager {
    /// Create a manager backed by the given store
    pub fn new(store: Arc<dyn SessionStore>, config: EngineConfig) -> Self {
        let (events_tx, events_rx) = broadcast::channel(100);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            store,
            config,
            events_tx,
            _events_rx: events_rx,
        }
    }

    /// Receive manager events
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events_tx.subscribe()
    }

    /// Create a session and spawn its actor.
    ///
    /// Malformed time settings are rejected here, before anything is spawned.
    pub async fn create_session(
        &self,
        board_size: u8,
        players: [Player; 2],
        settings: TimeSettings,
        providers: SeatProviders,
    ) -> Result<SessionHandle> {
        let id = format!("session-{}", uuid::Uuid::new_v4());
        let game = GameSession::new(id.clone(), board_size, players, settings)
            .context("refusing to create session")?;

        let handle = spawn_session(game, providers, self.store.clone(), &self.config);
        self.sessions.write().await.insert(id.clone(), handle.clone());
        tracing::info!(session = %id, board_size, "session created");

        self.watch_for_end(&handle);
        let _ = self.events_tx.send(ManagerEvent::SessionCreated(id));
        Ok(handle)
    }

    /// Look up a live session handle
    pub async fn get_session(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop a session handle and its stored snapshot immediately
    pub async fn remove_session(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        self.store.remove(id)?;
        tracing::info!(session = %id, "session removed");
        Ok(())
    }

    /// Evict the session once it ends, after the retention window.
    fn watch_for_end(&self, handle: &SessionHandle) {
        let id = handle.id().to_string();
        let mut events = handle.subscribe();
        let sessions = self.sessions.clone();
        let store = self.store.clone();
        let events_tx = self.events_tx.clone();
        let retention = self.config.retention();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::GameEnded { result }) => {
                        tracing::info!(session = %id, ?result, "session ended, evicting after retention");
                        tokio::time::sleep(retention).await;
                        sessions.write().await.remove(&id);
                        if let Err(e) = store.remove(&id) {
                            tracing::warn!(session = %id, error = %e, "failed to remove stored snapshot");
                        }
                        let _ = events_tx.send(ManagerEvent::SessionEnded(id));
                        break;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(session = %id, skipped, "eviction watcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
