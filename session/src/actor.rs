// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized session actor
//!
//! Each session is owned by exactly one tokio task. Moves, undo answers and
//! timeout expiries are discrete events applied in strict arrival order, each
//! re-validating its precondition against current state, so the
//! `board == replay(history)` invariant can never be corrupted by
//! interleaving. The timeout deadline is re-armed on every turn change; a
//! move arriving before the deadline debounces the stale timer.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use goban_core::game::{GameSession, MoveOutcome, PlayerKind, SessionSnapshot, UndoDecision};
use goban_core::{Color, MoveInput};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

use crate::config::{EngineConfig, EngineFailurePolicy};
use crate::provider::{MoveProvider, Strength};
use crate::store::{NoticeKind, SessionStore, StoreNotice};
use crate::SessionId;

/// Events broadcast by a session after accepted mutations
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State changed; here is the new snapshot
    SnapshotUpdated(SessionSnapshot),
    /// A player asked to undo trailing plies
    UndoRequested {
        /// Who asked
        by: Color,
        /// How many plies
        count: usize,
    },
    /// The opponent declined the pending undo request
    UndoRejected {
        /// Whose request was declined
        requester: Color,
    },
    /// The session reached a terminal state
    GameEnded {
        /// Conventional result string, if decided
        result: Option<String>,
    },
}

enum SessionCommand {
    PlayMove {
        color: Color,
        input: MoveInput,
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    RequestUndo {
        color: Color,
        count: usize,
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    AnswerUndo {
        color: Color,
        accept: bool,
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    Resign {
        color: Color,
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Kick bot seats into motion (no-op when a human is to move)
    Start {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// One seat's engine binding
struct Seat {
    provider: Box<dyn MoveProvider>,
    strength: Strength,
}

/// Engine bindings for the bot seats of a session
#[derive(Default)]
pub struct SeatProviders {
    black: Option<Seat>,
    white: Option<Seat>,
}

impl SeatProviders {
    /// No bots
    pub fn none() -> Self {
        Self::default()
    }

    /// Bind an engine to a seat
    pub fn with(
        mut self,
        color: Color,
        provider: Box<dyn MoveProvider>,
        strength: Strength,
    ) -> Self {
        let seat = Some(Seat { provider, strength });
        match color {
            Color::Black => self.black = seat,
            Color::White => self.white = seat,
        }
        self
    }

    fn get_mut(&mut self, color: Color) -> Option<&mut Seat> {
        match color {
            Color::Black => self.black.as_mut(),
            Color::White => self.white.as_mut(),
        }
    }
}

/// Client-side handle to a running session actor
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: SessionId,
    cmd_tx: mpsc::Sender<SessionCommand>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Receive session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    async fn send(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<SessionSnapshot>>) -> SessionCommand,
    ) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| anyhow!("session {} is no longer running", self.id))?;
        reply_rx
            .await
            .context("session dropped the reply channel")?
    }

    /// Submit a move for a color
    pub async fn play_move(&self, color: Color, input: MoveInput) -> Result<SessionSnapshot> {
        self.send(|reply| SessionCommand::PlayMove {
            color,
            input,
            reply,
        })
        .await
    }

    /// Ask to undo trailing plies
    pub async fn request_undo(&self, color: Color, count: usize) -> Result<SessionSnapshot> {
        self.send(|reply| SessionCommand::RequestUndo {
            color,
            count,
            reply,
        })
        .await
    }

    /// Answer the pending undo request
    pub async fn answer_undo(&self, color: Color, accept: bool) -> Result<SessionSnapshot> {
        self.send(|reply| SessionCommand::AnswerUndo {
            color,
            accept,
            reply,
        })
        .await
    }

    /// Resign a seat
    pub async fn resign(&self, color: Color) -> Result<SessionSnapshot> {
        self.send(|reply| SessionCommand::Resign { color, reply }).await
    }

    /// Fetch the current snapshot
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(SessionCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| anyhow!("session {} is no longer running", self.id))?;
        reply_rx.await.context("session dropped the reply channel")
    }

    /// Kick bot seats into motion. Subscribe before calling this, or a fast
    /// bot game can finish before any event is observed.
    pub async fn start(&self) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(SessionCommand::Start { reply: reply_tx })
            .await
            .map_err(|_| anyhow!("session {} is no longer running", self.id))?;
        reply_rx.await.context("session dropped the reply channel")
    }
}

/// Spawn the actor task for a session and return its handle.
pub fn spawn_session(
    game: GameSession,
    providers: SeatProviders,
    store: Arc<dyn SessionStore>,
    config: &EngineConfig,
) -> SessionHandle {
    let id = game.id().to_string();
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (events_tx, _) = broadcast::channel(config.event_buffer);

    let actor = SessionActor {
        game,
        cmd_rx,
        events_tx: events_tx.clone(),
        store,
        providers,
        policy: config.engine_failure_policy,
        turn_started: Instant::now(),
        ended_notified: false,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        id,
        cmd_tx,
        events_tx,
    }
}

struct SessionActor {
    game: GameSession,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    events_tx: broadcast::Sender<SessionEvent>,
    store: Arc<dyn SessionStore>,
    providers: SeatProviders,
    policy: EngineFailurePolicy,
    turn_started: Instant,
    ended_notified: bool,
}

impl SessionActor {
    async fn run(mut self) {
        tracing::info!(session = %self.game.id(), "session actor started");

        // Persist the initial snapshot so get() works before the first move.
        self.put_snapshot();

        let deadline = tokio::time::sleep_until(self.current_deadline());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => break,
                    }
                }
                () = deadline.as_mut(), if !self.game.is_game_over() => {
                    self.handle_deadline();
                }
            }

            if !self.game.is_game_over() {
                // Debounce: every applied event re-arms the deadline for the
                // player now to move, so a stale timer can never fire against
                // an already-advanced clock.
                deadline.as_mut().reset(self.current_deadline());
            }
        }

        tracing::info!(session = %self.game.id(), "session actor stopped");
    }

    fn current_deadline(&self) -> Instant {
        let current = self.game.current_player();
        let budget = self
            .game
            .clocks()
            .get(current)
            .total_budget(self.game.settings());
        self.turn_started + budget
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::PlayMove {
                color,
                input,
                reply,
            } => {
                let elapsed = self.turn_started.elapsed();
                match self.game.play_move(color, &input, Utc::now(), elapsed) {
                    Ok(MoveOutcome::Played { .. }) => {
                        self.turn_started = Instant::now();
                        self.after_mutation(NoticeKind::Turn);
                        self.drive_bots();
                        let _ = reply.send(Ok(self.game.snapshot()));
                    }
                    Ok(MoveOutcome::TimedOut(result)) => {
                        tracing::info!(session = %self.game.id(), %result, "move arrived after clock exhaustion");
                        self.after_mutation(NoticeKind::Timeout);
                        let _ = reply.send(Ok(self.game.snapshot()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }
            SessionCommand::RequestUndo {
                color,
                count,
                reply,
            } => match self.game.request_undo(color, count) {
                Ok(()) => {
                    let _ = self
                        .events_tx
                        .send(SessionEvent::UndoRequested { by: color, count });
                    self.after_mutation(NoticeKind::Undo);
                    let _ = reply.send(Ok(self.game.snapshot()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e.into()));
                }
            },
            SessionCommand::AnswerUndo {
                color,
                accept,
                reply,
            } => match self.game.respond_undo(color, accept) {
                Ok(UndoDecision::Accepted { .. }) => {
                    // The truncation changed whose turn it is; restart the
                    // think timer for the restored position.
                    self.turn_started = Instant::now();
                    self.after_mutation(NoticeKind::Undo);
                    self.drive_bots();
                    let _ = reply.send(Ok(self.game.snapshot()));
                }
                Ok(UndoDecision::Rejected { request }) => {
                    let _ = self.events_tx.send(SessionEvent::UndoRejected {
                        requester: request.requester,
                    });
                    self.after_mutation(NoticeKind::Undo);
                    let _ = reply.send(Ok(self.game.snapshot()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e.into()));
                }
            },
            SessionCommand::Resign { color, reply } => match self.game.resign(color) {
                Ok(_) => {
                    self.after_mutation(NoticeKind::Ended);
                    let _ = reply.send(Ok(self.game.snapshot()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e.into()));
                }
            },
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.game.snapshot());
            }
            SessionCommand::Start { reply } => {
                self.drive_bots();
                let _ = reply.send(self.game.snapshot());
            }
        }
    }

    fn handle_deadline(&mut self) {
        // Re-validate: a move may have landed in the same poll batch.
        if self.game.is_game_over() {
            return;
        }
        match self.game.timeout_current_player() {
            Ok(result) => {
                tracing::info!(session = %self.game.id(), %result, "deadline passed without a move");
                self.after_mutation(NoticeKind::Timeout);
            }
            Err(e) => {
                tracing::warn!(session = %self.game.id(), error = %e, "stale deadline ignored");
            }
        }
    }

    /// Let bot seats move until a human is to move or the game ends.
    fn drive_bots(&mut self) {
        loop {
            if self.game.is_game_over() {
                return;
            }
            let color = self.game.current_player();
            if self.game.player(color).kind != PlayerKind::Bot {
                return;
            }

            let proposal = match self.providers.get_mut(color) {
                Some(seat) => seat.provider.propose_move(
                    self.game.board(),
                    color,
                    &seat.strength,
                ),
                None => {
                    tracing::warn!(session = %self.game.id(), ?color, "bot seat has no engine bound, turn stalls");
                    return;
                }
            };

            match proposal {
                Ok(coord) => {
                    let input = match coord {
                        Some(c) => MoveInput::place(c.x, c.y),
                        None => MoveInput::pass(),
                    };
                    let elapsed = self.turn_started.elapsed();
                    match self.game.play_move(color, &input, Utc::now(), elapsed) {
                        Ok(MoveOutcome::Played { .. }) => {
                            self.turn_started = Instant::now();
                            self.after_mutation(NoticeKind::Turn);
                        }
                        Ok(MoveOutcome::TimedOut(result)) => {
                            tracing::info!(session = %self.game.id(), %result, "bot clock exhausted");
                            self.after_mutation(NoticeKind::Timeout);
                            return;
                        }
                        Err(e) => {
                            tracing::error!(session = %self.game.id(), ?color, error = %e, "engine proposed an illegal move, turn stalls");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(session = %self.game.id(), ?color, error = %e, "engine unavailable");
                    match self.policy {
                        EngineFailurePolicy::Stall => return,
                        EngineFailurePolicy::Forfeit => {
                            if self.game.resign(color).is_ok() {
                                self.after_mutation(NoticeKind::Ended);
                            }
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Broadcast, persist and publish the new snapshot after an accepted
    /// mutation.
    fn after_mutation(&mut self, kind: NoticeKind) {
        let snapshot = self.game.snapshot();
        let _ = self
            .events_tx
            .send(SessionEvent::SnapshotUpdated(snapshot.clone()));

        if let Err(e) = self.store.put(&snapshot) {
            tracing::error!(session = %self.game.id(), error = %e, "failed to persist snapshot");
        }
        self.store.publish(StoreNotice {
            session_id: self.game.id().to_string(),
            kind,
        });

        if self.game.is_game_over() && !self.ended_notified {
            self.ended_notified = true;
            let _ = self.events_tx.send(SessionEvent::GameEnded {
                result: snapshot.result.clone(),
            });
        }
    }

    fn put_snapshot(&self) {
        if let Err(e) = self.store.put(&self.game.snapshot()) {
            tracing::error!(session = %self.game.id(), error = %e, "failed to persist initial snapshot");
        }
    }
}
