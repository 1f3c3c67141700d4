// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session state machine
//!
//! Owns the board, the move history, the turn, both clocks and the undo
//! negotiation. Every mutating operation is fail-closed: on error the session
//! is left exactly as it was. After any successful mutation the invariant
//! `board == replay(history)` holds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Board;
use crate::capture;
use crate::replay::{self, Replayed};
use crate::time::{
    apply_elapsed, validate_blitz_settings, ClockOutcome, PlayerClock, TimeSettings,
};
use crate::undo::{self, UndoError, UndoRequest, UndoStatus};
use crate::{Color, Coord, GameError, GameResult, Move, MoveInput, Stone};

/// How a seat is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    /// Moves arrive from a human client
    Human,
    /// Moves are proposed by an AI engine
    Bot,
}

/// One of the two seats in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Seat color
    pub color: Color,
    /// Who drives it
    pub kind: PlayerKind,
    /// Display name, if any
    pub name: Option<String>,
}

impl Player {
    /// A human seat
    pub fn human(color: Color) -> Self {
        Self {
            color,
            kind: PlayerKind::Human,
            name: None,
        }
    }

    /// A bot seat
    pub fn bot(color: Color) -> Self {
        Self {
            color,
            kind: PlayerKind::Bot,
            name: None,
        }
    }
}

/// Malformed time-control configuration, reported to the caller
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid time settings: {0}")]
pub struct InvalidSettings(pub String);

/// Clock state for both seats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clocks {
    /// Black's clock
    pub black: PlayerClock,
    /// White's clock
    pub white: PlayerClock,
}

impl Clocks {
    fn new(settings: &TimeSettings) -> Self {
        Self {
            black: PlayerClock::new(Color::Black, settings),
            white: PlayerClock::new(Color::White, settings),
        }
    }

    /// The clock for the given color
    pub fn get(&self, color: Color) -> &PlayerClock {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    fn get_mut(&mut self, color: Color) -> &mut PlayerClock {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }
}

/// Result of submitting a move
#[derive(Debug, Clone)]
pub enum MoveOutcome {
    /// The move was applied
    Played {
        /// The normalized move as recorded in the history
        mv: Move,
        /// Opponent stones removed by it
        captured: Vec<Coord>,
        /// What the mover's clock did
        clock: ClockOutcome,
        /// Whether this move ended the game (two consecutive passes)
        game_over: bool,
    },
    /// The mover's clock was already exhausted; the move was not applied
    TimedOut(GameResult),
}

/// Resolution of a pending undo request
#[derive(Debug, Clone, PartialEq)]
pub enum UndoDecision {
    /// History was truncated and the board re-derived
    Accepted {
        /// The resolved request
        request: UndoRequest,
        /// The plies that were dropped, oldest first
        removed: Vec<Move>,
    },
    /// Nothing changed
    Rejected {
        /// The resolved request
        request: UndoRequest,
    },
}

/// Serializable view of a session, emitted after every accepted mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session id
    pub id: String,
    /// Board size
    pub board_size: u8,
    /// Live stones
    pub board: Vec<Stone>,
    /// Full move history, ply order
    pub history: Vec<Move>,
    /// Whose turn it is
    pub current_player: Color,
    /// Whether the game has ended
    pub game_over: bool,
    /// Conventional result string (`B+T`, `W+R`, ...), if decided
    pub result: Option<String>,
    /// Stones captured by (Black, White)
    pub captures: (u16, u16),
    /// Shared time-control configuration
    pub settings: TimeSettings,
    /// Per-color clock state
    pub clocks: Clocks,
    /// Undo request awaiting an answer, if any
    pub pending_undo: Option<UndoRequest>,
}

/// A single game session: board, history, seats, turn, clocks, undo state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    id: String,
    board_size: u8,
    board: Board,
    history: Vec<Move>,
    players: [Player; 2],
    current_player: Color,
    game_over: bool,
    result: Option<GameResult>,
    captures: (u16, u16),
    settings: TimeSettings,
    clocks: Clocks,
    pending_undo: Option<UndoRequest>,
    pass_count: u8,
}

impl GameSession {
    /// Create a session. The time-control configuration is validated up
    /// front and rejected (never silently coerced) when malformed.
    pub fn new(
        id: String,
        board_size: u8,
        players: [Player; 2],
        settings: TimeSettings,
    ) -> Result<Self, InvalidSettings> {
        let verdict = validate_blitz_settings(&settings);
        if !verdict.valid {
            return Err(InvalidSettings(
                verdict.error.unwrap_or_else(|| "invalid settings".to_string()),
            ));
        }

        // Seats are stored Black-first regardless of caller order.
        let players = if players[0].color == Color::Black {
            players
        } else {
            let [white, black] = players;
            [black, white]
        };

        let clocks = Clocks::new(&settings);
        Ok(Self {
            id,
            board_size,
            board: Board::new(board_size),
            history: Vec::new(),
            players,
            current_player: Color::Black,
            game_over: false,
            result: None,
            captures: (0, 0),
            settings,
            clocks,
            pending_undo: None,
            pass_count: 0,
        })
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The board as of the latest mutation
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Move history, ply order
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Whose turn it is
    pub fn current_player(&self) -> Color {
        self.current_player
    }

    /// Whether the game has ended
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Terminal result, if decided
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Shared time-control configuration
    pub fn settings(&self) -> &TimeSettings {
        &self.settings
    }

    /// Both clocks
    pub fn clocks(&self) -> &Clocks {
        &self.clocks
    }

    /// The seat for a color
    pub fn player(&self, color: Color) -> &Player {
        match color {
            Color::Black => &self.players[0],
            Color::White => &self.players[1],
        }
    }

    /// Undo request awaiting an answer, if any
    pub fn pending_undo(&self) -> Option<&UndoRequest> {
        self.pending_undo.as_ref()
    }

    /// Submit a move for `color`, charging `elapsed` think time to its clock.
    ///
    /// The placement is resolved and the clock charged before anything is
    /// committed, so a rejected move leaves the session untouched. An
    /// exhausted clock ends the game instead of applying the move; that is a
    /// terminal outcome, not an error.
    pub fn play_move(
        &mut self,
        color: Color,
        input: &MoveInput,
        ts: DateTime<Utc>,
        elapsed: Duration,
    ) -> Result<MoveOutcome, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        if color != self.current_player {
            return Err(GameError::NotYourTurn(color));
        }

        let coord = input.normalize()?;

        // Resolve the placement against the current board without mutating.
        let placement = match coord {
            Some(c) => Some(capture::apply_placement(&self.board, c, color)?),
            None => None,
        };

        // Charge the clock on a scratch copy so a timeout commits only the
        // terminal state, never a half-applied move.
        let mut clock = self.clocks.get(color).clone();
        let clock_outcome = apply_elapsed(&mut clock, elapsed, &self.settings);
        if let Some(result) = clock_outcome.timeout() {
            *self.clocks.get_mut(color) = clock;
            self.end_game(Some(result));
            tracing::info!(session = %self.id, %result, "clock exhausted on move submission");
            return Ok(MoveOutcome::TimedOut(result));
        }

        // Commit.
        *self.clocks.get_mut(color) = clock;
        let mv = match coord {
            Some(c) => Move::Place {
                coord: c,
                color,
                ts,
            },
            None => Move::Pass { color, ts },
        };

        let mut captured = Vec::new();
        match placement {
            Some(p) => {
                self.board = p.board;
                // Without a ko rule, capture cycles make arbitrarily long
                // games legal; the tallies saturate rather than wrap.
                let taken = p.captured.len() as u16;
                match color {
                    Color::Black => self.captures.0 = self.captures.0.saturating_add(taken),
                    Color::White => self.captures.1 = self.captures.1.saturating_add(taken),
                }
                captured = p.captured;
                self.pass_count = 0;
            }
            None => {
                self.pass_count += 1;
            }
        }

        self.history.push(mv.clone());
        self.current_player = color.opposite();

        // Two consecutive passes end the game without a decided result
        // (scoring is out of scope).
        if self.pass_count >= 2 {
            self.end_game(None);
        }

        debug_assert_eq!(
            self.board.position_hash(),
            replay::replay(self.board_size, &self.history)
                .map(|r| r.board.position_hash())
                .unwrap_or(0),
        );

        Ok(MoveOutcome::Played {
            mv,
            captured,
            clock: clock_outcome,
            game_over: self.game_over,
        })
    }

    /// Ask to undo `count` trailing plies. At most one request may be pending.
    pub fn request_undo(&mut self, requester: Color, count: usize) -> Result<(), UndoError> {
        if self.game_over {
            return Err(UndoError::GameOver);
        }
        undo::validate_request(count, self.history.len(), self.pending_undo.as_ref())?;

        tracing::debug!(session = %self.id, ?requester, count, "undo requested");
        self.pending_undo = Some(UndoRequest {
            requester,
            count,
            status: UndoStatus::Pending,
        });
        Ok(())
    }

    /// Answer the pending undo request. Only the requester's opponent may
    /// answer. Acceptance truncates the history and re-derives the board,
    /// captures and turn from the remaining prefix; rejection changes nothing.
    pub fn respond_undo(
        &mut self,
        responder: Color,
        accept: bool,
    ) -> Result<UndoDecision, UndoError> {
        if self.game_over {
            return Err(UndoError::GameOver);
        }
        let pending = self.pending_undo.as_ref().ok_or(UndoError::NothingPending)?;
        if responder == pending.requester {
            return Err(UndoError::NotOpponent(responder));
        }
        let mut request = pending.clone();

        if !accept {
            request.status = UndoStatus::Rejected;
            self.pending_undo = None;
            tracing::debug!(session = %self.id, "undo rejected");
            return Ok(UndoDecision::Rejected { request });
        }

        // Re-derive everything from the truncated prefix before committing.
        let cut = self.history.len() - request.count;
        let truncated = &self.history[..cut];
        let Replayed { board, captures } = replay::replay(self.board_size, truncated)
            .map_err(|e| UndoError::ReplayFailed(e.to_string()))?;

        // The player to move is the color of the first dropped ply; never
        // carried over from the pre-undo turn.
        let removed: Vec<Move> = self.history[cut..].to_vec();
        let next_player = removed[0].color();

        self.history.truncate(cut);
        self.board = board;
        self.captures = captures;
        self.current_player = next_player;
        self.pass_count = trailing_passes(&self.history);
        request.status = UndoStatus::Accepted;
        self.pending_undo = None;

        tracing::info!(
            session = %self.id,
            plies = request.count,
            remaining = self.history.len(),
            "undo accepted, board re-derived"
        );
        Ok(UndoDecision::Accepted { request, removed })
    }

    /// The current player's deadline passed without a move. Ends the game,
    /// discarding any pending undo request.
    pub fn timeout_current_player(&mut self) -> Result<GameResult, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        let result = self.clocks.get_mut(self.current_player).force_timeout();
        self.end_game(Some(result));
        tracing::info!(session = %self.id, %result, "game ended on timeout");
        Ok(result)
    }

    /// A player resigns. Discards any pending undo request.
    pub fn resign(&mut self, color: Color) -> Result<GameResult, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        let result = GameResult::Resignation {
            winner: color.opposite(),
        };
        self.end_game(Some(result));
        tracing::info!(session = %self.id, %result, "game ended on resignation");
        Ok(result)
    }

    fn end_game(&mut self, result: Option<GameResult>) {
        self.game_over = true;
        self.result = result;
        if self.pending_undo.take().is_some() {
            tracing::debug!(session = %self.id, "pending undo cancelled by game end");
        }
    }

    /// Current serializable view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            board_size: self.board_size,
            board: self.board.stones(),
            history: self.history.clone(),
            current_player: self.current_player,
            game_over: self.game_over,
            result: self.result.map(|r| r.to_string()),
            captures: self.captures,
            settings: self.settings.clone(),
            clocks: self.clocks.clone(),
            pending_undo: self.pending_undo.clone(),
        }
    }
}

/// Number of consecutive passes at the tail of a history
fn trailing_passes(history: &[Move]) -> u8 {
    history
        .iter()
        .rev()
        .take_while(|mv| mv.is_pass())
        .count()
        .min(u8::MAX as usize) as u8
}
