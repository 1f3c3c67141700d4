// SPDX-License-Identifier: MIT OR Apache-2.0

//! Goban Core - Game Rules and Session State
//!
//! This crate provides the core session-engine functionality including:
//! - Go board representation and manipulation
//! - Capture resolution and legality checks
//! - Deterministic replay of move histories
//! - Per-player time control (absolute/byo-yomi and blitz)
//! - Two-phase undo negotiation

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod board;
pub mod capture;
pub mod game;
pub mod replay;
pub mod time;
pub mod undo;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Player color in a Go game (Black or White)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Black player (traditionally goes first)
    Black,
    /// White player
    White,
}

impl Color {
    /// Returns the opposite color
    pub fn opposite(&self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter label used in result strings ("B" / "W")
    pub fn letter(&self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
        }
    }
}

/// Board coordinate representing a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column)
    pub x: u8,
    /// Y coordinate (row)
    pub y: u8,
}

impl Coord {
    /// Create a new coordinate
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Check if coordinate is valid for a board of given size
    pub fn is_valid(&self, board_size: u8) -> bool {
        self.x < board_size && self.y < board_size
    }
}

/// A stone that is live on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stone {
    /// Where the stone sits
    pub coord: Coord,
    /// Who owns it
    pub color: Color,
}

/// A normalized move as it is stored in a session history.
///
/// Moves are normalized at the ingestion boundary (see [`MoveInput`]);
/// downstream code never branches on raw client shapes. The index of a move
/// in the history is its ply number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    /// Place a stone at the specified coordinate
    Place {
        /// Target point
        coord: Coord,
        /// The player placing the stone
        color: Color,
        /// Server-side ingestion timestamp
        ts: DateTime<Utc>,
    },
    /// Pass the turn
    Pass {
        /// The player passing
        color: Color,
        /// Server-side ingestion timestamp
        ts: DateTime<Utc>,
    },
}

impl Move {
    /// The color that played this move
    pub fn color(&self) -> Color {
        match self {
            Move::Place { color, .. } | Move::Pass { color, .. } => *color,
        }
    }

    /// Whether this move is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass { .. })
    }

    /// The placed coordinate, if any
    pub fn coord(&self) -> Option<Coord> {
        match self {
            Move::Place { coord, .. } => Some(*coord),
            Move::Pass { .. } => None,
        }
    }
}

/// Raw move shape accepted from clients before normalization.
///
/// Historically clients have sent either a bare point, a wrapper object with
/// a `position` field, or the string `"pass"`. All three are folded into
/// [`Move`] at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveInput {
    /// Bare point: `{"x": 3, "y": 4}`
    Point { x: u8, y: u8 },
    /// Wrapped point: `{"position": {"x": 3, "y": 4}}`
    Wrapped { position: Coord },
    /// `"pass"` (case-insensitive)
    Named(String),
}

impl MoveInput {
    /// Fold a raw client shape into an optional coordinate (`None` = pass).
    pub fn normalize(&self) -> Result<Option<Coord>, GameError> {
        match self {
            MoveInput::Point { x, y } => Ok(Some(Coord::new(*x, *y))),
            MoveInput::Wrapped { position } => Ok(Some(*position)),
            MoveInput::Named(s) if s.eq_ignore_ascii_case("pass") => Ok(None),
            MoveInput::Named(s) => Err(GameError::InvalidMove(format!(
                "unrecognized move shape: {s:?}"
            ))),
        }
    }

    /// Convenience constructor for a placement input
    pub fn place(x: u8, y: u8) -> Self {
        MoveInput::Point { x, y }
    }

    /// Convenience constructor for a pass input
    pub fn pass() -> Self {
        MoveInput::Named("pass".to_string())
    }
}

/// Terminal result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// A player ran out of time; the opponent wins
    TimeLoss {
        /// The winning (non-timing-out) color
        winner: Color,
    },
    /// A player resigned; the opponent wins
    Resignation {
        /// The winning color
        winner: Color,
    },
}

impl GameResult {
    /// The winning color
    pub fn winner(&self) -> Color {
        match self {
            GameResult::TimeLoss { winner } | GameResult::Resignation { winner } => *winner,
        }
    }
}

impl std::fmt::Display for GameResult {
    /// Renders the conventional result string: `B+T`, `W+T`, `B+R`, `W+R`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::TimeLoss { winner } => write!(f, "{}+T", winner.letter()),
            GameResult::Resignation { winner } => write!(f, "{}+R", winner.letter()),
        }
    }
}

/// Errors that can occur during game play
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The coordinate is outside the board
    #[error("Invalid coordinate")]
    InvalidCoordinate,

    /// The position is already occupied
    #[error("Position already occupied")]
    OccupiedPosition,

    /// The move would result in self-capture (suicide)
    #[error("Move would result in self-capture")]
    SelfCapture,

    /// The move was submitted by the player whose turn it is not
    #[error("It is not {0:?}'s turn")]
    NotYourTurn(Color),

    /// The game has already ended
    #[error("Game is already over")]
    GameOver,

    /// Other game rules violation
    #[error("Invalid move: {0}")]
    InvalidMove(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_strings() {
        let r = GameResult::TimeLoss {
            winner: Color::White,
        };
        assert_eq!(r.to_string(), "W+T");
        let r = GameResult::Resignation {
            winner: Color::Black,
        };
        assert_eq!(r.to_string(), "B+R");
    }

    #[test]
    fn move_input_normalization() {
        assert_eq!(
            MoveInput::place(3, 4).normalize().unwrap(),
            Some(Coord::new(3, 4))
        );
        assert_eq!(
            MoveInput::Wrapped {
                position: Coord::new(3, 4)
            }
            .normalize()
            .unwrap(),
            Some(Coord::new(3, 4))
        );
        assert_eq!(MoveInput::pass().normalize().unwrap(), None);
        assert_eq!(
            MoveInput::Named("PASS".into()).normalize().unwrap(),
            None
        );
        assert!(MoveInput::Named("resign?".into()).normalize().is_err());
    }
}
