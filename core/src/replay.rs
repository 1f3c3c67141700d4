// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic replay of move histories
//!
//! The sole source of truth for "what the board looks like after move N".
//! Live play applies the last move incrementally for speed; undo re-derives
//! the board from the truncated prefix. Both paths fold the same capture
//! primitive, so they can never drift apart.

use thiserror::Error;

use crate::{board::Board, capture, Color, Move};

/// Board and capture tallies derived from a history
#[derive(Debug, Clone)]
pub struct Replayed {
    /// The board after all moves were applied
    pub board: Board,
    /// Stones captured by each player: (by Black, by White)
    pub captures: (u16, u16),
}

/// A history that does not replay cleanly
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("history corrupt at ply {ply}: {source}")]
pub struct ReplayError {
    /// Index of the offending move
    pub ply: usize,
    /// Why it was illegal against the replayed board
    #[source]
    pub source: crate::GameError,
}

/// Rebuild a board by folding the capture engine over an ordered move list.
///
/// Starts from an empty board of the given size. Passes advance the fold
/// without touching the board. Fails if any move is illegal against the
/// board state it replays onto; a consistent history never triggers this.
pub fn replay(board_size: u8, moves: &[Move]) -> Result<Replayed, ReplayError> {
    let mut board = Board::new(board_size);
    let mut captures = (0u16, 0u16);

    for (ply, mv) in moves.iter().enumerate() {
        match mv {
            Move::Place { coord, color, .. } => {
                let placement = capture::apply_placement(&board, *coord, *color)
                    .map_err(|source| ReplayError { ply, source })?;
                board = placement.board;
                let taken = placement.captured.len() as u16;
                match color {
                    Color::Black => captures.0 = captures.0.saturating_add(taken),
                    Color::White => captures.1 = captures.1.saturating_add(taken),
                }
            }
            Move::Pass { .. } => {}
        }
    }

    Ok(Replayed { board, captures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coord;
    use chrono::Utc;

    fn place(x: u8, y: u8, color: Color) -> Move {
        Move::Place {
            coord: Coord::new(x, y),
            color,
            ts: Utc::now(),
        }
    }

    #[test]
    fn empty_history_yields_empty_board() {
        let replayed = replay(9, &[]).unwrap();
        assert_eq!(replayed.board.stone_count(), 0);
        assert_eq!(replayed.captures, (0, 0));
    }

    #[test]
    fn illegal_history_reports_the_offending_ply() {
        let moves = vec![
            place(4, 4, Color::Black),
            place(4, 4, Color::White), // occupied
        ];
        let err = replay(9, &moves).unwrap_err();
        assert_eq!(err.ply, 1);
        assert_eq!(err.source, crate::GameError::OccupiedPosition);
    }
}
