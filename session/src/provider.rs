// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI move-provider seam
//!
//! The session engine treats move generation as an opaque collaborator: given
//! a board and a color, propose a move. Engine failures are surfaced as
//! [`EngineUnavailable`] and handled by session policy, never by crashing the
//! session.

use goban_core::board::Board;
use goban_core::capture;
use goban_core::{Color, Coord};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The AI collaborator failed to produce a move
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("engine unavailable: {0}")]
pub struct EngineUnavailable(pub String);

/// Strength parameters forwarded to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strength {
    /// Playing strength, roughly 1 (weakest) to 9
    pub level: u8,
}

impl Default for Strength {
    fn default() -> Self {
        Self { level: 1 }
    }
}

/// Proposes moves for one seat. `None` means pass.
pub trait MoveProvider: Send {
    /// Propose a move for `color` on the given board
    fn propose_move(
        &mut self,
        board: &Board,
        color: Color,
        strength: &Strength,
    ) -> Result<Option<Coord>, EngineUnavailable>;
}

/// Uniformly random legal-move provider, for tests and demos
pub struct RandomProvider {
    rng: StdRng,
}

impl RandomProvider {
    /// Seeded provider; games reproduce for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomProvider {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl MoveProvider for RandomProvider {
    fn propose_move(
        &mut self,
        board: &Board,
        color: Color,
        _strength: &Strength,
    ) -> Result<Option<Coord>, EngineUnavailable> {
        let legal: Vec<Coord> = board
            .empty_coords()
            .into_iter()
            .filter(|&c| capture::apply_placement(board, c, color).is_ok())
            .collect();

        Ok(legal.choose(&mut self.rng).copied())
    }
}

/// Provider that always fails; exercises the failure policy in tests
pub struct UnavailableProvider;

impl MoveProvider for UnavailableProvider {
    fn propose_move(
        &mut self,
        _board: &Board,
        _color: Color,
        _strength: &Strength,
    ) -> Result<Option<Coord>, EngineUnavailable> {
        Err(EngineUnavailable("engine offline".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_provider_proposes_legal_moves() {
        let board = Board::new(9);
        let mut provider = RandomProvider::seeded(7);
        let coord = provider
            .propose_move(&board, Color::Black, &Strength::default())
            .unwrap()
            .expect("empty board has legal moves");
        assert!(coord.is_valid(9));
    }

    #[test]
    fn random_provider_passes_when_nothing_is_legal() {
        // Fill every point so nothing is left to play.
        let mut board = Board::new(2);
        board.place(Coord::new(0, 0), Color::Black);
        board.place(Coord::new(1, 0), Color::Black);
        board.place(Coord::new(0, 1), Color::Black);
        board.place(Coord::new(1, 1), Color::Black);

        let mut provider = RandomProvider::seeded(7);
        let proposal = provider
            .propose_move(&board, Color::White, &Strength::default())
            .unwrap();
        assert_eq!(proposal, None);
    }
}
