// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture resolution and placement legality
//!
//! The single board-mutation primitive shared by live play and replay. It is
//! pure: the input board is never touched, a new board is returned together
//! with the captured stones.

use std::collections::HashSet;

use crate::{board::Board, Color, Coord, GameError};

/// Result of a legal placement
#[derive(Debug, Clone)]
pub struct Placement {
    /// The board after the stone is placed and captures are removed
    pub board: Board,
    /// Opponent stones removed by this placement
    pub captured: Vec<Coord>,
}

/// Place a stone and resolve captures.
///
/// Opponent groups left without liberties are removed first; only then is the
/// placing group checked for suicide. Placing on an occupied point or outside
/// the board is illegal. Passes never reach this function.
pub fn apply_placement(board: &Board, coord: Coord, color: Color) -> Result<Placement, GameError> {
    if !coord.is_valid(board.size()) {
        return Err(GameError::InvalidCoordinate);
    }

    if board.get(coord).is_some() {
        return Err(GameError::OccupiedPosition);
    }

    let mut next = board.clone();
    next.place(coord, color);

    // Remove adjacent opponent groups with no liberties.
    let opponent = color.opposite();
    let mut captured: Vec<Coord> = Vec::new();
    let mut seen: HashSet<Coord> = HashSet::new();
    for neighbor in next.adjacent_coords(coord) {
        if next.get(neighbor) == Some(opponent) && !seen.contains(&neighbor) {
            let group = find_group(&next, neighbor);
            seen.extend(group.iter().copied());
            if liberties(&next, &group) == 0 {
                captured.extend(group);
            }
        }
    }
    for &c in &captured {
        next.remove(c);
    }

    // Suicide check on the placing group, after opponent captures.
    let own_group = find_group(&next, coord);
    if liberties(&next, &own_group) == 0 {
        if captured.is_empty() {
            return Err(GameError::SelfCapture);
        }
        // Unreachable on a square board: capturing frees at least one
        // adjacent point, which is a liberty of the placing group.
        tracing::warn!(?coord, "placing group has no liberties after capture");
    }

    Ok(Placement {
        board: next,
        captured,
    })
}

/// Calculate the number of liberties for a group of stones
pub fn liberties(board: &Board, group: &[Coord]) -> usize {
    let mut liberties_set = HashSet::new();

    for &coord in group {
        for neighbor in board.adjacent_coords(coord) {
            if board.get(neighbor).is_none() {
                liberties_set.insert(neighbor);
            }
        }
    }

    liberties_set.len()
}

/// Find all stones in the group connected to the stone at coord
pub fn find_group(board: &Board, coord: Coord) -> Vec<Coord> {
    let target_color = match board.get(coord) {
        Some(color) => color,
        None => return Vec::new(),
    };

    let mut group = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = vec![coord];

    while let Some(current) = queue.pop() {
        if visited.contains(&current) {
            continue;
        }

        visited.insert(current);
        group.push(current);

        for neighbor in board.adjacent_coords(current) {
            if let Some(color) = board.get(neighbor) {
                if color == target_color && !visited.contains(&neighbor) {
                    queue.push(neighbor);
                }
            }
        }
    }

    group
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_board_is_untouched() {
        let board = Board::new(9);
        let placement = apply_placement(&board, Coord::new(4, 4), Color::Black).unwrap();
        assert_eq!(board.stone_count(), 0);
        assert_eq!(placement.board.stone_count(), 1);
        assert!(placement.captured.is_empty());
    }

    #[test]
    fn group_flood_fill_spans_connected_stones() {
        let mut board = Board::new(9);
        board.place(Coord::new(2, 2), Color::Black);
        board.place(Coord::new(3, 2), Color::Black);
        board.place(Coord::new(3, 3), Color::Black);
        board.place(Coord::new(5, 5), Color::Black); // not connected

        let group = find_group(&board, Coord::new(2, 2));
        assert_eq!(group.len(), 3);
    }
}
