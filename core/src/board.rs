// SPDX-License-Identifier: MIT OR Apache-2.0

//! Board representation and manipulation

use serde::{Deserialize, Serialize};

use crate::{Color, Coord, Stone};

/// Represents the Go board with stones and empty positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Size of the board (typically 9, 13, or 19)
    size: u8,
    /// Positions on the board
    positions: Vec<Option<Color>>,
}

impl Board {
    /// Create a new empty board with the specified size
    pub fn new(size: u8) -> Self {
        let cells = (size as usize) * (size as usize);
        Self {
            size,
            positions: vec![None; cells],
        }
    }

    /// Get the stone at the specified coordinate
    pub fn get(&self, coord: Coord) -> Option<Color> {
        if !coord.is_valid(self.size) {
            return None;
        }

        let idx = self.coord_to_index(coord);
        self.positions[idx]
    }

    /// Place a stone at the specified coordinate
    pub fn place(&mut self, coord: Coord, color: Color) -> bool {
        if !coord.is_valid(self.size) {
            return false;
        }

        let idx = self.coord_to_index(coord);
        if self.positions[idx].is_some() {
            return false;
        }

        self.positions[idx] = Some(color);
        true
    }

    /// Remove a stone at the specified coordinate
    pub fn remove(&mut self, coord: Coord) -> bool {
        if !coord.is_valid(self.size) {
            return false;
        }

        let idx = self.coord_to_index(coord);
        if self.positions[idx].is_none() {
            return false;
        }

        self.positions[idx] = None;
        true
    }

    /// Convert a coordinate to a vector index
    fn coord_to_index(&self, coord: Coord) -> usize {
        (coord.y as usize) * (self.size as usize) + (coord.x as usize)
    }

    /// Get adjacent coordinates (up, down, left, right)
    pub fn adjacent_coords(&self, coord: Coord) -> Vec<Coord> {
        if self.size == 0 {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(4);
        let x = coord.x;
        let y = coord.y;

        if y > 0 {
            result.push(Coord::new(x, y - 1));
        }

        if y < self.size - 1 {
            result.push(Coord::new(x, y + 1));
        }

        if x > 0 {
            result.push(Coord::new(x - 1, y));
        }

        if x < self.size - 1 {
            result.push(Coord::new(x + 1, y));
        }

        result
    }

    /// Get the size of the board
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Number of stones currently on the board
    pub fn stone_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }

    /// List all live stones, row-major order
    pub fn stones(&self) -> Vec<Stone> {
        let mut out = Vec::with_capacity(self.stone_count());
        for y in 0..self.size {
            for x in 0..self.size {
                let coord = Coord::new(x, y);
                if let Some(color) = self.get(coord) {
                    out.push(Stone { coord, color });
                }
            }
        }
        out
    }

    /// List all empty coordinates
    pub fn empty_coords(&self) -> Vec<Coord> {
        let mut out = Vec::new();
        for y in 0..self.size {
            for x in 0..self.size {
                let coord = Coord::new(x, y);
                if self.get(coord).is_none() {
                    out.push(coord);
                }
            }
        }
        out
    }

    /// Calculate a hash of the current board position
    pub fn position_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.positions.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_and_remove() {
        let mut board = Board::new(9);
        assert!(board.place(Coord::new(4, 4), Color::Black));
        assert!(!board.place(Coord::new(4, 4), Color::White));
        assert_eq!(board.get(Coord::new(4, 4)), Some(Color::Black));
        assert!(board.remove(Coord::new(4, 4)));
        assert!(!board.remove(Coord::new(4, 4)));
    }

    #[test]
    fn adjacency_is_clipped_at_edges() {
        let board = Board::new(9);
        assert_eq!(board.adjacent_coords(Coord::new(0, 0)).len(), 2);
        assert_eq!(board.adjacent_coords(Coord::new(4, 0)).len(), 3);
        assert_eq!(board.adjacent_coords(Coord::new(4, 4)).len(), 4);
    }

    #[test]
    fn zero_sized_board_yields_no_adjacency() {
        let board = Board::new(0);
        assert!(board.adjacent_coords(Coord::new(0, 0)).is_empty());
        assert_eq!(board.get(Coord::new(0, 0)), None);
    }

    #[test]
    fn stones_are_listed_in_row_major_order() {
        let mut board = Board::new(9);
        board.place(Coord::new(5, 2), Color::White);
        board.place(Coord::new(1, 1), Color::Black);
        let stones = board.stones();
        assert_eq!(stones.len(), 2);
        assert_eq!(stones[0].coord, Coord::new(1, 1));
        assert_eq!(stones[1].coord, Coord::new(5, 2));
    }
}
