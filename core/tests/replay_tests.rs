// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::Utc;
use goban_core::board::Board;
use goban_core::capture::apply_placement;
use goban_core::replay::replay;
use goban_core::{Color, Coord, Move};
use rand::prelude::*;

fn place(x: u8, y: u8, color: Color) -> Move {
    Move::Place {
        coord: Coord::new(x, y),
        color,
        ts: Utc::now(),
    }
}

fn pass(color: Color) -> Move {
    Move::Pass {
        color,
        ts: Utc::now(),
    }
}

/// Apply a history incrementally, the way live play does.
fn apply_incrementally(board_size: u8, moves: &[Move]) -> (Board, (u16, u16)) {
    let mut board = Board::new(board_size);
    let mut captures = (0u16, 0u16);
    for mv in moves {
        if let Move::Place { coord, color, .. } = mv {
            let placement = apply_placement(&board, *coord, *color).unwrap();
            board = placement.board;
            match color {
                Color::Black => captures.0 += placement.captured.len() as u16,
                Color::White => captures.1 += placement.captured.len() as u16,
            }
        }
    }
    (board, captures)
}

#[test]
fn replay_matches_incremental_application() {
    let moves = vec![
        place(4, 4, Color::Black),
        place(16, 16, Color::White),
        place(4, 16, Color::Black),
        pass(Color::White),
        place(10, 10, Color::Black),
        place(16, 4, Color::White),
    ];

    let replayed = replay(19, &moves).unwrap();
    let (incremental, captures) = apply_incrementally(19, &moves);

    assert_eq!(replayed.board.position_hash(), incremental.position_hash());
    assert_eq!(replayed.captures, captures);
}

#[test]
fn replay_matches_incremental_for_random_games() {
    // Legal-move random games; seeded so failures reproduce.
    let mut rng = StdRng::seed_from_u64(0x60ba1);

    for _ in 0..20 {
        let mut board = Board::new(9);
        let mut moves = Vec::new();
        let mut color = Color::Black;

        for _ in 0..60 {
            if rng.gen_ratio(1, 12) {
                moves.push(pass(color));
            } else {
                let legal: Vec<Coord> = board
                    .empty_coords()
                    .into_iter()
                    .filter(|&c| apply_placement(&board, c, color).is_ok())
                    .collect();
                let Some(&coord) = legal.choose(&mut rng) else {
                    moves.push(pass(color));
                    color = color.opposite();
                    continue;
                };
                board = apply_placement(&board, coord, color).unwrap().board;
                moves.push(place(coord.x, coord.y, color));
            }
            color = color.opposite();
        }

        let replayed = replay(9, &moves).unwrap();
        assert_eq!(
            replayed.board.position_hash(),
            board.position_hash(),
            "replay drifted from incremental application"
        );
    }
}

#[test]
fn captures_are_tallied_per_color() {
    // Black captures one white stone in the corner.
    let moves = vec![
        place(0, 0, Color::White),
        place(1, 0, Color::Black),
        pass(Color::White),
        place(0, 1, Color::Black),
    ];

    let replayed = replay(9, &moves).unwrap();
    assert_eq!(replayed.captures, (1, 0));
    assert_eq!(replayed.board.get(Coord::new(0, 0)), None);
    assert_eq!(replayed.board.stone_count(), 2);
}

#[test]
fn capture_tallies_saturate_instead_of_wrapping() {
    // With no ko rule a capture cycle is a legal history, so a game can
    // rack up more captures than u16 holds. The tallies must saturate,
    // not wrap or panic.
    let mut moves = vec![
        place(1, 1, Color::White),
        place(1, 0, Color::Black),
        place(0, 1, Color::Black),
        place(1, 2, Color::Black),
        place(2, 0, Color::White),
        place(3, 1, Color::White),
        place(2, 2, Color::White),
    ];
    for _ in 0..70_000 {
        moves.push(place(2, 1, Color::Black)); // captures (1,1)
        moves.push(place(1, 1, Color::White)); // recaptures (2,1)
    }

    let replayed = replay(9, &moves).unwrap();
    assert_eq!(replayed.captures, (u16::MAX, u16::MAX));
    assert_eq!(replayed.board.get(Coord::new(1, 1)), Some(Color::White));
    assert_eq!(replayed.board.get(Coord::new(2, 1)), None);
}

#[test]
fn prefix_replay_equals_board_before_the_suffix() {
    // Replaying a truncated prefix must equal the board as it stood then.
    let moves = vec![
        place(4, 4, Color::Black),
        place(16, 16, Color::White),
        place(4, 16, Color::Black),
        place(16, 4, Color::White),
        place(10, 10, Color::Black),
    ];

    let (board_after_four, _) = apply_incrementally(19, &moves[..4]);
    let replayed = replay(19, &moves[..4]).unwrap();
    assert_eq!(
        replayed.board.position_hash(),
        board_after_four.position_hash()
    );
    assert_eq!(replayed.board.stone_count(), 4);
}
