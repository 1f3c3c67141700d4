// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use chrono::Utc;
use goban_core::game::{GameSession, Player, UndoDecision};
use goban_core::time::TimeSettings;
use goban_core::undo::UndoError;
use goban_core::{Color, Coord, MoveInput};

fn session(board_size: u8) -> GameSession {
    GameSession::new(
        "undo-test".to_string(),
        board_size,
        [Player::human(Color::Black), Player::human(Color::White)],
        TimeSettings::default(),
    )
    .unwrap()
}

fn play(s: &mut GameSession, color: Color, x: u8, y: u8) {
    s.play_move(color, &MoveInput::place(x, y), Utc::now(), Duration::ZERO)
        .unwrap();
}

fn pass(s: &mut GameSession, color: Color) {
    s.play_move(color, &MoveInput::pass(), Utc::now(), Duration::ZERO)
        .unwrap();
}

/// Regression: undoing one move must remove exactly that move, not wipe the
/// board.
#[test]
fn accepted_undo_removes_exactly_the_trailing_move() {
    let mut s = session(19);
    play(&mut s, Color::Black, 4, 4);
    play(&mut s, Color::White, 16, 16);
    play(&mut s, Color::Black, 4, 16);
    play(&mut s, Color::White, 16, 4);
    play(&mut s, Color::Black, 10, 10);

    s.request_undo(Color::Black, 1).unwrap();
    let decision = s.respond_undo(Color::White, true).unwrap();
    assert!(matches!(decision, UndoDecision::Accepted { .. }));

    assert_eq!(s.history().len(), 4);
    let stones: Vec<Coord> = s.board().stones().iter().map(|st| st.coord).collect();
    assert_eq!(stones.len(), 4);
    for expected in [
        Coord::new(4, 4),
        Coord::new(16, 16),
        Coord::new(4, 16),
        Coord::new(16, 4),
    ] {
        assert!(stones.contains(&expected), "missing stone at {expected:?}");
    }
    assert_eq!(s.current_player(), Color::Black);
}

#[test]
fn undo_restores_stones_that_were_captured_after_the_cut() {
    // White's corner stone is captured at ply 3; undoing that capture must
    // bring the stone back.
    let mut s = session(9);
    play(&mut s, Color::Black, 1, 0);
    play(&mut s, Color::White, 0, 0);
    play(&mut s, Color::Black, 0, 1); // captures (0,0)
    assert_eq!(s.board().get(Coord::new(0, 0)), None);

    s.request_undo(Color::Black, 1).unwrap();
    s.respond_undo(Color::White, true).unwrap();

    assert_eq!(s.history().len(), 2);
    assert_eq!(s.board().get(Coord::new(0, 0)), Some(Color::White));
    assert_eq!(s.board().get(Coord::new(0, 1)), None);
    assert_eq!(s.current_player(), Color::Black);
}

#[test]
fn undoing_two_plies_rewinds_a_pass_as_well() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);
    pass(&mut s, Color::White);
    play(&mut s, Color::Black, 2, 2);

    // White wants its pass back too: undo Black's move and the pass.
    s.request_undo(Color::White, 2).unwrap();
    s.respond_undo(Color::Black, true).unwrap();

    assert_eq!(s.history().len(), 1);
    assert_eq!(s.current_player(), Color::White);
    assert_eq!(s.board().stone_count(), 1);
}

#[test]
fn invalid_counts_are_rejected_without_state_change() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);

    assert!(matches!(
        s.request_undo(Color::Black, 0),
        Err(UndoError::InvalidCount {
            requested: 0,
            available: 1
        })
    ));
    assert!(matches!(
        s.request_undo(Color::Black, 2),
        Err(UndoError::InvalidCount { .. })
    ));
    assert!(s.pending_undo().is_none());
    assert_eq!(s.history().len(), 1);
}

#[test]
fn only_one_request_may_be_pending() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);
    play(&mut s, Color::White, 5, 5);

    s.request_undo(Color::Black, 1).unwrap();
    assert_eq!(
        s.request_undo(Color::White, 1),
        Err(UndoError::AlreadyPending)
    );
}

#[test]
fn requester_cannot_answer_their_own_request() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);

    s.request_undo(Color::Black, 1).unwrap();
    assert_eq!(
        s.respond_undo(Color::Black, true),
        Err(UndoError::NotOpponent(Color::Black))
    );
    // Still pending; the opponent can then reject it.
    let decision = s.respond_undo(Color::White, false).unwrap();
    assert!(matches!(decision, UndoDecision::Rejected { .. }));
}

#[test]
fn rejection_changes_nothing() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);
    play(&mut s, Color::White, 5, 5);
    let before = s.snapshot();

    s.request_undo(Color::White, 1).unwrap();
    s.respond_undo(Color::Black, false).unwrap();

    let after = s.snapshot();
    assert_eq!(before.history, after.history);
    assert_eq!(before.board, after.board);
    assert_eq!(before.current_player, after.current_player);
    assert!(s.pending_undo().is_none());
}

#[test]
fn answering_without_a_pending_request_fails() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);
    assert_eq!(
        s.respond_undo(Color::White, true),
        Err(UndoError::NothingPending)
    );
}

#[test]
fn undo_after_game_end_is_rejected() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);
    s.resign(Color::White).unwrap();

    assert_eq!(s.request_undo(Color::Black, 1), Err(UndoError::GameOver));
}

#[test]
fn full_history_undo_yields_an_empty_board() {
    let mut s = session(9);
    play(&mut s, Color::Black, 4, 4);
    play(&mut s, Color::White, 5, 5);

    s.request_undo(Color::White, 2).unwrap();
    s.respond_undo(Color::Black, true).unwrap();

    assert_eq!(s.history().len(), 0);
    assert_eq!(s.board().stone_count(), 0);
    assert_eq!(s.current_player(), Color::Black);
}
