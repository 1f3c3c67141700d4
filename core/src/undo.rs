// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase undo negotiation
//!
//! A player requests undoing `k` trailing plies; the opponent accepts or
//! declines. At most one request may be pending per session. An accepted
//! request truncates the history and re-derives the board from the remaining
//! prefix; a rejected one changes nothing. A pending request is discarded
//! without effect if the game ends by any other path first.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Color;

/// Lifecycle of an undo request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UndoStatus {
    /// Waiting for the opponent's answer
    Pending,
    /// Opponent approved; history was truncated
    Accepted,
    /// Opponent declined; nothing changed
    Rejected,
}

/// An in-flight or resolved undo request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRequest {
    /// Who asked
    pub requester: Color,
    /// How many trailing plies to drop (normally 1, or 2 to also rewind a pass)
    pub count: usize,
    /// Where the negotiation stands
    pub status: UndoStatus,
}

/// Rejections of an undo request or answer, with no state change
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UndoError {
    /// The requested count is zero or exceeds the history length
    #[error("cannot undo {requested} of {available} plies")]
    InvalidCount {
        /// Plies the requester asked to drop
        requested: usize,
        /// Plies actually in the history
        available: usize,
    },

    /// Another request is already awaiting an answer
    #[error("an undo request is already pending")]
    AlreadyPending,

    /// There is no pending request to answer
    #[error("no undo request is pending")]
    NothingPending,

    /// Only the opponent of the requester may answer
    #[error("{0:?} cannot answer their own undo request")]
    NotOpponent(Color),

    /// The game has already ended
    #[error("game is already over")]
    GameOver,

    /// The truncated prefix did not replay cleanly (history corruption)
    #[error("undo failed to replay the truncated history: {0}")]
    ReplayFailed(String),
}

/// Validate a new request against the current history length and any pending
/// request. Pure; callers mutate session state only on `Ok`.
pub fn validate_request(
    count: usize,
    history_len: usize,
    pending: Option<&UndoRequest>,
) -> Result<(), UndoError> {
    if pending.is_some() {
        return Err(UndoError::AlreadyPending);
    }
    if count == 0 || count > history_len {
        return Err(UndoError::InvalidCount {
            requested: count,
            available: history_len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_oversized_counts() {
        assert!(matches!(
            validate_request(0, 5, None),
            Err(UndoError::InvalidCount { .. })
        ));
        assert!(matches!(
            validate_request(6, 5, None),
            Err(UndoError::InvalidCount {
                requested: 6,
                available: 5
            })
        ));
        assert!(validate_request(5, 5, None).is_ok());
    }

    #[test]
    fn rejects_duplicate_pending() {
        let pending = UndoRequest {
            requester: Color::Black,
            count: 1,
            status: UndoStatus::Pending,
        };
        assert_eq!(
            validate_request(1, 5, Some(&pending)),
            Err(UndoError::AlreadyPending)
        );
    }
}
