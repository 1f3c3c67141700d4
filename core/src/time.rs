// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-player time control
//!
//! Two regimes are supported. "Even" games grant an absolute main time that
//! flows into byo-yomi overtime once exhausted. Blitz games re-grant a fixed
//! per-move allotment every turn and never use byo-yomi.
//!
//! The clock state machine is independent of board state and is driven by
//! turn-change events: the session reports the elapsed think time of the
//! player who just moved (or whose deadline expired) and receives an explicit
//! [`ClockOutcome`] back. Timeouts are values, not callbacks.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Color, GameResult};

/// Minimum per-move allotment for blitz games, in seconds
pub const BLITZ_MIN_TIME_PER_MOVE: u32 = 5;

/// Regime classification for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    /// Fixed allotment per move, no main time, no byo-yomi
    Blitz,
    /// Absolute main time followed by byo-yomi overtime
    Even,
}

/// Time-control configuration for one session, shared by both players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSettings {
    /// Regime this configuration describes
    pub game_type: GameType,
    /// Absolute main time in seconds (even games)
    pub main_time_secs: u32,
    /// Whether byo-yomi overtime is enabled
    pub byo_yomi_enabled: bool,
    /// Number of byo-yomi periods granted after main time
    pub byo_yomi_periods: u32,
    /// Length of one byo-yomi period in seconds
    pub byo_yomi_time_secs: u32,
    /// Per-move allotment in seconds (blitz games; 0 for even games)
    pub time_per_move_secs: u32,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            game_type: GameType::Even,
            main_time_secs: 1800,
            byo_yomi_enabled: true,
            byo_yomi_periods: 3,
            byo_yomi_time_secs: 30,
            time_per_move_secs: 0,
        }
    }
}

impl TimeSettings {
    /// A valid blitz configuration with the given per-move allotment
    pub fn blitz(time_per_move_secs: u32) -> Self {
        Self {
            game_type: GameType::Blitz,
            main_time_secs: 0,
            byo_yomi_enabled: false,
            byo_yomi_periods: 0,
            byo_yomi_time_secs: 0,
            time_per_move_secs,
        }
    }

    /// Length of one byo-yomi period
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.byo_yomi_time_secs as u64)
    }
}

/// Structured validation verdict, returned instead of raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the configuration passed
    pub valid: bool,
    /// Human-readable reason when it did not
    pub error: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn fail(msg: &str) -> Self {
        Self {
            valid: false,
            error: Some(msg.to_string()),
        }
    }
}

/// Validate a blitz configuration.
///
/// Non-blitz configurations always pass. Blitz games may not carry any
/// byo-yomi fields and require at least five seconds per move.
pub fn validate_blitz_settings(settings: &TimeSettings) -> Validation {
    if settings.game_type != GameType::Blitz {
        return Validation::ok();
    }

    if settings.byo_yomi_enabled || settings.byo_yomi_periods > 0 || settings.byo_yomi_time_secs > 0
    {
        return Validation::fail("Byo-yomi is not allowed in Blitz games");
    }

    if settings.time_per_move_secs < BLITZ_MIN_TIME_PER_MOVE {
        return Validation::fail("Blitz games require at least 5 seconds per move");
    }

    Validation::ok()
}

/// Validate only the per-move allotment; `{valid}`-shaped verdict.
pub fn validate_time_per_move(settings: &TimeSettings) -> Validation {
    if settings.game_type == GameType::Blitz
        && settings.time_per_move_secs < BLITZ_MIN_TIME_PER_MOVE
    {
        return Validation {
            valid: false,
            error: None,
        };
    }
    Validation::ok()
}

/// Correction routine for invalid blitz configurations.
///
/// Clamps the per-move allotment to the blitz floor and zeroes every field
/// that has no meaning in blitz. Non-blitz configurations are left untouched.
pub fn update_blitz_time_controls(settings: &mut TimeSettings) {
    if settings.game_type != GameType::Blitz {
        return;
    }

    if settings.time_per_move_secs < BLITZ_MIN_TIME_PER_MOVE {
        settings.time_per_move_secs = BLITZ_MIN_TIME_PER_MOVE;
    }
    settings.main_time_secs = 0;
    settings.byo_yomi_enabled = false;
    settings.byo_yomi_periods = 0;
    settings.byo_yomi_time_secs = 0;
}

/// Classify the regime from the per-move field alone
pub fn detect_game_type_from_time(time_per_move_secs: u32) -> GameType {
    if time_per_move_secs > 0 {
        GameType::Blitz
    } else {
        GameType::Even
    }
}

/// Normalize an arbitrary configuration: reclassify the regime from the
/// per-move field, then apply the blitz correction when applicable.
pub fn update_time_controls(settings: &mut TimeSettings) {
    settings.game_type = detect_game_type_from_time(settings.time_per_move_secs);
    update_blitz_time_controls(settings);
}

/// Outcome of charging elapsed think time to a clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOutcome {
    /// Main (or blitz per-move) time simply decreased
    Running,
    /// Main time ran out; the player is now in byo-yomi with a fresh period
    EnteredByoYomi,
    /// The move fit inside the current period; the period resets in full
    PeriodHeld,
    /// The move overran the current period; one period was consumed
    PeriodConsumed,
    /// The clock is exhausted; the game ends with this result
    Timeout(GameResult),
}

impl ClockOutcome {
    /// The terminal result, if this outcome ends the game
    pub fn timeout(&self) -> Option<GameResult> {
        match self {
            ClockOutcome::Timeout(result) => Some(*result),
            _ => None,
        }
    }
}

/// Mutable clock state for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerClock {
    /// Whose clock this is
    pub color: Color,
    /// Main time left (even) or current per-move allotment (blitz)
    pub time_remaining: Duration,
    /// Whether main time is exhausted and overtime is running
    pub is_in_byo_yomi: bool,
    /// Byo-yomi periods still available; reaching 0 while over time is terminal
    pub byo_yomi_periods_left: u32,
    /// Time left in the current byo-yomi period
    pub byo_yomi_time_left: Duration,
    /// When the current move started, if a move is in flight
    pub last_move_time: Option<DateTime<Utc>>,
}

impl PlayerClock {
    /// Fresh clock for the given settings
    pub fn new(color: Color, settings: &TimeSettings) -> Self {
        match settings.game_type {
            GameType::Blitz => Self {
                color,
                time_remaining: Duration::from_secs(settings.time_per_move_secs as u64),
                is_in_byo_yomi: false,
                byo_yomi_periods_left: 0,
                byo_yomi_time_left: Duration::ZERO,
                last_move_time: None,
            },
            GameType::Even => Self {
                color,
                time_remaining: Duration::from_secs(settings.main_time_secs as u64),
                is_in_byo_yomi: false,
                byo_yomi_periods_left: if settings.byo_yomi_enabled {
                    settings.byo_yomi_periods
                } else {
                    0
                },
                byo_yomi_time_left: settings.period(),
                last_move_time: None,
            },
        }
    }

    /// Total wall-clock budget before this clock is exhausted.
    ///
    /// Used to schedule the session's timeout deadline.
    pub fn total_budget(&self, settings: &TimeSettings) -> Duration {
        match settings.game_type {
            GameType::Blitz => self.time_remaining,
            GameType::Even => {
                if self.is_in_byo_yomi {
                    let extra = self.byo_yomi_periods_left.saturating_sub(1);
                    self.byo_yomi_time_left + settings.period() * extra
                } else {
                    self.time_remaining + settings.period() * self.byo_yomi_periods_left
                }
            }
        }
    }

    /// Exhaust the clock unconditionally. Called when the session's deadline
    /// passes without a move; returns the terminal result.
    pub fn force_timeout(&mut self) -> GameResult {
        self.time_remaining = Duration::ZERO;
        self.byo_yomi_time_left = Duration::ZERO;
        if self.byo_yomi_periods_left > 0 {
            self.is_in_byo_yomi = true;
            self.byo_yomi_periods_left = 0;
        }
        GameResult::TimeLoss {
            winner: self.color.opposite(),
        }
    }
}

/// Charge the wall-clock time since `move_start` to the player's clock.
pub fn track_move_time(
    clock: &mut PlayerClock,
    move_start: DateTime<Utc>,
    settings: &TimeSettings,
) -> ClockOutcome {
    let elapsed = (Utc::now() - move_start).to_std().unwrap_or(Duration::ZERO);
    apply_elapsed(clock, elapsed, settings)
}

/// Charge a known elapsed duration to the player's clock.
///
/// Main-time overshoot transitions into byo-yomi with a full fresh period;
/// the overshoot itself is discarded. Once in byo-yomi, period accounting is
/// delegated to [`handle_byo_yomi_move`].
pub fn apply_elapsed(
    clock: &mut PlayerClock,
    elapsed: Duration,
    settings: &TimeSettings,
) -> ClockOutcome {
    if settings.game_type == GameType::Blitz {
        if elapsed > clock.time_remaining {
            return ClockOutcome::Timeout(clock.force_timeout());
        }
        // Allotment is re-granted in full every turn.
        clock.time_remaining = Duration::from_secs(settings.time_per_move_secs as u64);
        return ClockOutcome::Running;
    }

    if clock.is_in_byo_yomi {
        return handle_byo_yomi_move(elapsed, clock, settings);
    }

    if elapsed >= clock.time_remaining {
        clock.time_remaining = Duration::ZERO;
        if settings.byo_yomi_enabled && clock.byo_yomi_periods_left > 0 {
            clock.is_in_byo_yomi = true;
            clock.byo_yomi_time_left = settings.period();
            tracing::debug!(color = ?clock.color, "main time exhausted, entering byo-yomi");
            ClockOutcome::EnteredByoYomi
        } else {
            ClockOutcome::Timeout(clock.force_timeout())
        }
    } else {
        clock.time_remaining -= elapsed;
        ClockOutcome::Running
    }
}

/// Byo-yomi period accounting for a single move.
///
/// A move that fits inside the current period preserves it: the period resets
/// to its full length and no period is consumed (time banking, not
/// accumulation). Overrunning the period consumes exactly one; consuming the
/// last period ends the game with the opponent winning on time.
pub fn handle_byo_yomi_move(
    time_spent: Duration,
    clock: &mut PlayerClock,
    settings: &TimeSettings,
) -> ClockOutcome {
    let period = settings.period();

    if time_spent <= clock.byo_yomi_time_left {
        clock.byo_yomi_time_left = period;
        return ClockOutcome::PeriodHeld;
    }

    clock.byo_yomi_periods_left = clock.byo_yomi_periods_left.saturating_sub(1);
    clock.byo_yomi_time_left = period;

    if clock.byo_yomi_periods_left == 0 {
        tracing::info!(color = ?clock.color, "last byo-yomi period consumed");
        return ClockOutcome::Timeout(GameResult::TimeLoss {
            winner: clock.color.opposite(),
        });
    }

    ClockOutcome::PeriodConsumed
}
