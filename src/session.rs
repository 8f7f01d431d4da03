//! Session records: one played round of one game.
//!
//! A session carries its full outcome from the moment it is created. The
//! outcome is drawn before the stake leaves the player's balance and is
//! never regenerated; progress calls only reveal prefixes of it. Once a
//! session reaches `Won` or `Lost` it accepts no further mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Supported game kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Crash,
    Mines,
    Towers,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Crash => write!(f, "crash"),
            GameKind::Mines => write!(f, "mines"),
            GameKind::Towers => write!(f, "towers"),
        }
    }
}

/// Session lifecycle state. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Pending,
    Won,
    Lost,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self != SessionState::Pending
    }
}

/// The pre-committed outcome of a round, immutable once created.
///
/// One variant per game kind so the engine can match exhaustively instead
/// of probing a free-form blob for fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum Outcome {
    Crash {
        crash_at: f64,
        auto_cashout: Option<f64>,
    },
    Mines {
        /// `true` marks a mine.
        board: Vec<bool>,
        mines: usize,
    },
    Towers {
        /// Per-tier slot layout, `true` marks the bad slot.
        boards: Vec<Vec<bool>>,
        ladder: Vec<f64>,
    },
}

/// Mutable per-game progress: the prefix of the outcome revealed so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum Progress {
    Crash,
    Mines { revealed: Vec<usize> },
    Towers { level: usize },
}

/// One played round of one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub owner: String,
    pub kind: GameKind,
    pub stake: f64,
    pub outcome: Outcome,
    pub progress: Progress,
    /// Current multiplier; non-decreasing while the session is pending.
    pub multiplier: f64,
    pub state: SessionState,
    /// Populated on the transition to `Won`, zero otherwise.
    pub payout: f64,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(owner: &str, kind: GameKind, stake: f64, outcome: Outcome, progress: Progress) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            kind,
            stake,
            outcome,
            progress,
            multiplier: 1.0,
            state: SessionState::Pending,
            payout: 0.0,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Terminal win transition. The caller credits the ledger in the same
    /// atomic step.
    pub fn settle_won(&mut self, multiplier: f64, payout: f64) {
        self.multiplier = multiplier;
        self.payout = payout;
        self.state = SessionState::Won;
        self.settled_at = Some(Utc::now());
    }

    /// Terminal loss transition; the stake stays with the house.
    pub fn settle_lost(&mut self, multiplier: f64) {
        self.multiplier = multiplier;
        self.state = SessionState::Lost;
        self.settled_at = Some(Utc::now());
    }
}
