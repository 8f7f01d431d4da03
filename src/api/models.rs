//! API request/response models for the player surface.
//!
//! The game operations themselves use the engine's own request/response
//! types; these cover the collaborator boundary (registration, balance,
//! moderation) and history reporting.

use crate::ledger::PlayerAccount;
use crate::session::{GameKind, Session, SessionState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Registration boundary: creates the one-time ledger entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPlayerRequest {
    pub player_id: String,
    #[serde(default)]
    pub starting_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerResponse {
    pub player_id: String,
    pub balance: f64,
    pub total_wins: f64,
    pub total_losses: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banned_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PlayerAccount> for PlayerResponse {
    fn from(a: PlayerAccount) -> Self {
        Self {
            player_id: a.player_id,
            balance: a.balance,
            total_wins: a.total_wins,
            total_losses: a.total_losses,
            banned_until: a.banned_until,
            created_at: a.created_at,
        }
    }
}

/// Moderation boundary: set or clear a time-bounded gameplay ban.
#[derive(Debug, Clone, Deserialize)]
pub struct BanRequest {
    /// Expiry of the ban; omit to lift it.
    #[serde(default)]
    pub banned_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

/// Read-only session summary for history listings. Never exposes the
/// outcome commitment of a pending round.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub game: GameKind,
    pub stake: f64,
    pub win: f64,
    pub multiplier: f64,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionSummary {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            game: s.kind,
            stake: s.stake,
            win: s.payout,
            multiplier: s.multiplier,
            state: s.state,
            created_at: s.created_at,
            settled_at: s.settled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub sessions: Vec<SessionSummary>,
}
