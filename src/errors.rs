//! Error types for the game session engine.
//!
//! Every engine failure is deterministic given the same inputs and state:
//! retrying a rejected request without changing it will fail the same way.
//! The single exception is [`EngineError::StoreUnavailable`], which wraps a
//! persistence fault and is the only kind a caller should retry with backoff.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Root error type for all session engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid stake: {0}")]
    InvalidStake(f64),

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("gameplay banned until {until}")]
    GameplayBanned { until: DateTime<Utc> },

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("session is owned by another player")]
    SessionNotOwned,

    #[error("session already settled")]
    SessionNotPending,

    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    #[error("cell {0} already revealed")]
    AlreadyRevealed(usize),

    #[error("player {0} not found")]
    PlayerNotFound(String),

    #[error("player {0} already registered")]
    PlayerExists(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<rocksdb::Error> for EngineError {
    fn from(e: rocksdb::Error) -> Self {
        EngineError::StoreUnavailable(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = EngineError::InsufficientFunds {
            required: 50.0,
            available: 10.0,
        };
        assert!(e.to_string().contains("need 50"));
        assert!(e.to_string().contains("have 10"));
    }

    #[test]
    fn test_already_revealed_carries_cell() {
        assert_eq!(
            EngineError::AlreadyRevealed(7).to_string(),
            "cell 7 already revealed"
        );
    }
}
