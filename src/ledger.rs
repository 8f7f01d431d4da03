//! Per-player balance ledger.
//!
//! The spendable balance is mutated in exactly two places: a stake debit at
//! session creation and a payout credit at settlement. `total_wins` and
//! `total_losses` are lifetime net counters kept for reporting; they are
//! never consulted when deciding whether a bet may proceed.

use crate::errors::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ledger entry for one player, created once at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAccount {
    pub player_id: String,
    pub balance: f64,
    /// Lifetime net profit credited across winning settlements.
    pub total_wins: f64,
    /// Lifetime stakes forfeited across losing settlements.
    pub total_losses: f64,
    /// Gameplay ban expiry set by the moderation collaborator; the engine
    /// only reads it.
    pub banned_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PlayerAccount {
    pub fn new(player_id: &str, balance: f64) -> Self {
        Self {
            player_id: player_id.to_string(),
            balance,
            total_wins: 0.0,
            total_losses: 0.0,
            banned_until: None,
            created_at: Utc::now(),
        }
    }

    /// Remove `amount` from the spendable balance, refusing to go negative.
    pub fn debit(&mut self, amount: f64) -> EngineResult<()> {
        if amount > self.balance {
            return Err(EngineError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add `amount` to the spendable balance. No upper bound.
    pub fn credit(&mut self, amount: f64) {
        self.balance += amount;
    }

    /// Record a winning settlement: credit the payout and move the net
    /// result (payout minus stake, possibly negative) into `total_wins`.
    pub fn record_win(&mut self, stake: f64, payout: f64) {
        self.credit(payout);
        self.total_wins += payout - stake;
    }

    /// Record a losing settlement. The stake was already debited at start.
    pub fn record_loss(&mut self, stake: f64) {
        self.total_losses += stake;
    }

    /// Reject play while a gameplay ban is active.
    pub fn ensure_playable(&self, now: DateTime<Utc>) -> EngineResult<()> {
        if let Some(until) = self.banned_until {
            if until > now {
                return Err(EngineError::GameplayBanned { until });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_debit_rejects_overdraft() {
        let mut acct = PlayerAccount::new("alice", 100.0);
        assert!(acct.debit(100.0).is_ok());
        assert_eq!(acct.balance, 0.0);
        assert!(matches!(
            acct.debit(0.01),
            Err(EngineError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_record_win_can_carry_negative_net() {
        // Cashing out below 1.0x credits less than the stake; the lifetime
        // aggregate stays a true net-profit counter.
        let mut acct = PlayerAccount::new("bob", 100.0);
        acct.debit(10.0).unwrap();
        acct.record_win(10.0, 8.0);
        assert_eq!(acct.balance, 98.0);
        assert_eq!(acct.total_wins, -2.0);
    }

    #[test]
    fn test_ban_window() {
        let mut acct = PlayerAccount::new("carol", 50.0);
        let now = Utc::now();
        assert!(acct.ensure_playable(now).is_ok());

        acct.banned_until = Some(now + Duration::hours(1));
        assert!(matches!(
            acct.ensure_playable(now),
            Err(EngineError::GameplayBanned { .. })
        ));

        acct.banned_until = Some(now - Duration::hours(1));
        assert!(acct.ensure_playable(now).is_ok());
    }
}
