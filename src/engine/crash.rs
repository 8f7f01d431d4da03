//! Crash game operations.
//!
//! One multiplier climbs until the pre-committed crash point; the player
//! cashes out before it or loses the stake. The crash point is drawn at
//! start and is authoritative: a cashout reporting a multiplier above it
//! is too late, whatever the client observed.

use crate::errors::{EngineError, EngineResult};
use crate::payout::{self, round2};
use crate::session::{GameKind, Outcome, Progress, Session, SessionState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GameEngine;

#[derive(Debug, Clone, Deserialize)]
pub struct CrashStartRequest {
    pub stake: f64,
    /// Optional target at which the round settles synchronously within
    /// the start call.
    #[serde(default)]
    pub auto_cashout: Option<f64>,
}

/// Result of an auto-cashout resolved inside `start`.
#[derive(Debug, Clone, Serialize)]
pub struct CrashAutoResult {
    pub cashed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crashed_at: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrashStartResponse {
    pub session_id: Uuid,
    pub balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_result: Option<CrashAutoResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrashCashoutRequest {
    pub session_id: Uuid,
    /// The multiplier the caller observed when cashing out.
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrashCashoutResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crashed_at: Option<f64>,
    pub balance: f64,
}

impl GameEngine {
    /// Start a crash round: draw the crash point, debit the stake, and if
    /// an auto-cashout target is set, settle before returning.
    pub fn start_crash(
        &self,
        player: &str,
        req: CrashStartRequest,
    ) -> EngineResult<CrashStartResponse> {
        // A zero target means no auto-cashout. The multiplier starts at
        // 1.0, so any other target below that (or a non-finite one) can
        // never be reached and is refused before the stake moves.
        let auto_cashout = match req.auto_cashout {
            Some(target) if target == 0.0 => None,
            Some(target) if !target.is_finite() || target < 1.0 => {
                return Err(EngineError::InvalidChoice(format!(
                    "auto-cashout target {} must be at least 1.0",
                    target
                )))
            }
            other => other,
        };

        let handle = self.store().player(player)?;
        let mut account = Self::lock(&handle)?;

        let mut acct = account.clone();
        Self::take_stake(&mut acct, req.stake)?;

        let crash_at = payout::crash_point(&mut rand::thread_rng());
        let mut session = Session::new(
            player,
            GameKind::Crash,
            req.stake,
            Outcome::Crash {
                crash_at,
                auto_cashout,
            },
            Progress::Crash,
        );

        // Auto-cashout settles within the start call. A target at or below
        // the crash point pays stake * target; the round's actual crash
        // point is never paid out, only the requested target.
        let auto_result = match auto_cashout {
            Some(target) if target <= crash_at => {
                let win = round2(req.stake * target);
                acct.record_win(req.stake, win);
                session.settle_won(target, win);
                Some(CrashAutoResult {
                    cashed_out: true,
                    multiplier: Some(target),
                    win: Some(win),
                    crashed_at: None,
                })
            }
            Some(_) => {
                acct.record_loss(req.stake);
                session.settle_lost(crash_at);
                Some(CrashAutoResult {
                    cashed_out: false,
                    multiplier: None,
                    win: None,
                    crashed_at: Some(crash_at),
                })
            }
            None => None,
        };

        let session_id = session.id;
        self.store().insert_session(session, &acct)?;
        *account = acct;

        tracing::info!(
            session = %session_id,
            player,
            stake = req.stake,
            auto = ?auto_cashout,
            "crash round started"
        );

        Ok(CrashStartResponse {
            session_id,
            balance: account.balance,
            auto_result,
        })
    }

    /// Cash a pending crash round out at the caller-observed multiplier.
    /// Observing past the crash point settles the round as lost.
    pub fn cashout_crash(
        &self,
        player: &str,
        req: CrashCashoutRequest,
    ) -> EngineResult<CrashCashoutResponse> {
        // A negative observed multiplier would settle as a "win" whose
        // payout debits the balance; settlements only ever credit.
        if !req.multiplier.is_finite() || req.multiplier < 0.0 {
            return Err(EngineError::InvalidChoice(
                "multiplier must be finite and non-negative".to_string(),
            ));
        }

        let slot = self.owned_slot(player, req.session_id)?;
        let handle = self.store().player(player)?;
        let mut account = Self::lock(&handle)?;
        let mut session = Self::lock(&slot.session)?;

        if session.state != SessionState::Pending {
            return Err(EngineError::SessionNotPending);
        }
        let crash_at = match session.outcome {
            Outcome::Crash { crash_at, .. } => crash_at,
            _ => {
                return Err(EngineError::InvalidChoice(
                    "session is not a crash round".to_string(),
                ))
            }
        };

        let working = session.clone();
        if req.multiplier > crash_at {
            self.commit_loss(&mut account, &mut session, working, crash_at)?;
            return Ok(CrashCashoutResponse {
                success: false,
                multiplier: None,
                win: None,
                crashed_at: Some(crash_at),
                balance: account.balance,
            });
        }

        let win = self.commit_win(&mut account, &mut session, working, req.multiplier)?;
        Ok(CrashCashoutResponse {
            success: true,
            multiplier: Some(req.multiplier),
            win: Some(win),
            crashed_at: None,
            balance: account.balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GameStore;
    use std::sync::Arc;

    fn engine_with_player(balance: f64) -> GameEngine {
        let store = Arc::new(GameStore::in_memory());
        store.register_player("alice", balance).unwrap();
        GameEngine::new(store)
    }

    #[test]
    fn test_start_debits_stake() {
        let engine = engine_with_player(100.0);
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 25.0,
                    auto_cashout: None,
                },
            )
            .unwrap();
        assert_eq!(resp.balance, 75.0);
        assert!(resp.auto_result.is_none());
    }

    #[test]
    fn test_start_rejects_bad_stakes() {
        let engine = engine_with_player(100.0);
        assert!(matches!(
            engine.start_crash(
                "alice",
                CrashStartRequest {
                    stake: 0.0,
                    auto_cashout: None
                }
            ),
            Err(EngineError::InvalidStake(_))
        ));
        assert!(matches!(
            engine.start_crash(
                "alice",
                CrashStartRequest {
                    stake: 500.0,
                    auto_cashout: None
                }
            ),
            Err(EngineError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_auto_cashout_settles_within_start() {
        // An auto target of 1.0 can never exceed the crash point, so the
        // round always settles as a win at exactly stake * 1.0.
        let engine = engine_with_player(100.0);
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 10.0,
                    auto_cashout: Some(1.0),
                },
            )
            .unwrap();
        let auto = resp.auto_result.unwrap();
        assert!(auto.cashed_out);
        assert_eq!(auto.win, Some(10.0));
        assert_eq!(resp.balance, 100.0);

        // Already terminal: a late cashout must fail and move no money.
        let err = engine
            .cashout_crash(
                "alice",
                CrashCashoutRequest {
                    session_id: resp.session_id,
                    multiplier: 1.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotPending));
    }

    #[test]
    fn test_cashout_past_crash_point_loses() {
        let engine = engine_with_player(100.0);
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 10.0,
                    auto_cashout: None,
                },
            )
            .unwrap();
        // The crash point is capped at 1000, so 1001 is always too late.
        let cashout = engine
            .cashout_crash(
                "alice",
                CrashCashoutRequest {
                    session_id: resp.session_id,
                    multiplier: 1001.0,
                },
            )
            .unwrap();
        assert!(!cashout.success);
        assert!(cashout.crashed_at.is_some());
        assert_eq!(cashout.balance, 90.0);

        let acct = engine.store().player_snapshot("alice").unwrap();
        assert_eq!(acct.total_losses, 10.0);
    }

    #[test]
    fn test_cashout_at_or_below_crash_point_wins() {
        let engine = engine_with_player(100.0);
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 10.0,
                    auto_cashout: None,
                },
            )
            .unwrap();
        // 1.0 is never above the crash point.
        let cashout = engine
            .cashout_crash(
                "alice",
                CrashCashoutRequest {
                    session_id: resp.session_id,
                    multiplier: 1.0,
                },
            )
            .unwrap();
        assert!(cashout.success);
        assert_eq!(cashout.win, Some(10.0));
        assert_eq!(cashout.balance, 100.0);
    }

    #[test]
    fn test_cashout_rejects_negative_and_non_finite_multipliers() {
        let engine = engine_with_player(100.0);
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 10.0,
                    auto_cashout: None,
                },
            )
            .unwrap();

        for bad in [-10.0, -0.01, f64::NEG_INFINITY, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                engine.cashout_crash(
                    "alice",
                    CrashCashoutRequest {
                        session_id: resp.session_id,
                        multiplier: bad,
                    },
                ),
                Err(EngineError::InvalidChoice(_))
            ));
        }

        // Nothing moved and the round is still live.
        assert_eq!(
            engine.store().player_snapshot("alice").unwrap().balance,
            90.0
        );
        let cashout = engine
            .cashout_crash(
                "alice",
                CrashCashoutRequest {
                    session_id: resp.session_id,
                    multiplier: 1.0,
                },
            )
            .unwrap();
        assert!(cashout.success);
        assert_eq!(cashout.balance, 100.0);
    }

    #[test]
    fn test_sub_one_cashout_pays_less_than_stake() {
        // Cashing out below 1.0x is a legal claim: the payout shrinks but
        // never goes negative, and total_wins carries the negative net.
        let engine = engine_with_player(100.0);
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 10.0,
                    auto_cashout: None,
                },
            )
            .unwrap();
        let cashout = engine
            .cashout_crash(
                "alice",
                CrashCashoutRequest {
                    session_id: resp.session_id,
                    multiplier: 0.5,
                },
            )
            .unwrap();
        assert!(cashout.success);
        assert_eq!(cashout.win, Some(5.0));
        assert_eq!(cashout.balance, 95.0);

        let acct = engine.store().player_snapshot("alice").unwrap();
        assert_eq!(acct.total_wins, -5.0);
    }

    #[test]
    fn test_start_rejects_bad_auto_targets_before_debit() {
        let engine = engine_with_player(100.0);
        for bad in [-5.0, 0.5, 0.99, f64::NEG_INFINITY, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                engine.start_crash(
                    "alice",
                    CrashStartRequest {
                        stake: 10.0,
                        auto_cashout: Some(bad),
                    },
                ),
                Err(EngineError::InvalidChoice(_))
            ));
        }
        assert_eq!(
            engine.store().player_snapshot("alice").unwrap().balance,
            100.0
        );
    }

    #[test]
    fn test_zero_auto_target_means_no_auto_cashout() {
        let engine = engine_with_player(100.0);
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 10.0,
                    auto_cashout: Some(0.0),
                },
            )
            .unwrap();
        assert!(resp.auto_result.is_none());
        assert_eq!(resp.balance, 90.0);

        // The round is live and cashes out normally.
        let cashout = engine
            .cashout_crash(
                "alice",
                CrashCashoutRequest {
                    session_id: resp.session_id,
                    multiplier: 1.0,
                },
            )
            .unwrap();
        assert!(cashout.success);
    }

    #[test]
    fn test_cashout_requires_ownership() {
        let engine = engine_with_player(100.0);
        engine.store().register_player("mallory", 50.0).unwrap();
        let resp = engine
            .start_crash(
                "alice",
                CrashStartRequest {
                    stake: 10.0,
                    auto_cashout: None,
                },
            )
            .unwrap();
        let err = engine
            .cashout_crash(
                "mallory",
                CrashCashoutRequest {
                    session_id: resp.session_id,
                    multiplier: 1.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotOwned));
    }
}
