//! Towers game operations.
//!
//! Every tier's layout and the whole multiplier ladder are committed at
//! start. Each pick either climbs one tier or ends the round; clearing the
//! final tier settles as a win at the top-of-ladder multiplier. There is
//! no cashout: a round ends only by a bad pick or by completion.

use crate::errors::{EngineError, EngineResult};
use crate::payout::{self, MAX_TIERS, MIN_TIERS, TIER_SLOTS};
use crate::session::{GameKind, Outcome, Progress, Session, SessionState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GameEngine;

fn default_levels() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct TowersStartRequest {
    pub stake: f64,
    /// Requested tier count, clamped to the supported range.
    #[serde(default = "default_levels")]
    pub levels: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TowersStartResponse {
    pub session_id: Uuid,
    pub levels: usize,
    pub slots: usize,
    pub ladder: Vec<f64>,
    pub level: usize,
    pub balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TowersPickRequest {
    pub session_id: Uuid,
    pub slot: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TowersPickResponse {
    pub bad_slot: bool,
    pub slot: usize,
    /// The picked tier's layout, disclosed only on a bad pick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_board: Option<Vec<bool>>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win: Option<f64>,
    pub balance: f64,
}

impl GameEngine {
    /// Start a towers round: pre-generate every tier's board plus the
    /// ladder, debit the stake.
    pub fn start_towers(
        &self,
        player: &str,
        req: TowersStartRequest,
    ) -> EngineResult<TowersStartResponse> {
        let handle = self.store().player(player)?;
        let mut account = Self::lock(&handle)?;

        let mut acct = account.clone();
        Self::take_stake(&mut acct, req.stake)?;

        let levels = req.levels.clamp(MIN_TIERS, MAX_TIERS);
        let ladder = payout::tier_ladder(levels);
        let boards = payout::tier_boards(&mut rand::thread_rng(), levels);
        let session = Session::new(
            player,
            GameKind::Towers,
            req.stake,
            Outcome::Towers {
                boards,
                ladder: ladder.clone(),
            },
            Progress::Towers { level: 0 },
        );

        let session_id = session.id;
        self.store().insert_session(session, &acct)?;
        *account = acct;

        tracing::info!(
            session = %session_id,
            player,
            stake = req.stake,
            levels,
            "towers round started"
        );

        Ok(TowersStartResponse {
            session_id,
            levels,
            slots: TIER_SLOTS,
            ladder,
            level: 0,
            balance: account.balance,
        })
    }

    /// Pick one slot on the current tier of a pending towers round.
    pub fn pick_towers(
        &self,
        player: &str,
        req: TowersPickRequest,
    ) -> EngineResult<TowersPickResponse> {
        if req.slot >= TIER_SLOTS {
            return Err(EngineError::InvalidChoice(format!(
                "slot {} is outside the tier",
                req.slot
            )));
        }

        let slot = self.owned_slot(player, req.session_id)?;
        let handle = self.store().player(player)?;
        let mut account = Self::lock(&handle)?;
        let mut session = Self::lock(&slot.session)?;

        if session.state != SessionState::Pending {
            return Err(EngineError::SessionNotPending);
        }
        let (boards, ladder) = match &session.outcome {
            Outcome::Towers { boards, ladder } => (boards.clone(), ladder.clone()),
            _ => {
                return Err(EngineError::InvalidChoice(
                    "session is not a towers round".to_string(),
                ))
            }
        };
        let level = match session.progress {
            Progress::Towers { level } => level,
            _ => {
                return Err(EngineError::InvalidChoice(
                    "session is not a towers round".to_string(),
                ))
            }
        };

        let tier_board = boards[level].clone();
        let mut working = session.clone();

        if tier_board[req.slot] {
            let multiplier = working.multiplier;
            self.commit_loss(&mut account, &mut session, working, multiplier)?;
            return Ok(TowersPickResponse {
                bad_slot: true,
                slot: req.slot,
                tier_board: Some(tier_board),
                completed: false,
                level: None,
                multiplier: None,
                next_multiplier: None,
                win: None,
                balance: account.balance,
            });
        }

        let new_level = level + 1;
        let multiplier = ladder[level];
        working.progress = Progress::Towers { level: new_level };
        working.multiplier = multiplier;

        if new_level >= boards.len() {
            // Final tier cleared: the round settles itself, no cashout step.
            let win = self.commit_win(&mut account, &mut session, working, multiplier)?;
            return Ok(TowersPickResponse {
                bad_slot: false,
                slot: req.slot,
                tier_board: None,
                completed: true,
                level: Some(new_level),
                multiplier: Some(multiplier),
                next_multiplier: None,
                win: Some(win),
                balance: account.balance,
            });
        }

        self.commit_progress(&mut session, working)?;
        Ok(TowersPickResponse {
            bad_slot: false,
            slot: req.slot,
            tier_board: None,
            completed: false,
            level: Some(new_level),
            multiplier: Some(multiplier),
            next_multiplier: Some(ladder[new_level]),
            win: None,
            balance: account.balance,
        })
    }
}
