//! Mines game operations.
//!
//! The full mine layout is committed at start. Reveals walk safe cells one
//! at a time, compounding the multiplier; hitting a mine forfeits the
//! stake and discloses the whole board. Cashing out requires at least one
//! revealed cell.

use crate::errors::{EngineError, EngineResult};
use crate::payout::{self, GRID_CELLS};
use crate::session::{GameKind, Outcome, Progress, Session, SessionState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GameEngine;

fn default_mines() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinesStartRequest {
    pub stake: f64,
    #[serde(default = "default_mines")]
    pub mines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MinesStartResponse {
    pub session_id: Uuid,
    pub mines: usize,
    pub balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinesRevealRequest {
    pub session_id: Uuid,
    pub cell: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MinesRevealResponse {
    pub hit_mine: bool,
    pub cell: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    /// Full layout, disclosed only when the round is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<bool>>,
    pub balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinesCashoutRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct MinesCashoutResponse {
    pub multiplier: f64,
    pub win: f64,
    pub balance: f64,
    pub board: Vec<bool>,
}

impl GameEngine {
    /// Start a mines round: lay out the board, debit the stake.
    pub fn start_mines(
        &self,
        player: &str,
        req: MinesStartRequest,
    ) -> EngineResult<MinesStartResponse> {
        if req.mines < 1 || req.mines >= GRID_CELLS {
            return Err(EngineError::InvalidChoice(format!(
                "mine count must be between 1 and {}",
                GRID_CELLS - 1
            )));
        }

        let handle = self.store().player(player)?;
        let mut account = Self::lock(&handle)?;

        let mut acct = account.clone();
        Self::take_stake(&mut acct, req.stake)?;

        let board = payout::mine_board(&mut rand::thread_rng(), GRID_CELLS, req.mines);
        let session = Session::new(
            player,
            GameKind::Mines,
            req.stake,
            Outcome::Mines {
                board,
                mines: req.mines,
            },
            Progress::Mines { revealed: vec![] },
        );

        let session_id = session.id;
        self.store().insert_session(session, &acct)?;
        *account = acct;

        tracing::info!(
            session = %session_id,
            player,
            stake = req.stake,
            mines = req.mines,
            "mines round started"
        );

        Ok(MinesStartResponse {
            session_id,
            mines: req.mines,
            balance: account.balance,
        })
    }

    /// Reveal one cell of a pending mines round.
    pub fn reveal_mines(
        &self,
        player: &str,
        req: MinesRevealRequest,
    ) -> EngineResult<MinesRevealResponse> {
        let slot = self.owned_slot(player, req.session_id)?;
        let handle = self.store().player(player)?;
        let mut account = Self::lock(&handle)?;
        let mut session = Self::lock(&slot.session)?;

        if session.state != SessionState::Pending {
            return Err(EngineError::SessionNotPending);
        }
        let (board, mines) = match &session.outcome {
            Outcome::Mines { board, mines } => (board.clone(), *mines),
            _ => {
                return Err(EngineError::InvalidChoice(
                    "session is not a mines round".to_string(),
                ))
            }
        };
        if req.cell >= board.len() {
            return Err(EngineError::InvalidChoice(format!(
                "cell {} is outside the board",
                req.cell
            )));
        }

        let mut working = session.clone();
        let revealed_count = match &mut working.progress {
            Progress::Mines { revealed } => {
                if revealed.contains(&req.cell) {
                    return Err(EngineError::AlreadyRevealed(req.cell));
                }
                revealed.push(req.cell);
                revealed.len()
            }
            _ => {
                return Err(EngineError::InvalidChoice(
                    "session is not a mines round".to_string(),
                ))
            }
        };

        if board[req.cell] {
            // Mine hit: the multiplier freezes where it was and the full
            // layout is disclosed.
            let multiplier = working.multiplier;
            self.commit_loss(&mut account, &mut session, working, multiplier)?;
            return Ok(MinesRevealResponse {
                hit_mine: true,
                cell: req.cell,
                revealed_count: None,
                multiplier: None,
                board: Some(board),
                balance: account.balance,
            });
        }

        let multiplier = payout::grid_multiplier(revealed_count, mines, board.len());
        working.multiplier = multiplier;
        self.commit_progress(&mut session, working)?;

        Ok(MinesRevealResponse {
            hit_mine: false,
            cell: req.cell,
            revealed_count: Some(revealed_count),
            multiplier: Some(multiplier),
            board: None,
            balance: account.balance,
        })
    }

    /// Cash a pending mines round out at the current multiplier. Requires
    /// at least one revealed cell: no payout without a step into risk.
    pub fn cashout_mines(
        &self,
        player: &str,
        req: MinesCashoutRequest,
    ) -> EngineResult<MinesCashoutResponse> {
        let slot = self.owned_slot(player, req.session_id)?;
        let handle = self.store().player(player)?;
        let mut account = Self::lock(&handle)?;
        let mut session = Self::lock(&slot.session)?;

        if session.state != SessionState::Pending {
            return Err(EngineError::SessionNotPending);
        }
        let board = match &session.outcome {
            Outcome::Mines { board, .. } => board.clone(),
            _ => {
                return Err(EngineError::InvalidChoice(
                    "session is not a mines round".to_string(),
                ))
            }
        };
        match &session.progress {
            Progress::Mines { revealed } if revealed.is_empty() => {
                return Err(EngineError::InvalidChoice(
                    "reveal at least one cell before cashing out".to_string(),
                ));
            }
            Progress::Mines { .. } => {}
            _ => {
                return Err(EngineError::InvalidChoice(
                    "session is not a mines round".to_string(),
                ))
            }
        }

        let working = session.clone();
        let multiplier = working.multiplier;
        let win = self.commit_win(&mut account, &mut session, working, multiplier)?;

        Ok(MinesCashoutResponse {
            multiplier,
            win,
            balance: account.balance,
            board,
        })
    }
}
