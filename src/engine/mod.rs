//! Session engine: one lifecycle, three game families.
//!
//! Every operation follows the same shape: acquire the player lock, then
//! the session lock (always in that order), validate against the current
//! state, apply the change to working copies, persist, and only then
//! publish the copies back through the guards. A failed persist leaves the
//! in-memory state untouched, so the hot maps never run ahead of the
//! durable records.
//!
//! Outcomes are drawn exactly once, inside `start`, while the player lock
//! is held. Progress and cashout never touch the random source.

pub mod crash;
pub mod mines;
pub mod towers;

use crate::errors::{EngineError, EngineResult};
use crate::ledger::PlayerAccount;
use crate::payout::round2;
use crate::session::Session;
use crate::store::{GameStore, SessionSlot};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Orchestrates the lifecycle of game sessions against a shared store.
pub struct GameEngine {
    store: Arc<GameStore>,
}

impl GameEngine {
    pub fn new(store: Arc<GameStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<GameStore> {
        &self.store
    }

    pub(crate) fn lock<'a, T>(m: &'a Mutex<T>) -> EngineResult<MutexGuard<'a, T>> {
        m.lock()
            .map_err(|_| EngineError::StoreUnavailable("poisoned lock".to_string()))
    }

    /// Validate the stake and take it from the player's balance. The debit
    /// happens on the guard's working copy; funds are at risk for the
    /// whole session, not merely reserved.
    pub(crate) fn take_stake(account: &mut PlayerAccount, stake: f64) -> EngineResult<()> {
        if !(stake > 0.0) || !stake.is_finite() {
            return Err(EngineError::InvalidStake(stake));
        }
        account.ensure_playable(Utc::now())?;
        account.debit(stake)?;
        Ok(())
    }

    /// Resolve a session slot and verify the caller owns it. Ownership is
    /// immutable, so this check needs no lock.
    pub(crate) fn owned_slot(&self, player: &str, id: Uuid) -> EngineResult<Arc<SessionSlot>> {
        let slot = self.store.session(id)?;
        if slot.owner != player {
            return Err(EngineError::SessionNotOwned);
        }
        Ok(slot)
    }

    /// Settle a working copy as a win: compute the payout, credit the
    /// ledger, persist both in one batch, publish the copies back.
    pub(crate) fn commit_win(
        &self,
        account: &mut PlayerAccount,
        session: &mut Session,
        mut working: Session,
        multiplier: f64,
    ) -> EngineResult<f64> {
        let mut acct = account.clone();
        let payout = round2(working.stake * multiplier);
        acct.record_win(working.stake, payout);
        working.settle_won(multiplier, payout);
        self.store.persist_settlement(&working, &acct)?;
        tracing::info!(
            session = %working.id,
            player = %acct.player_id,
            game = %working.kind,
            multiplier,
            payout,
            "session settled as win"
        );
        *account = acct;
        *session = working;
        Ok(payout)
    }

    /// Settle a working copy as a loss: the stake stays with the house and
    /// only the lifetime loss counter moves.
    pub(crate) fn commit_loss(
        &self,
        account: &mut PlayerAccount,
        session: &mut Session,
        mut working: Session,
        multiplier: f64,
    ) -> EngineResult<()> {
        let mut acct = account.clone();
        acct.record_loss(working.stake);
        working.settle_lost(multiplier);
        self.store.persist_settlement(&working, &acct)?;
        tracing::info!(
            session = %working.id,
            player = %acct.player_id,
            game = %working.kind,
            multiplier,
            "session settled as loss"
        );
        *account = acct;
        *session = working;
        Ok(())
    }

    /// Set or clear a player's gameplay ban. Pending sessions are left
    /// alone; a banned player can still finish a round already in flight.
    pub fn set_gameplay_ban(
        &self,
        player: &str,
        banned_until: Option<chrono::DateTime<Utc>>,
    ) -> EngineResult<PlayerAccount> {
        let handle = self.store.player(player)?;
        let mut account = Self::lock(&handle)?;

        let mut acct = account.clone();
        acct.banned_until = banned_until;
        self.store.persist_player(&acct)?;
        *account = acct.clone();

        match banned_until {
            Some(until) => tracing::warn!(player, %until, "gameplay ban set"),
            None => tracing::info!(player, "gameplay ban lifted"),
        }
        Ok(acct)
    }

    /// Persist a non-terminal progress step and publish it.
    pub(crate) fn commit_progress(
        &self,
        session: &mut Session,
        working: Session,
    ) -> EngineResult<()> {
        self.store.persist_session(&working)?;
        *session = working;
        Ok(())
    }
}
