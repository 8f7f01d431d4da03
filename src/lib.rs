//! Casino game session engine.
//!
//! Three game families share one session lifecycle: Crash (ride a rising
//! multiplier, cash out before the pre-drawn crash point), Mines (reveal
//! cells on a 5x5 grid, each safe reveal compounds the multiplier) and
//! Towers (climb a ladder of tiers, one bad slot per tier). Every random
//! outcome is committed at session start; play merely discloses it.
//!
//! Balances live in a per-player ledger with lifetime win/loss totals, and
//! every balance-moving step is persisted atomically with the session
//! state that caused it.

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod payout;
pub mod session;
pub mod store;
