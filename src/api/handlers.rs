//! Request handlers.
//!
//! Thin adapters from HTTP to engine operations: extract the caller
//! identity, hand the request to the engine, map the result. All game
//! rules live in the engine; nothing here touches balances or outcomes
//! directly.

use super::{
    errors::ApiError,
    middleware::{PlayerId, RequestId},
    models::*,
};
use crate::engine::{
    crash::{CrashCashoutRequest, CrashCashoutResponse, CrashStartRequest, CrashStartResponse},
    mines::{
        MinesCashoutRequest, MinesCashoutResponse, MinesRevealRequest, MinesRevealResponse,
        MinesStartRequest, MinesStartResponse,
    },
    towers::{TowersPickRequest, TowersPickResponse, TowersStartRequest, TowersStartResponse},
    GameEngine,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub engine: GameEngine,
    pub version: String,
}

/// Health check handler - minimal response time.
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// Register a player and create their ledger entry.
/// POST /api/players
pub async fn register_player_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterPlayerRequest>,
) -> Result<Json<PlayerResponse>, ApiError> {
    if req.player_id.trim().is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "player_id must not be empty".to_string(),
        ));
    }
    if !(req.starting_balance.is_finite() && req.starting_balance >= 0.0) {
        return Err(ApiError::bad_request(
            request_id.0,
            "starting_balance must be a finite non-negative amount".to_string(),
        ));
    }
    let account = state
        .engine
        .store()
        .register_player(req.player_id.trim(), req.starting_balance)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;
    Ok(Json(account.into()))
}

/// Current balance and lifetime totals for the calling player.
/// GET /api/balance
pub async fn balance_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
) -> Result<Json<PlayerResponse>, ApiError> {
    let account = state
        .engine
        .store()
        .player_snapshot(&player)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;
    Ok(Json(account.into()))
}

/// Moderation boundary: set or clear a gameplay ban on a player.
/// POST /api/players/:id/ban
pub async fn ban_player_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    Json(req): Json<BanRequest>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let account = state
        .engine
        .set_gameplay_ban(&player_id, req.banned_until)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;
    Ok(Json(account.into()))
}

/// Recent sessions for the calling player, newest first.
/// GET /api/games/history?limit={n}
pub async fn history_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    // The player must exist; an empty history for a known player is fine.
    state
        .engine
        .store()
        .player(&player)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let limit = query.limit.min(100);
    let sessions = state
        .engine
        .store()
        .recent_sessions(&player, limit)
        .into_iter()
        .map(SessionSummary::from)
        .collect();
    Ok(Json(HistoryResponse { sessions }))
}

/// POST /api/games/crash/start
pub async fn crash_start_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Json(req): Json<CrashStartRequest>,
) -> Result<Json<CrashStartResponse>, ApiError> {
    state
        .engine
        .start_crash(&player, req)
        .map(Json)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))
}

/// POST /api/games/crash/cashout
pub async fn crash_cashout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Json(req): Json<CrashCashoutRequest>,
) -> Result<Json<CrashCashoutResponse>, ApiError> {
    state
        .engine
        .cashout_crash(&player, req)
        .map(Json)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))
}

/// POST /api/games/mines/start
pub async fn mines_start_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Json(req): Json<MinesStartRequest>,
) -> Result<Json<MinesStartResponse>, ApiError> {
    state
        .engine
        .start_mines(&player, req)
        .map(Json)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))
}

/// POST /api/games/mines/reveal
pub async fn mines_reveal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Json(req): Json<MinesRevealRequest>,
) -> Result<Json<MinesRevealResponse>, ApiError> {
    state
        .engine
        .reveal_mines(&player, req)
        .map(Json)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))
}

/// POST /api/games/mines/cashout
pub async fn mines_cashout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Json(req): Json<MinesCashoutRequest>,
) -> Result<Json<MinesCashoutResponse>, ApiError> {
    state
        .engine
        .cashout_mines(&player, req)
        .map(Json)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))
}

/// POST /api/games/towers/start
pub async fn towers_start_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Json(req): Json<TowersStartRequest>,
) -> Result<Json<TowersStartResponse>, ApiError> {
    state
        .engine
        .start_towers(&player, req)
        .map(Json)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))
}

/// POST /api/games/towers/pick
pub async fn towers_pick_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    PlayerId(player): PlayerId,
    Json(req): Json<TowersPickRequest>,
) -> Result<Json<TowersPickResponse>, ApiError> {
    state
        .engine
        .pick_towers(&player, req)
        .map(Json)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))
}
