//! API route definitions.

use super::handlers::{
    balance_handler, ban_player_handler, crash_cashout_handler, crash_start_handler,
    health_handler, history_handler, mines_cashout_handler, mines_reveal_handler,
    mines_start_handler, register_player_handler, towers_pick_handler, towers_start_handler,
    AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create the application router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/players", post(register_player_handler))
        .route("/api/players/:player_id/ban", post(ban_player_handler))
        .route("/api/balance", get(balance_handler))
        .route("/api/games/history", get(history_handler))
        .route("/api/games/crash/start", post(crash_start_handler))
        .route("/api/games/crash/cashout", post(crash_cashout_handler))
        .route("/api/games/mines/start", post(mines_start_handler))
        .route("/api/games/mines/reveal", post(mines_reveal_handler))
        .route("/api/games/mines/cashout", post(mines_cashout_handler))
        .route("/api/games/towers/start", post(towers_start_handler))
        .route("/api/games/towers/pick", post(towers_pick_handler))
        .with_state(state)
}
