//! Game session HTTP API.
//!
//! The HTTP surface over the session engine: player registration and
//! balance, moderation, history, and the game operation endpoints. Caller
//! identity arrives from the auth layer in front via the player id header.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{ApiConfig, ApiServer};
