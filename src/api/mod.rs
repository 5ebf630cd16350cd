//! API routes and handlers
//!
//! This module defines all API endpoints and their routing. Everything here
//! is mounted under `/api` and bypasses the page request gate.

use axum::{routing::get, Router};

use crate::AppState;

mod api_keys;
mod auth;
mod github_summarizer;
mod health;
mod validate_key;

pub use github_summarizer::API_KEY_HEADER;
pub use health::*;

/// Routes that need no session (some are gated by an API key instead)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
        .nest("/auth", auth::routes())
        .nest("/validate-key", validate_key::routes())
        .nest("/github-summarizer", github_summarizer::routes())
}

/// Routes scoped to the signed-in user
pub fn session_routes() -> Router<AppState> {
    Router::new().nest("/keys", api_keys::routes())
}
