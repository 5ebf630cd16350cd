//! SHKE Portal Library
//!
//! API key management portal with a key-gated GitHub README summarizer.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
use services::{CredentialStore, GithubClient, Summarizer};
use utils::AppError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Key registry connection pool
    pub db: DbPool,
    /// External user/password backend
    pub credentials: Arc<dyn CredentialStore>,
    pub github: Arc<GithubClient>,
    pub summarizer: Arc<dyn Summarizer>,
}

async fn api_not_found() -> AppError {
    AppError::not_found("Endpoint not found")
}

async fn page_not_found() -> AppError {
    AppError::not_found("Page not found")
}

/// Build the API router mounted under `/api`
fn api_router() -> Router<AppState> {
    Router::new()
        .merge(api::public_routes())
        .merge(api::session_routes())
        .fallback(api_not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// Attach the frontend, if one is configured, as the page fallback
fn with_frontend(router: Router<AppState>, config: &AppConfig) -> Router<AppState> {
    let Some(ref static_dir) = config.server.static_dir else {
        info!("No static directory configured, frontend not served");
        return router.fallback(page_not_found);
    };

    if !static_dir.exists() {
        warn!("Static directory {:?} does not exist, frontend not served", static_dir);
        return router.fallback(page_not_found);
    }

    info!("Serving frontend from {:?}", static_dir);
    let index_file = static_dir.join("index.html");
    if index_file.exists() {
        // Client-side routes resolve to index.html with a 200
        router.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index_file)))
    } else {
        warn!("index.html not found in {:?}, SPA fallback disabled", static_dir);
        router.fallback_service(ServeDir::new(static_dir))
    }
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let router = Router::new().nest("/api", api_router());

    // The gate sees every request; it lets API and asset paths through untouched
    with_frontend(router, &state.config)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::gate_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
