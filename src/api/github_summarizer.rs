//! Key-gated GitHub README summarizer
//!
//! The pipeline is strictly sequential and stops at the first failure:
//! key check, body parse, URL parse, README fetch, summarization.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    db::ApiKeyRepository,
    models::{SummarizeRequest, SummarizeResponse},
    services::parse_repo_url,
    AppState,
};

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(summarize_repository))
}

#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    message: &'static str,
}

/// Terminal outcome of a failed summarization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummarizeFailure {
    MissingKey,
    InvalidKey,
    MissingUrl,
    InvalidUrl,
    ReadmeUnavailable,
    Internal,
}

impl IntoResponse for SummarizeFailure {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingKey => (StatusCode::UNAUTHORIZED, "API key is required"),
            Self::InvalidKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
            Self::MissingUrl => (StatusCode::BAD_REQUEST, "GitHub URL is required"),
            Self::InvalidUrl => (StatusCode::BAD_REQUEST, "Invalid GitHub repository URL"),
            Self::ReadmeUnavailable => (StatusCode::NOT_FOUND, "Failed to fetch README content"),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error Summarizing GitHub Repository",
            ),
        };

        (
            status,
            Json(Failure {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

/// POST /api/github-summarizer
async fn summarize_repository(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SummarizeResponse>, SummarizeFailure> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(SummarizeFailure::MissingKey)?;

    let key = ApiKeyRepository::new(&state.db)
        .find_by_secret(api_key)
        .await
        .map_err(|e| {
            error!("Key lookup failed: {}", e);
            SummarizeFailure::Internal
        })?
        .ok_or(SummarizeFailure::InvalidKey)?;

    let github_url = serde_json::from_slice::<SummarizeRequest>(&body)
        .ok()
        .and_then(|req| req.github_url)
        .filter(|url| !url.trim().is_empty())
        .ok_or(SummarizeFailure::MissingUrl)?;

    let repo = parse_repo_url(&github_url).ok_or(SummarizeFailure::InvalidUrl)?;

    let readme = state.github.fetch_readme(&repo).await.map_err(|e| {
        warn!(repository = %repo, "README fetch failed: {}", e);
        SummarizeFailure::ReadmeUnavailable
    })?;

    let summary = state.summarizer.summarize(&readme).await.map_err(|e| {
        error!(repository = %repo, "Summarization failed: {}", e);
        SummarizeFailure::Internal
    })?;

    info!(key_id = %key.id, repository = %repo, "Repository summarized");
    Ok(Json(SummarizeResponse {
        success: true,
        data: summary,
        message: "GitHub repository summarized successfully".to_string(),
    }))
}
