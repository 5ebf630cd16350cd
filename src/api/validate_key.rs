//! API key playground endpoint

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::error;

use crate::{
    db::ApiKeyRepository,
    models::{ApiKeyMetadata, MessageResponse, ValidateKeyRequest, ValidateKeyResponse},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(validate_key))
}

fn message(status: StatusCode, text: &str) -> Response {
    (
        status,
        Json(MessageResponse {
            message: text.to_string(),
        }),
    )
        .into_response()
}

/// POST /api/validate-key
///
/// Reports whether `apiKey` is a registered key. Only non-secret metadata
/// is ever echoed back.
async fn validate_key(State(state): State<AppState>, body: Bytes) -> Response {
    let api_key = serde_json::from_slice::<ValidateKeyRequest>(&body)
        .ok()
        .and_then(|req| req.api_key)
        .filter(|key| !key.trim().is_empty());
    let Some(api_key) = api_key else {
        return message(StatusCode::BAD_REQUEST, "API key is required");
    };

    match ApiKeyRepository::new(&state.db).find_by_secret(&api_key).await {
        Ok(Some(key)) => (
            StatusCode::OK,
            Json(ValidateKeyResponse {
                is_valid_api_key: true,
                message: "Valid API key".to_string(),
                details: Some(ApiKeyMetadata::from(&key)),
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(ValidateKeyResponse {
                is_valid_api_key: false,
                message: "Invalid API key".to_string(),
                details: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Key lookup failed: {}", e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Error validating API key")
        }
    }
}
