//! Authentication API endpoints
//!
//! Provides login, logout, registration, and session status endpoints.
//! Passwords are verified by the external credential store; the portal only
//! issues and clears its own session cookie.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use crate::{
    middleware::session::{issue_session_token, removal_cookie, session_cookie, session_identity},
    models::{LoginRequest, RegisterRequest, SessionStatusResponse, SuccessResponse},
    services::CredentialError,
    utils::{AppError, AppResult, ValidatedJson},
    AppState,
};

const REGISTRATION_MESSAGE: &str =
    "Registration successful! Please check your email to verify your account.";

const SERVICE_UNAVAILABLE: &str = "Authentication service unavailable";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/register", post(register))
        .route("/check-session", get(check_session))
}

/// Login handler
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<SuccessResponse>)> {
    let user = state
        .credentials
        .sign_in(&payload.email, &payload.password)
        .await
        .map_err(|e| match e {
            CredentialError::Rejected(message) => AppError::Unauthorized(message),
            CredentialError::Unavailable(detail) => {
                warn!("Sign-in failed: {}", detail);
                AppError::Unauthorized(SERVICE_UNAVAILABLE.to_string())
            }
        })?;

    let auth = &state.config.auth;
    let token = issue_session_token(user.id, &auth.jwt_secret, auth.session_ttl_hours)
        .map_err(|e| AppError::internal(format!("Failed to issue session token: {}", e)))?;

    info!(user_id = %user.id, "User signed in");
    Ok((jar.add(session_cookie(token, auth)), Json(SuccessResponse::ok())))
}

/// Logout handler
///
/// POST /api/auth/logout
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<SuccessResponse>) {
    (
        jar.remove(removal_cookie(&state.config.auth)),
        Json(SuccessResponse::ok()),
    )
}

/// Registration handler
///
/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Json<SuccessResponse>> {
    state
        .credentials
        .sign_up(
            &payload.email,
            &payload.password,
            payload.redirect_to.as_deref(),
        )
        .await
        .map_err(|e| match e {
            CredentialError::Rejected(message) => AppError::BadRequest(message),
            CredentialError::Unavailable(detail) => {
                warn!("Sign-up failed: {}", detail);
                AppError::BadRequest(SERVICE_UNAVAILABLE.to_string())
            }
        })?;

    Ok(Json(SuccessResponse::with_message(REGISTRATION_MESSAGE)))
}

/// GET /api/auth/check-session
async fn check_session(State(state): State<AppState>, jar: CookieJar) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse {
        is_authenticated: session_identity(&jar, &state.config.auth).is_some(),
    })
}
