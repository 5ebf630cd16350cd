//! Session tokens
//!
//! Sessions are stateless HS256 tokens carried in an HttpOnly cookie. The
//! only claim the portal relies on is `userId`; a token that fails any check
//! is treated exactly like a missing one.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AuthConfig, MAX_SESSION_TTL_HOURS},
    utils::error::ErrorResponse,
    AppState,
};

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Set on tokens this portal issues; not required when verifying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,
}

/// Identity carried by a valid session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
}

/// Result of inspecting a request's session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session cookie at all
    Absent,
    Valid(SessionUser),
    /// A cookie is present but does not verify
    Invalid,
}

impl SessionState {
    pub fn from_jar(jar: &CookieJar, auth: &AuthConfig) -> Self {
        match jar.get(&auth.cookie_name) {
            None => SessionState::Absent,
            Some(cookie) => match verify_session_token(cookie.value(), &auth.jwt_secret) {
                Some(user) => SessionState::Valid(user),
                None => SessionState::Invalid,
            },
        }
    }

    pub fn user(&self) -> Option<SessionUser> {
        match self {
            SessionState::Valid(user) => Some(*user),
            _ => None,
        }
    }
}

/// Sign a session token for `user_id`
pub fn issue_session_token(
    user_id: Uuid,
    secret: &str,
    ttl_hours: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = SessionClaims {
        user_id: user_id.to_string(),
        iat: Some(now.timestamp()),
        exp: (now + Duration::hours(ttl_hours_i64(ttl_hours))).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// TTL in hours, clamped to the configurable maximum
fn ttl_hours_i64(ttl_hours: u64) -> i64 {
    ttl_hours.min(MAX_SESSION_TTL_HOURS) as i64
}

/// Verify a session token, yielding the user on success
pub fn verify_session_token(token: &str, secret: &str) -> Option<SessionUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;

    let id = Uuid::parse_str(&data.claims.user_id).ok()?;
    Some(SessionUser { id })
}

/// The authenticated user of a request, if any
pub fn session_identity(jar: &CookieJar, auth: &AuthConfig) -> Option<SessionUser> {
    SessionState::from_jar(jar, auth).user()
}

/// Cookie carrying a freshly issued session token
pub fn session_cookie(token: String, auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), token))
        .http_only(true)
        .secure(auth.secure_cookies)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::hours(ttl_hours_i64(auth.session_ttl_hours)))
        .build()
}

/// Cookie that, passed to [`CookieJar::remove`], clears the session cookie
pub fn removal_cookie(auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), ""))
        .http_only(true)
        .secure(auth.secure_cookies)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

/// Handler extractor for session-scoped endpoints
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        session_identity(&jar, &state.config.auth).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("unauthorized", "Unauthorized")),
            )
        })
    }
}
