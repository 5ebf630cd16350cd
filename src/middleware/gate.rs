//! Page request gate
//!
//! Runs before every page request and redirects between `/login` and
//! `/dashboard` depending on the session cookie. API routes and static
//! assets are never gated here; API handlers enforce their own auth.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use super::session::{removal_cookie, SessionState};
use crate::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

const PUBLIC_PATHS: &[&str] = &["/", LOGIN_PATH, "/auth/callback"];
const ASSET_PREFIXES: &[&str] = &["/assets/", "/_next/static/", "/_next/image"];
const ASSET_PATHS: &[&str] = &["/favicon.ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Public,
    Protected,
    Api,
    Asset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    RedirectToLogin { clear_cookie: bool },
    RedirectToDashboard,
}

pub fn classify_path(path: &str) -> PathClass {
    if path == "/api" || path.starts_with("/api/") {
        PathClass::Api
    } else if ASSET_PATHS.contains(&path) || ASSET_PREFIXES.iter().any(|p| path.starts_with(p)) {
        PathClass::Asset
    } else if PUBLIC_PATHS.contains(&path) {
        PathClass::Public
    } else {
        PathClass::Protected
    }
}

pub fn decide(class: PathClass, path: &str, session: &SessionState) -> GateDecision {
    match (class, session) {
        (PathClass::Api | PathClass::Asset, _) => GateDecision::PassThrough,
        (_, SessionState::Valid(_)) if path == LOGIN_PATH => GateDecision::RedirectToDashboard,
        (_, SessionState::Valid(_)) => GateDecision::PassThrough,
        (PathClass::Protected, SessionState::Invalid) => {
            GateDecision::RedirectToLogin { clear_cookie: true }
        }
        (PathClass::Protected, SessionState::Absent) => {
            GateDecision::RedirectToLogin { clear_cookie: false }
        }
        (PathClass::Public, _) => GateDecision::PassThrough,
    }
}

/// Apply [`decide`] to an incoming page request
pub async fn gate_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let class = classify_path(&path);
    if matches!(class, PathClass::Api | PathClass::Asset) {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let session = SessionState::from_jar(&jar, &state.config.auth);

    match decide(class, &path, &session) {
        GateDecision::PassThrough => next.run(request).await,
        GateDecision::RedirectToDashboard => {
            debug!(path = %path, "Signed-in user sent to dashboard");
            Redirect::temporary(DASHBOARD_PATH).into_response()
        }
        GateDecision::RedirectToLogin { clear_cookie } => {
            debug!(path = %path, clear_cookie, "Unauthenticated page request sent to login");
            if clear_cookie {
                let jar = jar.remove(removal_cookie(&state.config.auth));
                (jar, Redirect::temporary(LOGIN_PATH)).into_response()
            } else {
                Redirect::temporary(LOGIN_PATH).into_response()
            }
        }
    }
}
