//! Credential store client
//!
//! User accounts, password verification and email confirmation live in an
//! external Supabase project. This module talks to its GoTrue REST API and
//! exposes the two operations the portal needs behind [`CredentialStore`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SupabaseConfig;

/// A user as returned by the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The store rejected the request (bad password, duplicate email, ...)
    #[error("{0}")]
    Rejected(String),
    /// The store could not be reached or answered unexpectedly
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// External user/password backend
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Verify an email/password pair
    async fn sign_in(&self, email: &str, password: &str)
        -> Result<AuthenticatedUser, CredentialError>;

    /// Create an account; the store sends the confirmation email itself
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), CredentialError>;
}

/// Supabase GoTrue implementation of [`CredentialStore`]
#[derive(Clone)]
pub struct SupabaseAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionPayload {
    user: Option<UserPayload>,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
}

/// GoTrue reports errors under several different keys depending on version
#[derive(Deserialize, Default)]
struct GoTrueError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueError {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

impl SupabaseAuthClient {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn error_message(response: reqwest::Response, fallback: &str) -> String {
        response
            .json::<GoTrueError>()
            .await
            .ok()
            .and_then(GoTrueError::into_message)
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[async_trait]
impl CredentialStore for SupabaseAuthClient {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, CredentialError> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let message = Self::error_message(response, "Invalid login credentials").await;
            debug!(status = %status, "Credential store rejected sign-in");
            return Err(CredentialError::Rejected(message));
        }
        if !status.is_success() {
            warn!(status = %status, "Credential store sign-in failed");
            return Err(CredentialError::Unavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        let payload: SessionPayload = response
            .json()
            .await
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?;
        let user = payload
            .user
            .ok_or_else(|| CredentialError::Rejected("Authentication failed".to_string()))?;
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| CredentialError::Unavailable("malformed user id".to_string()))?;

        Ok(AuthenticatedUser { id })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), CredentialError> {
        let mut request = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&PasswordCredentials { email, password });
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?;

        let status = response.status();
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(CredentialError::Rejected(
                Self::error_message(response, "Too many sign-up attempts").await,
            )),
            s if s.is_client_error() => Err(CredentialError::Rejected(
                Self::error_message(response, "Registration failed").await,
            )),
            s => {
                warn!(status = %s, "Credential store sign-up failed");
                Err(CredentialError::Unavailable(format!("unexpected status {}", s)))
            }
        }
    }
}
