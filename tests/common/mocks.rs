//! Mock services for testing
//!
//! In-process fakes for the service traits, plus wiremock helpers for the
//! GitHub contents API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shke_portal::models::RepoSummary;
use shke_portal::services::{
    AuthenticatedUser, CredentialError, CredentialStore, Summarizer, SummarizerError,
};

/// Email/password store kept in memory
pub struct FakeCredentialStore {
    users: RwLock<HashMap<String, (String, Uuid)>>,
    /// Simulate an unreachable store when set
    pub unavailable: RwLock<bool>,
    /// Redirect targets passed to sign-up, in call order
    pub sign_up_redirects: RwLock<Vec<Option<String>>>,
}

impl Default for FakeCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCredentialStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            unavailable: RwLock::new(false),
            sign_up_redirects: RwLock::new(Vec::new()),
        }
    }

    /// Register a confirmed account and return its id
    pub fn add_user(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users
            .write()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), id));
        id
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().unwrap() = unavailable;
    }

    fn check_available(&self) -> Result<(), CredentialError> {
        if *self.unavailable.read().unwrap() {
            return Err(CredentialError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, CredentialError> {
        self.check_available()?;
        match self.users.read().unwrap().get(email) {
            Some((stored, id)) if stored == password => Ok(AuthenticatedUser { id: *id }),
            _ => Err(CredentialError::Rejected(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), CredentialError> {
        self.check_available()?;
        self.sign_up_redirects
            .write()
            .unwrap()
            .push(redirect_to.map(str::to_string));

        let mut users = self.users.write().unwrap();
        if users.contains_key(email) {
            return Err(CredentialError::Rejected(
                "User already registered".to_string(),
            ));
        }
        users.insert(email.to_string(), (password.to_string(), Uuid::new_v4()));
        Ok(())
    }
}

/// Summarizer that returns a canned answer and counts calls
pub struct FakeSummarizer {
    result: Option<RepoSummary>,
    calls: AtomicUsize,
}

impl FakeSummarizer {
    pub fn succeeding() -> Self {
        Self {
            result: Some(sample_summary()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, _readme: &str) -> Result<RepoSummary, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or(SummarizerError::EmptyResponse)
    }
}

pub fn sample_summary() -> RepoSummary {
    RepoSummary {
        summary: "A tiny demo repository.".to_string(),
        cool_facts: vec![
            "It has a README".to_string(),
            "It was written for tests".to_string(),
        ],
    }
}

/// Serve `body` as the raw README of `owner/repo`
pub async fn mount_readme(server: &MockServer, owner: &str, repo: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/readme", owner, repo)))
        .and(header("accept", "application/vnd.github.v3.raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer 404 for the README of `owner/repo`
pub async fn mount_missing_readme(server: &MockServer, owner: &str, repo: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/readme", owner, repo)))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Not Found"
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Fail the test if any README request reaches GitHub
pub async fn forbid_github_calls(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}
