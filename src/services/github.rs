//! GitHub README retrieval

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header, Client};
use thiserror::Error;
use tracing::debug;

use crate::config::GithubConfig;
use crate::models::RepoRef;

static REPO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([^/?#]+)/([^/?#]+)").expect("repository URL pattern is valid")
});

const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";
const USER_AGENT: &str = concat!("shke-portal/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("README not found for {0}")]
    NotFound(String),
    #[error("GitHub returned status {0}")]
    Status(u16),
    #[error("README is empty")]
    Empty,
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Extract `owner/repo` from anything that contains `github.com/<owner>/<repo>`.
///
/// A trailing `.git` is stripped from the repository name.
pub fn parse_repo_url(url: &str) -> Option<RepoRef> {
    let captures = REPO_URL.captures(url)?;
    let owner = captures.get(1)?.as_str();
    let repo = captures.get(2)?.as_str();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    Some(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Client for the GitHub contents API
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Fetch the raw README of a repository's default branch
    pub async fn fetch_readme(&self, repo: &RepoRef) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/{}/readme", self.api_url, repo.owner, repo.repo);

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, RAW_MEDIA_TYPE);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(repository = %repo, status = %status, "Fetched README");

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GithubError::NotFound(repo.to_string()));
        }
        if !status.is_success() {
            return Err(GithubError::Status(status.as_u16()));
        }

        let content = response.text().await?;
        if content.trim().is_empty() {
            return Err(GithubError::Empty);
        }

        Ok(content)
    }
}
