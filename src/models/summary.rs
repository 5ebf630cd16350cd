//! GitHub summarizer models

use serde::{Deserialize, Serialize};

/// Owner/name pair parsed from a GitHub URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Structured summary returned by the summarization provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub summary: String,
    pub cool_facts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeRequest {
    #[serde(rename = "githubUrl", default)]
    pub github_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub data: RepoSummary,
    pub message: String,
}
