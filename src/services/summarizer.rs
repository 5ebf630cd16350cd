//! README summarization through an OpenAI-compatible chat completions API
//!
//! The provider is asked for structured output matching [`RepoSummary`]:
//! a free-text summary plus exactly two "cool facts".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::models::RepoSummary;

/// Number of facts every summary must carry
pub const COOL_FACT_COUNT: usize = 2;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("summarization request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider response had no content")]
    EmptyResponse,
    #[error("provider response did not match the summary schema: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, readme: &str) -> Result<RepoSummary, SummarizerError>;
}

/// Build the user prompt for a README
pub fn build_prompt(readme: &str) -> String {
    format!(
        "Summarize this github repository from this readme file content:\n\n{}\n\n\
         Provide your response with a summary and 2 cool facts about the repository.",
        readme
    )
}

/// Parse and check a provider's JSON answer
pub fn parse_summary(content: &str) -> Result<RepoSummary, SummarizerError> {
    let summary: RepoSummary =
        serde_json::from_str(content).map_err(|e| SummarizerError::Malformed(e.to_string()))?;

    if summary.summary.trim().is_empty() {
        return Err(SummarizerError::Malformed("summary is empty".to_string()));
    }
    if summary.cool_facts.len() != COOL_FACT_COUNT {
        return Err(SummarizerError::Malformed(format!(
            "expected {} cool facts, got {}",
            COOL_FACT_COUNT,
            summary.cool_facts.len()
        )));
    }

    Ok(summary)
}

fn response_schema() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "repo_summary",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "summary": {
                        "type": "string",
                        "description": "A concise summary of the GitHub repository"
                    },
                    "cool_facts": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": COOL_FACT_COUNT,
                        "maxItems": COOL_FACT_COUNT,
                        "description": "Interesting facts about the repository"
                    }
                },
                "required": ["summary", "cool_facts"],
                "additionalProperties": false
            }
        }
    })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
    response_format: Value,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`Summarizer`] backed by `POST {base_url}/chat/completions`
#[derive(Clone)]
pub struct OpenAiSummarizer {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiSummarizer {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, readme: &str) -> Result<RepoSummary, SummarizerError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(readme),
            }],
            response_format: response_schema(),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Summarization provider returned an error");
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(SummarizerError::EmptyResponse)?;

        debug!(model = %self.model, "Received summary from provider");
        parse_summary(&content)
    }
}
