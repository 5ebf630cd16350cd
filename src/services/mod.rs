//! Business logic services

pub mod credentials;
pub mod github;
pub mod key_generator;
pub mod summarizer;

pub use credentials::{AuthenticatedUser, CredentialError, CredentialStore, SupabaseAuthClient};
pub use github::{parse_repo_url, GithubClient, GithubError};
pub use key_generator::{generate_api_key, mask_secret, GeneratedKey};
pub use summarizer::{OpenAiSummarizer, Summarizer, SummarizerError};
