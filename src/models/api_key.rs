//! API key models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Largest accepted monthly usage limit
pub const MAX_USAGE_LIMIT: i64 = 1_000_000_000;

/// An issued API key.
///
/// Serialized with the field names the dashboard client expects
/// (`user_id`, `key`, `display_key`, `limit`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub name: String,
    /// Full secret; only ever returned to the owner
    #[serde(rename = "key")]
    pub secret: String,
    #[serde(rename = "display_key")]
    pub display_secret: String,
    #[serde(rename = "limit")]
    pub usage_limit: i64,
    pub created_at: DateTime<Utc>,
}

/// Non-secret view of a key, safe to return to any holder of the key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiKeyMetadata {
    pub id: Uuid,
    pub name: String,
    pub display_key: String,
    pub limit: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiKey> for ApiKeyMetadata {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id,
            name: key.name.clone(),
            display_key: key.display_secret.clone(),
            limit: key.usage_limit,
            created_at: key.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 0, max = MAX_USAGE_LIMIT, message = "limit is out of range"))]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateApiKeyRequest {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 0, max = MAX_USAGE_LIMIT, message = "limit is out of range"))]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteApiKeyQuery {
    pub id: Uuid,
}

/// `{"data": ...}` envelope used by the key endpoints
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateKeyRequest {
    #[serde(rename = "apiKey", default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateKeyResponse {
    #[serde(rename = "isValidApiKey")]
    pub is_valid_api_key: bool,
    pub message: String,
    pub details: Option<ApiKeyMetadata>,
}
