//! API key repository

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::models::ApiKey;
use crate::services::key_generator::{generate_api_key, GeneratedKey};
use crate::utils::{AppError, AppResult};

/// Attempts made when a freshly generated secret collides with an existing one
const MAX_INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, sqlx::FromRow)]
struct ApiKeyRow {
    id: String,
    owner_id: String,
    name: String,
    secret: String,
    display_secret: String,
    usage_limit: i64,
    created_at: String,
}

pub struct ApiKeyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ApiKeyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All keys of one owner, newest first
    pub async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<ApiKey>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, owner_id, name, secret, display_secret, usage_limit, created_at
            FROM api_keys
            WHERE owner_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row_to_api_key(row).map_err(AppError::from))
            .collect()
    }

    pub async fn get_by_id(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<ApiKey>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, owner_id, name, secret, display_secret, usage_limit, created_at
            FROM api_keys
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(owner_id.to_string())
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(row_to_api_key).transpose()?)
    }

    /// Issue a new key for `owner_id`
    pub async fn create(&self, owner_id: Uuid, name: &str, usage_limit: i64) -> AppResult<ApiKey> {
        self.create_with(owner_id, name, usage_limit, generate_api_key)
            .await
    }

    /// Issue a new key drawing secrets from `generate`
    ///
    /// A secret that collides with a stored one is regenerated, up to
    /// [`MAX_INSERT_ATTEMPTS`] tries in total.
    pub async fn create_with<F>(
        &self,
        owner_id: Uuid,
        name: &str,
        usage_limit: i64,
        mut generate: F,
    ) -> AppResult<ApiKey>
    where
        F: FnMut() -> GeneratedKey,
    {
        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let generated = generate();
            let key = ApiKey {
                id: Uuid::new_v4(),
                owner_id,
                name: name.to_string(),
                secret: generated.secret,
                display_secret: generated.display_secret,
                usage_limit,
                created_at: Utc::now().trunc_subsecs(6),
            };

            let result = sqlx::query(
                r#"
                INSERT INTO api_keys (id, owner_id, name, secret, display_secret, usage_limit, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(key.id.to_string())
            .bind(key.owner_id.to_string())
            .bind(&key.name)
            .bind(&key.secret)
            .bind(&key.display_secret)
            .bind(key.usage_limit)
            .bind(format_db_timestamp(&key.created_at))
            .execute(self.pool)
            .await;

            match result {
                Ok(_) => return Ok(key),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    warn!(attempt, "Generated API key collided with an existing key");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::internal("Failed to generate a unique API key"))
    }

    /// Rename or re-limit a key owned by `owner_id`
    ///
    /// Returns `None` when no key with that id belongs to the owner.
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        name: &str,
        usage_limit: i64,
    ) -> AppResult<Option<ApiKey>> {
        let result = sqlx::query(
            "UPDATE api_keys SET name = ?, usage_limit = ? WHERE owner_id = ? AND id = ?",
        )
        .bind(name)
        .bind(usage_limit)
        .bind(owner_id.to_string())
        .bind(id.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(owner_id, id).await
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM api_keys WHERE owner_id = ? AND id = ?")
            .bind(owner_id.to_string())
            .bind(id.to_string())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unscoped lookup used by key-gated endpoints
    pub async fn find_by_secret(&self, secret: &str) -> AppResult<Option<ApiKey>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, owner_id, name, secret, display_secret, usage_limit, created_at
            FROM api_keys
            WHERE secret = ?
            "#,
        )
        .bind(secret)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(row_to_api_key).transpose()?)
    }
}

fn row_to_api_key(row: ApiKeyRow) -> anyhow::Result<ApiKey> {
    Ok(ApiKey {
        id: Uuid::parse_str(&row.id).context("Invalid api key id")?,
        owner_id: Uuid::parse_str(&row.owner_id).context("Invalid owner id")?,
        name: row.name,
        secret: row.secret,
        display_secret: row.display_secret,
        usage_limit: row.usage_limit,
        created_at: parse_db_timestamp(&row.created_at)?,
    })
}

/// Fixed-width UTC timestamps so lexical order matches chronological order
fn format_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_db_timestamp(ts: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Invalid timestamp in api_keys: {}", ts))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}
