//! API key management endpoints
//!
//! Every operation is scoped to the signed-in user; a key that belongs to
//! someone else is indistinguishable from one that does not exist.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::{
    db::ApiKeyRepository,
    middleware::SessionUser,
    models::{
        ApiKey, CreateApiKeyRequest, DataResponse, DeleteApiKeyQuery, SuccessResponse,
        UpdateApiKeyRequest,
    },
    utils::{AppError, AppResult, ValidatedJson},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_api_keys)
            .post(create_api_key)
            .put(update_api_key)
            .delete(delete_api_key),
    )
}

fn normalize_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name must be 1-100 characters"));
    }
    Ok(name.to_string())
}

/// GET /api/keys
async fn list_api_keys(
    State(state): State<AppState>,
    user: SessionUser,
) -> AppResult<Json<DataResponse<Vec<ApiKey>>>> {
    let keys = ApiKeyRepository::new(&state.db).list_for_owner(user.id).await?;
    Ok(Json(DataResponse { data: keys }))
}

/// POST /api/keys
async fn create_api_key(
    State(state): State<AppState>,
    user: SessionUser,
    ValidatedJson(payload): ValidatedJson<CreateApiKeyRequest>,
) -> AppResult<Json<DataResponse<ApiKey>>> {
    let name = normalize_name(&payload.name)?;
    let key = ApiKeyRepository::new(&state.db)
        .create(user.id, &name, payload.limit)
        .await?;

    info!(user_id = %user.id, key_id = %key.id, "API key created");
    Ok(Json(DataResponse { data: key }))
}

/// PUT /api/keys
async fn update_api_key(
    State(state): State<AppState>,
    user: SessionUser,
    ValidatedJson(payload): ValidatedJson<UpdateApiKeyRequest>,
) -> AppResult<Json<DataResponse<ApiKey>>> {
    let name = normalize_name(&payload.name)?;
    let key = ApiKeyRepository::new(&state.db)
        .update(user.id, payload.id, &name, payload.limit)
        .await?
        .ok_or_else(|| AppError::not_found("API key not found"))?;

    Ok(Json(DataResponse { data: key }))
}

/// DELETE /api/keys?id=<uuid>
async fn delete_api_key(
    State(state): State<AppState>,
    user: SessionUser,
    query: Result<Query<DeleteApiKeyQuery>, QueryRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let Query(query) =
        query.map_err(|_| AppError::bad_request("A valid API key id is required"))?;

    let deleted = ApiKeyRepository::new(&state.db)
        .delete(user.id, query.id)
        .await?;
    if !deleted {
        return Err(AppError::not_found("API key not found"));
    }

    info!(user_id = %user.id, key_id = %query.id, "API key deleted");
    Ok(Json(SuccessResponse::ok()))
}
