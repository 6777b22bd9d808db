// src/handlers/score_match_batch.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::{
    db::ListQuery,
    error::{AppError, ErrorBody},
    handlers::{AppJson, cached_list},
    models::{
        common::parse_object_id,
        score_match_batch::{
            CreateScoreMatchBatchRequest, ScoreMatchBatchListParams, ScoreMatchBatchResponse,
            UpdateScoreMatchBatchRequest,
        },
    },
    state::AppState,
};

pub const CACHE_KEY: &str = "score-match-batches";

fn not_found() -> AppError {
    AppError::NotFound("Score match batch not found".to_string())
}

/// Lists batches, newest first.
#[utoipa::path(
    get,
    path = "/api/score-match-batches",
    params(ScoreMatchBatchListParams),
    responses(
        (status = 200, description = "Batches", body = [ScoreMatchBatchResponse]),
        (status = 400, description = "Page out of range", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "score-match-batches"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(params): Query<ScoreMatchBatchListParams>,
) -> Result<Response, AppError> {
    let window = params.window()?;
    let query = ListQuery {
        filter: params.filter()?,
        exclude: Vec::new(),
        skip: window.skip(),
        limit: window.limit(),
    };

    cached_list::<_, ScoreMatchBatchResponse>(
        state.batches.as_ref(),
        state.cache.as_ref(),
        CACHE_KEY,
        query,
        window,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/score-match-batches/{id}",
    params(("id" = String, Path, description = "Batch ObjectId")),
    responses(
        (status = 200, description = "The batch", body = ScoreMatchBatchResponse),
        (status = 404, description = "No such batch", body = ErrorBody),
    ),
    tag = "score-match-batches"
)]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreMatchBatchResponse>, AppError> {
    let id = parse_object_id(&id)?;
    let batch = state.batches.get(&id).await?.ok_or_else(not_found)?;
    Ok(Json(batch.into()))
}

/// Creates a batch.
/// Admin only.
#[utoipa::path(
    post,
    path = "/api/score-match-batches",
    request_body = CreateScoreMatchBatchRequest,
    responses(
        (status = 201, description = "Created", body = ScoreMatchBatchResponse),
        (status = 400, description = "Validation failure", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("jwt" = [])),
    tag = "score-match-batches"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScoreMatchBatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let batch = payload.into_batch();
    batch.check()?;

    state.batches.insert(&batch).await.map_err(|e| {
        tracing::error!("Failed to create score match batch: {}", e);
        e
    })?;
    state.cache.clear(CACHE_KEY);

    tracing::info!("Score match batch {} created", batch.id);
    Ok((StatusCode::CREATED, Json(ScoreMatchBatchResponse::from(batch))))
}

/// Updates a batch. A supplied `features` array replaces the stored one as-is.
/// Admin only.
#[utoipa::path(
    put,
    path = "/api/score-match-batches/{id}",
    params(("id" = String, Path, description = "Batch ObjectId")),
    request_body = UpdateScoreMatchBatchRequest,
    responses(
        (status = 200, description = "Updated batch", body = ScoreMatchBatchResponse),
        (status = 400, description = "Validation failure", body = ErrorBody),
        (status = 404, description = "No such batch", body = ErrorBody),
    ),
    security(("jwt" = [])),
    tag = "score-match-batches"
)]
pub async fn update_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(mut payload): AppJson<UpdateScoreMatchBatchRequest>,
) -> Result<Json<ScoreMatchBatchResponse>, AppError> {
    let id = parse_object_id(&id)?;
    payload.validate()?;
    payload.normalize();

    let mut merged = state.batches.get(&id).await?.ok_or_else(not_found)?;
    payload.apply_to(&mut merged);
    merged.check()?;

    let updated = state
        .batches
        .update(&id, payload.to_changes()?)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update score match batch {}: {}", id, e);
            e
        })?
        .ok_or_else(not_found)?;
    state.cache.clear(CACHE_KEY);

    tracing::info!("Score match batch {} updated", id);
    Ok(Json(updated.into()))
}

/// Deletes a batch.
/// Admin only.
#[utoipa::path(
    delete,
    path = "/api/score-match-batches/{id}",
    params(("id" = String, Path, description = "Batch ObjectId")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "No such batch", body = ErrorBody),
    ),
    security(("jwt" = [])),
    tag = "score-match-batches"
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_object_id(&id)?;

    state
        .batches
        .delete(&id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete score match batch {}: {}", id, e);
            e
        })?
        .ok_or_else(not_found)?;
    state.cache.clear(CACHE_KEY);

    tracing::info!("Score match batch {} deleted", id);
    Ok(Json(json!({ "message": "Score match batch deleted successfully" })))
}
