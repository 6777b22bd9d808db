// src/handlers/free_quiz.rs

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
        free_quiz::{
            CreateFreeQuizRequest, FreeQuizListParams, FreeQuizResponse, PDF_DATA_PATH,
            UpdateFreeQuizRequest,
        },
    },
    state::AppState,
    utils::payload::check_pdf_payload,
};

/// Cache key prefix for every free-quiz list response.
pub const CACHE_KEY: &str = "free-quizzes";

fn not_found() -> AppError {
    AppError::NotFound("Free quiz not found".to_string())
}

/// Lists free quizzes, newest first. PDF contents are never included.
#[utoipa::path(
    get,
    path = "/api/free-quizzes",
    params(FreeQuizListParams),
    responses(
        (status = 200, description = "Quizzes without `quizPdf.data`", body = [FreeQuizResponse]),
        (status = 400, description = "Page out of range", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag = "free-quizzes"
)]
pub async fn list_free_quizzes(
    State(state): State<AppState>,
    Query(params): Query<FreeQuizListParams>,
) -> Result<Response, AppError> {
    let window = params.window()?;
    let query = ListQuery {
        filter: params.filter()?,
        exclude: vec![PDF_DATA_PATH],
        skip: window.skip(),
        limit: window.limit(),
    };

    cached_list::<_, FreeQuizResponse>(
        state.free_quizzes.as_ref(),
        state.cache.as_ref(),
        CACHE_KEY,
        query,
        window,
    )
    .await
}

/// Retrieves a single quiz, including its PDF.
#[utoipa::path(
    get,
    path = "/api/free-quizzes/{id}",
    params(("id" = String, Path, description = "Quiz ObjectId")),
    responses(
        (status = 200, description = "The quiz", body = FreeQuizResponse),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "No such quiz", body = ErrorBody),
    ),
    tag = "free-quizzes"
)]
pub async fn get_free_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FreeQuizResponse>, AppError> {
    let id = parse_object_id(&id)?;

    let quiz = state
        .free_quizzes
        .get(&id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch free quiz {}: {}", id, e);
            e
        })?
        .ok_or_else(not_found)?;

    Ok(Json(quiz.into()))
}

/// Creates a free quiz.
/// Admin only. PDF payloads above the configured limit are refused.
#[utoipa::path(
    post,
    path = "/api/free-quizzes",
    request_body = CreateFreeQuizRequest,
    responses(
        (status = 201, description = "Created", body = FreeQuizResponse),
        (status = 400, description = "Validation failure or PDF too large", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("jwt" = [])),
    tag = "free-quizzes"
)]
pub async fn create_free_quiz(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateFreeQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(data) = payload.pdf_data() {
        let size = check_pdf_payload(data, state.config.max_pdf_bytes)?;
        tracing::debug!("Accepted PDF upload of {} bytes", size);
    }

    let quiz = payload.into_quiz();
    quiz.check(true)?;

    state.free_quizzes.insert(&quiz).await.map_err(|e| {
        tracing::error!("Failed to create free quiz: {}", e);
        e
    })?;
    state.cache.clear(CACHE_KEY);

    tracing::info!("Free quiz {} created ({:?})", quiz.id, quiz.quiz_type);
    Ok((StatusCode::CREATED, Json(FreeQuizResponse::from(quiz))))
}

/// Updates a free quiz. Only supplied fields change, except that the source
/// the resulting quiz type does not use (`quizPdf` or `quizLink`) is removed.
/// Admin only.
#[utoipa::path(
    patch,
    path = "/api/free-quizzes/{id}",
    params(("id" = String, Path, description = "Quiz ObjectId")),
    request_body = UpdateFreeQuizRequest,
    responses(
        (status = 200, description = "Updated quiz", body = FreeQuizResponse),
        (status = 400, description = "Validation failure or PDF too large", body = ErrorBody),
        (status = 404, description = "No such quiz", body = ErrorBody),
    ),
    security(("jwt" = [])),
    tag = "free-quizzes"
)]
pub async fn update_free_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(mut payload): AppJson<UpdateFreeQuizRequest>,
) -> Result<Json<FreeQuizResponse>, AppError> {
    let id = parse_object_id(&id)?;
    payload.validate()?;
    payload.normalize();

    if let Some(data) = payload.pdf_data() {
        check_pdf_payload(data, state.config.max_pdf_bytes)?;
    }

    let mut merged = state.free_quizzes.get(&id).await?.ok_or_else(not_found)?;
    if payload.is_empty() {
        return Ok(Json(merged.into()));
    }
    payload.apply_to(&mut merged);
    merged.check(true)?;

    let updated = state
        .free_quizzes
        .update(&id, payload.to_changes(merged.quiz_type)?)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update free quiz {}: {}", id, e);
            e
        })?
        .ok_or_else(not_found)?;
    state.cache.clear(CACHE_KEY);

    tracing::info!("Free quiz {} updated", id);
    Ok(Json(updated.into()))
}

/// Deletes a free quiz.
/// Admin only.
#[utoipa::path(
    delete,
    path = "/api/free-quizzes/{id}",
    params(("id" = String, Path, description = "Quiz ObjectId")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "No such quiz", body = ErrorBody),
    ),
    security(("jwt" = [])),
    tag = "free-quizzes"
)]
pub async fn delete_free_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_object_id(&id)?;

    state
        .free_quizzes
        .delete(&id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete free quiz {}: {}", id, e);
            e
        })?
        .ok_or_else(not_found)?;
    state.cache.clear(CACHE_KEY);

    tracing::info!("Free quiz {} deleted", id);
    Ok(Json(json!({ "message": "Free quiz deleted successfully" })))
}
