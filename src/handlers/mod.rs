// src/handlers/mod.rs

pub mod auth;
pub mod free_quiz;
pub mod health;
pub mod score_match_batch;

use axum::{
    extract::{FromRequest, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    cache::{CacheLayer, CachedList},
    db::{ListQuery, Resource, Store},
    error::AppError,
    models::common::PageWindow,
};

/// `axum::Json`, but body rejections surface as `AppError::BadRequest`
/// so every client error has the same `{message}` shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

fn list_response(entry: CachedList, cache_status: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (X_CACHE, HeaderValue::from_static(cache_status)),
            (X_TOTAL_COUNT, HeaderValue::from(entry.total)),
        ],
        entry.body,
    )
        .into_response()
}

/// Serves a list endpoint through the response cache.
///
/// On a miss the store is queried, each model converted to its response DTO
/// `R`, and the serialized array cached under `resource:<filter>[:page]`
/// unless `resource` was cleared while the store was being read.
pub(crate) async fn cached_list<T, R>(
    store: &dyn Store<T>,
    cache: &dyn CacheLayer,
    resource: &str,
    query: ListQuery,
    window: PageWindow,
) -> Result<Response, AppError>
where
    T: Resource,
    R: From<T> + Serialize,
{
    let key = window.cache_key(resource, &query.filter);
    if let Some(hit) = cache.get(&key) {
        tracing::debug!("Cache hit for {}", key);
        return Ok(list_response(hit, "HIT"));
    }

    // Taken before the read so a write landing mid-query keeps this body out of the cache.
    let generation = cache.generation(resource);

    let items = store.list(&query).await.map_err(|e| {
        tracing::error!("Failed to list {}: {}", resource, e);
        e
    })?;

    let total = match window.limit {
        Some(_) => store.count(&query.filter).await?,
        None => items.len() as u64,
    };

    let items: Vec<R> = items.into_iter().map(R::from).collect();
    let body = serde_json::to_vec(&items).map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let entry = CachedList::new(total, body);
    cache.put(resource, key, entry.clone(), generation);
    Ok(list_response(entry, "MISS"))
}
