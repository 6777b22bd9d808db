// src/routes.rs

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    error::ErrorBody,
    handlers::{auth, free_quiz, health, score_match_batch},
    models::{
        common::ExamType,
        free_quiz::{Difficulty, QuizPdf, QuizType},
        score_match_batch::BatchType,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login,
        free_quiz::list_free_quizzes,
        free_quiz::get_free_quiz,
        free_quiz::create_free_quiz,
        free_quiz::update_free_quiz,
        free_quiz::delete_free_quiz,
        score_match_batch::list_batches,
        score_match_batch::get_batch,
        score_match_batch::create_batch,
        score_match_batch::update_batch,
        score_match_batch::delete_batch,
    ),
    components(schemas(ErrorBody, ExamType, Difficulty, QuizType, QuizPdf, BatchType)),
    modifiers(&JwtAuth),
    tags(
        (name = "free-quizzes", description = "Free practice quizzes (link or PDF)"),
        (name = "score-match-batches", description = "Score match coaching batches"),
        (name = "auth", description = "Admin login"),
    )
)]
pub struct ApiDoc;

struct JwtAuth;

impl Modify for JwtAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::HeaderName::from_static("x-total-count")])
}

/// Assembles the main application router.
///
/// * Public reads and admin-only writes for each resource.
/// * Applies global middleware (Trace, CORS, body limit).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let auth_routes = Router::new().route("/login", post(auth::login));

    let free_quiz_routes = Router::new()
        .route("/", get(free_quiz::list_free_quizzes))
        .route("/{id}", get(free_quiz::get_free_quiz))
        .merge(
            Router::new()
                .route("/", post(free_quiz::create_free_quiz))
                .route(
                    "/{id}",
                    patch(free_quiz::update_free_quiz)
                        .put(free_quiz::update_free_quiz)
                        .delete(free_quiz::delete_free_quiz),
                )
                // Auth first, then Admin check
                .route_layer(middleware::from_fn(admin_middleware))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let batch_routes = Router::new()
        .route("/", get(score_match_batch::list_batches))
        .route("/{id}", get(score_match_batch::get_batch))
        .merge(
            Router::new()
                .route("/", post(score_match_batch::create_batch))
                .route(
                    "/{id}",
                    put(score_match_batch::update_batch)
                        .patch(score_match_batch::update_batch)
                        .delete(score_match_batch::delete_batch),
                )
                .route_layer(middleware::from_fn(admin_middleware))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .nest("/api/free-quizzes", free_quiz_routes)
        .nest("/api/score-match-batches", batch_routes)
        // Global Middleware (applied from outside in)
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
