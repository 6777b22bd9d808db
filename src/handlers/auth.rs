// src/handlers/auth.rs

use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    error::{AppError, ErrorBody},
    handlers::AppJson,
    models::auth::{LoginRequest, LoginResponse},
    state::AppState,
    utils::{
        hash::verify_password,
        jwt::{ADMIN_ROLE, sign_jwt},
    },
};

/// Authenticates the admin and returns a JWT token.
///
/// The same 401 is returned for an unknown username and a wrong password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token", body = LoginResponse),
        (status = 401, description = "Bad credentials", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::AuthError("Invalid username or password".to_string());

    if payload.validate().is_err() {
        return Err(invalid());
    }

    let admin = state.admin.as_ref().ok_or_else(invalid)?;

    if payload.username != admin.username
        || !verify_password(&payload.password, &admin.password_hash)?
    {
        tracing::warn!("Rejected admin login for '{}'", payload.username);
        return Err(invalid());
    }

    let token = sign_jwt(
        &admin.username,
        ADMIN_ROLE,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    tracing::info!("Admin '{}' logged in", admin.username);
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration,
    }))
}
