//! Registration, login, and profile handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::auth::AuthUser;

use super::schemas::{LoginRequest, ProfileResponse, RegisterRequest, TokenResponse};
use super::{ApiError, AppState};

const MIN_PASSWORD_LEN: usize = 8;

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email address".to_owned()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("full name is required".to_owned()));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_registration(&req)?;

    let user = state
        .registry
        .register(&req.email, &req.password, &req.full_name)
        .await?;
    let token = state
        .jwt
        .issue(&user.user_id)
        .map_err(|e| ApiError::Internal(Box::new(e)))?;

    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .registry
        .authenticate(&req.email, &req.password)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    let token = state
        .jwt
        .issue(&user.user_id)
        .map_err(|e| ApiError::Internal(Box::new(e)))?;

    Ok(Json(TokenResponse::bearer(token)))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .registry
        .get_user(&user.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(profile.into()))
}
