//! HTTP surface: router, shared state, and the error-to-status mapping.

mod files;
mod schemas;
mod users;

use std::sync::Arc;

use axum::Json;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::auth::JwtManager;
use crate::files::{FileError, FileService};
use crate::registry::{RegistryError, UserRegistry};

/// Shared handler state. Cloning is cheap; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtManager>,
    pub registry: Arc<UserRegistry>,
    pub files: Arc<FileService>,
}

/// API-level errors with their HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("not authenticated")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("email already registered")]
    EmailTaken,

    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal causes are logged, never leaked to the client.
        if let Self::Internal(source) = &self {
            error!(error = %source, "request failed");
        }
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::AlreadyExists => Self::EmailTaken,
            other => Self::Internal(Box::new(other)),
        }
    }
}

impl From<FileError> for ApiError {
    fn from(e: FileError) -> Self {
        match e {
            FileError::InvalidFilename(reason) => Self::BadRequest(reason),
            FileError::NotFound => Self::NotFound,
            FileError::Store(store) => Self::Internal(Box::new(store)),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, allowed_origins: &[String]) -> axum::Router {
    let cors = cors_layer(allowed_origins);

    axum::Router::new()
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/me", get(users::me))
        .route("/api/upload", post(files::upload))
        .route("/api/files", get(files::list))
        .route("/api/files/{file_id}/report", get(files::report))
        .route("/api/files/{file_id}", delete(files::remove))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
