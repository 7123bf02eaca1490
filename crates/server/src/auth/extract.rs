use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;

use crate::api::{ApiError, AppState};

/// Extractor for the authenticated user id.
///
/// Reads `Authorization: Bearer <token>` and validates the token with
/// the app's [`JwtManager`](crate::auth::JwtManager). Handlers taking
/// an `AuthUser` argument reject unauthenticated requests with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The validated user id from the token subject.
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let user_id = app.jwt.verify(token).ok_or(ApiError::Unauthorized)?;
        Ok(Self { user_id })
    }
}
