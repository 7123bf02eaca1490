//! Upload, listing, report, and delete handlers.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;

use coffre_core::AnalysisReport;

use crate::auth::AuthUser;

use super::schemas::{FileListResponse, UploadResponse};
use super::{ApiError, AppState};

pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    // First field named "file" wins; anything else is ignored.
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(ToOwned::to_owned)
            .ok_or_else(|| ApiError::BadRequest("file field has no filename".to_owned()))?;
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let metadata = state
            .files
            .upload(&user.user_id, &filename, &content)
            .await?;
        return Ok((StatusCode::CREATED, Json(metadata.into())));
    }

    Err(ApiError::BadRequest("missing \"file\" field".to_owned()))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.files.list_files(&user.user_id).await?;
    Ok(Json(FileListResponse { files }))
}

pub async fn report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let report = state
        .files
        .get_report(&user.user_id, &file_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(report))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.files.delete_file(&user.user_id, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
