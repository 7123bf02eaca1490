//! Request and response bodies for the JSON API.

use serde::{Deserialize, Serialize};

use coffre_core::{FileMetadata, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// A user profile as returned to the client. Never carries the
/// password hash.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub created_at: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    pub status: String,
}

impl From<FileMetadata> for UploadResponse {
    fn from(metadata: FileMetadata) -> Self {
        Self {
            file_id: metadata.file_id,
            filename: metadata.filename,
            status: metadata.status.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileMetadata>,
}
