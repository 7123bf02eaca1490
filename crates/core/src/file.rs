//! File metadata and analysis reports.

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Lifecycle state of an uploaded file.
///
/// The lifecycle is linear: `processing -> {completed, failed}`, both
/// terminal. The retention sweep deletes files past retention in any
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Payload stored, analysis not yet finished.
    Processing,
    /// Analysis succeeded and a report exists.
    Completed,
    /// Analysis failed; `error` on the metadata says why.
    Failed,
}

impl FileStatus {
    /// Stored string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata document for an uploaded file, stored at
/// `users/{user_id}/files/{file_id}/metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Opaque unique identifier (UUID-v4, assigned at upload).
    pub file_id: String,
    /// Original filename as uploaded.
    pub filename: String,
    /// Owning user.
    pub user_id: String,
    /// When the payload was stored.
    pub upload_date: Timestamp,
    /// Payload size in bytes (plaintext).
    pub file_size: u64,
    /// Lifecycle state.
    pub status: FileStatus,
    /// Object key of the encrypted payload.
    pub file_key: String,
    /// When analysis completed; set only in `completed` status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<Timestamp>,
    /// Why analysis failed; set only in `failed` status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Analysis report document, stored at
/// `users/{user_id}/files/{file_id}/report.json`.
///
/// At most one per file; exists iff the file reached `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// The file this report belongs to.
    pub file_id: String,
    /// Original filename, for display.
    pub filename: String,
    /// When the analysis ran.
    pub analysis_date: Timestamp,
    /// Opaque structured results payload.
    pub results: serde_json::Value,
}
