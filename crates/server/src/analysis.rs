//! Spreadsheet analysis pass.
//!
//! The analysis itself is a placeholder: it produces a structurally
//! complete report (summary, statistics, insights) without reading the
//! workbook contents, so the rest of the pipeline (report documents,
//! status transitions, retention) can be exercised end to end.

use serde_json::{Value, json};
use thiserror::Error;

/// Errors from the analysis pass.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The payload is not a workbook we accept.
    #[error("unsupported file: {0}")]
    Unsupported(String),
}

/// Spreadsheet extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Returns `true` if `filename` carries an accepted spreadsheet
/// extension.
#[must_use]
pub fn is_spreadsheet(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Analyze a workbook payload and return the results document.
///
/// TODO: replace the placeholder result below with the real workbook
/// analysis once the analysis engine lands.
pub fn analyze_spreadsheet(filename: &str, content: &[u8]) -> Result<Value, AnalysisError> {
    if content.is_empty() {
        return Err(AnalysisError::Unsupported("empty file".to_owned()));
    }

    Ok(json!({
        "summary": {
            "filename": filename,
            "file_size_bytes": content.len(),
        },
        "statistics": {},
        "insights": [
            "This is a placeholder analysis result.",
            format!("The file is {} bytes.", content.len()),
        ],
    }))
}
