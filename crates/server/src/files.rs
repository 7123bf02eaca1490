//! File service: the upload/analyze pipeline, listing, reports, and
//! deletion of a file's object triple (payload, metadata, report).

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use coffre_core::{AnalysisReport, FileMetadata, FileStatus, Timestamp, keys};
use coffre_store::{DocumentStore, StoreError};

use crate::analysis::{analyze_spreadsheet, is_spreadsheet};

/// Errors from file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// The filename is not an acceptable spreadsheet name.
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    /// No file with this id belongs to the user.
    #[error("file not found")]
    NotFound,

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Manages a user's uploaded files and their derived documents.
pub struct FileService {
    docs: Arc<DocumentStore>,
}

impl FileService {
    /// Build a file service over the document store.
    #[must_use]
    pub fn new(docs: Arc<DocumentStore>) -> Self {
        Self { docs }
    }

    fn validate_filename(filename: &str) -> Result<(), FileError> {
        if filename.contains('/') || filename.contains('\\') {
            return Err(FileError::InvalidFilename(
                "filename must not contain path separators".to_owned(),
            ));
        }
        if !is_spreadsheet(filename) {
            return Err(FileError::InvalidFilename(
                "only Excel files (.xlsx, .xls) are allowed".to_owned(),
            ));
        }
        Ok(())
    }

    /// Store an uploaded spreadsheet and run the analysis pass.
    ///
    /// Writes the encrypted payload, then the metadata in `processing`,
    /// then runs analysis. On success the report document is written
    /// and the metadata transitions to `completed`; if analysis or the
    /// report save fails, it transitions to `failed` with the error
    /// message. Both states are terminal.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload(
        &self,
        user_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<FileMetadata, FileError> {
        Self::validate_filename(filename)?;

        let file_id = Uuid::new_v4().to_string();
        let file_key = keys::file_payload_key(user_id, &file_id, filename);
        let metadata_key = keys::file_metadata_key(user_id, &file_id);

        self.docs.blobs().put(&file_key, content).await?;

        let mut metadata = FileMetadata {
            file_id: file_id.clone(),
            filename: filename.to_owned(),
            user_id: user_id.to_owned(),
            upload_date: Timestamp::now(),
            file_size: content.len() as u64,
            status: FileStatus::Processing,
            file_key,
            analysis_date: None,
            error: None,
        };
        self.docs.save_document(&metadata_key, &metadata).await?;

        match analyze_spreadsheet(filename, content) {
            Ok(results) => {
                let report = AnalysisReport {
                    file_id: file_id.clone(),
                    filename: filename.to_owned(),
                    analysis_date: Timestamp::now(),
                    results,
                };
                // A failed report save marks the file failed rather
                // than propagating; `processing` must never be the
                // final state of an upload.
                match self
                    .docs
                    .save_document(&keys::file_report_key(user_id, &file_id), &report)
                    .await
                {
                    Ok(()) => {
                        metadata.status = FileStatus::Completed;
                        metadata.analysis_date = Some(report.analysis_date);
                    }
                    Err(e) => {
                        warn!(file_id, error = %e, "report save failed");
                        metadata.status = FileStatus::Failed;
                        metadata.error = Some(e.to_string());
                    }
                }
            }
            Err(e) => {
                warn!(file_id, error = %e, "analysis failed");
                metadata.status = FileStatus::Failed;
                metadata.error = Some(e.to_string());
            }
        }
        self.docs.save_document(&metadata_key, &metadata).await?;

        info!(file_id, status = %metadata.status, "file uploaded");
        Ok(metadata)
    }

    /// List a user's files, most recent upload first.
    ///
    /// Enumerates metadata keys under the user's file prefix. A
    /// metadata document that cannot be read is logged and skipped so
    /// one bad entry does not hide the rest of the listing.
    #[instrument(skip(self))]
    pub async fn list_files(&self, user_id: &str) -> Result<Vec<FileMetadata>, FileError> {
        let prefix = keys::file_prefix(user_id);
        let metadata_keys: Vec<String> = self
            .docs
            .list_prefix(&prefix)
            .await?
            .into_iter()
            .filter(|key| keys::is_metadata_key(key))
            .collect();

        let mut files = Vec::with_capacity(metadata_keys.len());
        for key in metadata_keys {
            match self.docs.load_document::<FileMetadata>(&key).await {
                Ok(Some(metadata)) => files.push(metadata),
                Ok(None) => {} // deleted between listing and load
                Err(e) => warn!(key, error = %e, "skipping unreadable file metadata"),
            }
        }

        files.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(files)
    }

    /// Load a single file's metadata.
    pub async fn get_metadata(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<FileMetadata>, FileError> {
        Ok(self
            .docs
            .load_document(&keys::file_metadata_key(user_id, file_id))
            .await?)
    }

    /// Load a file's analysis report, if one was produced.
    pub async fn get_report(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<AnalysisReport>, FileError> {
        Ok(self
            .docs
            .load_document(&keys::file_report_key(user_id, file_id))
            .await?)
    }

    /// Delete a file's object triple: payload, metadata, report.
    ///
    /// The report delete is unconditional: for a `failed` file no
    /// report was ever written and the delete is a no-op. Returns
    /// [`FileError::NotFound`] if the metadata document is absent.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, user_id: &str, file_id: &str) -> Result<(), FileError> {
        let metadata_key = keys::file_metadata_key(user_id, file_id);
        let metadata: FileMetadata = self
            .docs
            .load_document(&metadata_key)
            .await?
            .ok_or(FileError::NotFound)?;

        self.docs.blobs().delete(&metadata.file_key).await?;
        self.docs.delete(&metadata_key).await?;
        self.docs
            .delete(&keys::file_report_key(user_id, file_id))
            .await?;

        info!(file_id, "file deleted");
        Ok(())
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use coffre_crypto::{BlobCipher, MasterKey};
    use coffre_store::EncryptedBlobStore;
    use coffre_store_memory::MemoryObjectStore;

    use super::*;

    fn service() -> (Arc<DocumentStore>, FileService) {
        let raw = Arc::new(MemoryObjectStore::new());
        let cipher = BlobCipher::new(MasterKey::from_bytes([2u8; 32]));
        let docs = Arc::new(DocumentStore::new(EncryptedBlobStore::new(raw, cipher)));
        (Arc::clone(&docs), FileService::new(docs))
    }

    #[tokio::test]
    async fn upload_completes_and_writes_report() {
        let (docs, service) = service();
        let metadata = service
            .upload("u-1", "q3.xlsx", b"workbook bytes")
            .await
            .unwrap();

        assert_eq!(metadata.status, FileStatus::Completed);
        assert!(metadata.analysis_date.is_some());
        assert!(metadata.error.is_none());

        // Payload is retrievable and decrypts to the original bytes.
        let payload = docs.blobs().get(&metadata.file_key).await.unwrap().unwrap();
        assert_eq!(payload.as_ref(), b"workbook bytes");

        let report = service
            .get_report("u-1", &metadata.file_id)
            .await
            .unwrap()
            .expect("completed file has a report");
        assert_eq!(report.file_id, metadata.file_id);
        assert_eq!(report.results["summary"]["file_size_bytes"], 14);
    }

    #[tokio::test]
    async fn failed_analysis_is_terminal_with_error() {
        let (_docs, service) = service();
        // Empty payload makes the placeholder analysis fail.
        let metadata = service.upload("u-1", "empty.xlsx", b"").await.unwrap();

        assert_eq!(metadata.status, FileStatus::Failed);
        assert!(metadata.error.is_some());
        assert!(metadata.analysis_date.is_none());
        assert!(service
            .get_report("u-1", &metadata.file_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn failed_report_save_marks_file_failed_not_processing() {
        use coffre_store::ObjectStore;
        use coffre_store::testing::FailingStore;

        let raw: Arc<dyn ObjectStore> =
            Arc::new(FailingStore::new(MemoryObjectStore::new(), "report.json"));
        let cipher = BlobCipher::new(MasterKey::from_bytes([2u8; 32]));
        let service = FileService::new(Arc::new(DocumentStore::new(EncryptedBlobStore::new(
            raw, cipher,
        ))));

        let metadata = service.upload("u-1", "q3.xlsx", b"bytes").await.unwrap();
        assert_eq!(metadata.status, FileStatus::Failed);
        assert!(metadata.error.is_some());
        assert!(metadata.analysis_date.is_none());

        // The stored metadata agrees with the returned one.
        let listed = service.list_files("u-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, FileStatus::Failed);
        assert!(listed[0].error.is_some());
    }

    #[tokio::test]
    async fn rejects_non_spreadsheets_and_path_separators() {
        let (_docs, service) = service();
        assert!(matches!(
            service.upload("u-1", "notes.txt", b"x").await,
            Err(FileError::InvalidFilename(_))
        ));
        assert!(matches!(
            service.upload("u-1", "../../etc/passwd.xlsx", b"x").await,
            Err(FileError::InvalidFilename(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_sorted_most_recent_first() {
        let (docs, service) = service();
        let a = service.upload("u-1", "a.xlsx", b"a").await.unwrap();
        let b = service.upload("u-1", "b.xlsx", b"b").await.unwrap();

        // Force distinct, ordered upload dates.
        let mut older = a.clone();
        older.upload_date = Timestamp::parse("2026-01-01T00:00:00").unwrap();
        docs.save_document(&keys::file_metadata_key("u-1", &a.file_id), &older)
            .await
            .unwrap();
        let mut newer = b.clone();
        newer.upload_date = Timestamp::parse("2026-02-01T00:00:00").unwrap();
        docs.save_document(&keys::file_metadata_key("u-1", &b.file_id), &newer)
            .await
            .unwrap();

        let files = service.list_files("u-1").await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_id, b.file_id);
        assert_eq!(files[1].file_id, a.file_id);
    }

    #[tokio::test]
    async fn listing_ignores_other_users() {
        let (_docs, service) = service();
        service.upload("u-1", "a.xlsx", b"a").await.unwrap();
        service.upload("u-2", "b.xlsx", b"b").await.unwrap();

        let files = service.list_files("u-1").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "a.xlsx");
    }

    #[tokio::test]
    async fn delete_removes_the_whole_triple() {
        let (docs, service) = service();
        let metadata = service.upload("u-1", "a.xlsx", b"bytes").await.unwrap();

        service.delete_file("u-1", &metadata.file_id).await.unwrap();

        assert!(docs.blobs().get(&metadata.file_key).await.unwrap().is_none());
        assert!(service
            .get_metadata("u-1", &metadata.file_id)
            .await
            .unwrap()
            .is_none());
        assert!(service
            .get_report("u-1", &metadata.file_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_of_failed_file_tolerates_missing_report() {
        let (_docs, service) = service();
        let metadata = service.upload("u-1", "empty.xlsx", b"").await.unwrap();
        assert_eq!(metadata.status, FileStatus::Failed);
        // No report exists; the unconditional report delete is a no-op.
        service.delete_file("u-1", &metadata.file_id).await.unwrap();
    }

    #[tokio::test]
    async fn delete_unknown_file_is_not_found() {
        let (_docs, service) = service();
        assert!(matches!(
            service.delete_file("u-1", "missing").await,
            Err(FileError::NotFound)
        ));
    }
}
