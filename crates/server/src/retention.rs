//! Retention sweeper: removes files whose upload date is older than
//! the configured retention window.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use coffre_core::{FileMetadata, Timestamp, keys};
use coffre_store::DocumentStore;

use crate::files::FileService;
use crate::registry::UserRegistry;

/// Outcome of one sweep pass.
#[derive(Debug, Clone)]
pub struct CleanupSummary {
    /// Files whose object triple was removed.
    pub deleted: usize,
    /// Files that could not be examined or removed.
    pub errors: usize,
    /// The boundary used for this pass. A file is removed only when
    /// its upload date is strictly before the cutoff.
    pub cutoff: Timestamp,
}

/// Sweeps expired files across all users.
pub struct RetentionSweeper {
    docs: Arc<DocumentStore>,
    registry: Arc<UserRegistry>,
    files: Arc<FileService>,
    retention_days: u32,
}

impl RetentionSweeper {
    #[must_use]
    pub fn new(
        docs: Arc<DocumentStore>,
        registry: Arc<UserRegistry>,
        files: Arc<FileService>,
        retention_days: u32,
    ) -> Self {
        Self {
            docs,
            registry,
            files,
            retention_days,
        }
    }

    /// Run one full sweep pass and report what happened.
    ///
    /// Failures are absorbed per file and per user: an unreadable
    /// metadata document or a failed delete is counted in `errors` and
    /// the pass continues, so one bad object never blocks the rest of
    /// the store from being swept.
    #[instrument(skip(self))]
    pub async fn run_cleanup(&self) -> CleanupSummary {
        let cutoff =
            Timestamp::from_datetime(Utc::now() - chrono::Duration::days(i64::from(self.retention_days)));
        let mut summary = CleanupSummary {
            deleted: 0,
            errors: 0,
            cutoff: cutoff.clone(),
        };

        let user_ids = match self.registry.all_user_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "retention sweep could not enumerate users");
                summary.errors += 1;
                return summary;
            }
        };

        for user_id in user_ids {
            self.sweep_user(&user_id, &cutoff, &mut summary).await;
        }

        info!(
            deleted = summary.deleted,
            errors = summary.errors,
            cutoff = %summary.cutoff,
            "retention sweep finished"
        );
        summary
    }

    async fn sweep_user(&self, user_id: &str, cutoff: &Timestamp, summary: &mut CleanupSummary) {
        let prefix = keys::file_prefix(user_id);
        let listing = match self.docs.list_prefix(&prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(user_id, error = %e, "retention sweep could not list user files");
                summary.errors += 1;
                return;
            }
        };

        for key in listing.into_iter().filter(|k| keys::is_metadata_key(k)) {
            let metadata = match self.docs.load_document::<FileMetadata>(&key).await {
                Ok(Some(metadata)) => metadata,
                Ok(None) => continue, // deleted since the listing
                Err(e) => {
                    warn!(key, error = %e, "retention sweep skipping unreadable metadata");
                    summary.errors += 1;
                    continue;
                }
            };

            if metadata.upload_date >= *cutoff {
                continue;
            }

            match self.files.delete_file(user_id, &metadata.file_id).await {
                Ok(()) => {
                    info!(user_id, file_id = metadata.file_id, "expired file removed");
                    summary.deleted += 1;
                }
                Err(e) => {
                    warn!(user_id, file_id = metadata.file_id, error = %e, "expired file delete failed");
                    summary.errors += 1;
                }
            }
        }
    }
}

impl std::fmt::Debug for RetentionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionSweeper")
            .field("retention_days", &self.retention_days)
            .finish_non_exhaustive()
    }
}

/// Run the sweeper on a fixed interval until the task is dropped.
pub async fn sweep_loop(sweeper: Arc<RetentionSweeper>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it so startup is quiet.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        sweeper.run_cleanup().await;
    }
}

#[cfg(test)]
mod tests {
    use coffre_crypto::{BlobCipher, MasterKey};
    use coffre_store::testing::FailingStore;
    use coffre_store::{EncryptedBlobStore, ObjectStore};
    use coffre_store_memory::MemoryObjectStore;

    use super::*;

    fn stack(raw: Arc<dyn ObjectStore>) -> (Arc<DocumentStore>, Arc<UserRegistry>, Arc<FileService>) {
        let cipher = BlobCipher::new(MasterKey::from_bytes([7u8; 32]));
        let docs = Arc::new(DocumentStore::new(EncryptedBlobStore::new(raw, cipher)));
        let registry = Arc::new(UserRegistry::new(Arc::clone(&docs)));
        let files = Arc::new(FileService::new(Arc::clone(&docs)));
        (docs, registry, files)
    }

    async fn backdate(
        docs: &DocumentStore,
        user_id: &str,
        file_id: &str,
        upload_date: &str,
    ) {
        let key = keys::file_metadata_key(user_id, file_id);
        let mut metadata: FileMetadata = docs.load_document(&key).await.unwrap().unwrap();
        metadata.upload_date = Timestamp::parse(upload_date).unwrap();
        docs.save_document(&key, &metadata).await.unwrap();
    }

    #[tokio::test]
    async fn removes_expired_and_keeps_fresh_files() {
        let (docs, registry, files) = stack(Arc::new(MemoryObjectStore::new()));
        let user = registry
            .register("a@example.com", "pw", "Ada")
            .await
            .unwrap();

        let old = files.upload(&user.user_id, "old.xlsx", b"x").await.unwrap();
        let fresh = files.upload(&user.user_id, "new.xlsx", b"y").await.unwrap();
        backdate(&docs, &user.user_id, &old.file_id, "2020-01-01T00:00:00").await;

        let sweeper = RetentionSweeper::new(docs.clone(), registry, Arc::clone(&files), 60);
        let summary = sweeper.run_cleanup().await;

        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.errors, 0);
        assert!(files
            .get_metadata(&user.user_id, &old.file_id)
            .await
            .unwrap()
            .is_none());
        assert!(files
            .get_report(&user.user_id, &old.file_id)
            .await
            .unwrap()
            .is_none());
        assert!(docs.blobs().get(&old.file_key).await.unwrap().is_none());
        assert!(files
            .get_metadata(&user.user_id, &fresh.file_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn file_exactly_at_cutoff_is_kept() {
        let (docs, registry, files) = stack(Arc::new(MemoryObjectStore::new()));
        let user = registry
            .register("a@example.com", "pw", "Ada")
            .await
            .unwrap();
        let file = files.upload(&user.user_id, "edge.xlsx", b"x").await.unwrap();

        let sweeper = RetentionSweeper::new(docs.clone(), registry, Arc::clone(&files), 60);
        // Pin the metadata to exactly the cutoff the next pass will use.
        let cutoff = Timestamp::from_datetime(Utc::now() - chrono::Duration::days(60));
        let key = keys::file_metadata_key(&user.user_id, &file.file_id);
        let mut metadata: FileMetadata = docs.load_document(&key).await.unwrap().unwrap();
        metadata.upload_date = cutoff;
        docs.save_document(&key, &metadata).await.unwrap();

        let summary = sweeper.run_cleanup().await;
        assert_eq!(summary.deleted, 0);
        assert!(files
            .get_metadata(&user.user_id, &file.file_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn one_broken_file_does_not_stop_the_pass() {
        let mem = Arc::new(MemoryObjectStore::new());
        let (docs, registry, files) = stack(Arc::clone(&mem) as Arc<dyn ObjectStore>);
        let user = registry
            .register("a@example.com", "pw", "Ada")
            .await
            .unwrap();

        let broken = files.upload(&user.user_id, "broken.xlsx", b"x").await.unwrap();
        let expired = files.upload(&user.user_id, "expired.xlsx", b"y").await.unwrap();
        backdate(&docs, &user.user_id, &broken.file_id, "2020-01-01T00:00:00").await;
        backdate(&docs, &user.user_id, &expired.file_id, "2020-01-01T00:00:00").await;

        // Sweep through a wrapper that fails every operation touching
        // the broken file's objects. Same backing store, same key.
        let failing: Arc<dyn ObjectStore> =
            Arc::new(FailingStore::new(Arc::clone(&mem), broken.file_id.clone()));
        let (docs2, registry2, files2) = stack(failing);
        let sweeper = RetentionSweeper::new(docs2, registry2, Arc::clone(&files2), 60);
        let summary = sweeper.run_cleanup().await;

        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.errors, 1);
        assert!(files
            .get_metadata(&user.user_id, &expired.file_id)
            .await
            .unwrap()
            .is_none());
        assert!(files
            .get_metadata(&user.user_id, &broken.file_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn failure_for_one_user_does_not_stop_other_users() {
        let mem = Arc::new(MemoryObjectStore::new());
        let (docs, registry, files) = stack(Arc::clone(&mem) as Arc<dyn ObjectStore>);
        let a = registry
            .register("a@example.com", "pw-eight", "Ada")
            .await
            .unwrap();
        let b = registry
            .register("b@example.com", "pw-eight", "Bea")
            .await
            .unwrap();

        let file_a = files.upload(&a.user_id, "a.xlsx", b"x").await.unwrap();
        let file_b = files.upload(&b.user_id, "b.xlsx", b"y").await.unwrap();
        backdate(&docs, &a.user_id, &file_a.file_id, "2020-01-01T00:00:00").await;
        backdate(&docs, &b.user_id, &file_b.file_id, "2020-01-01T00:00:00").await;

        // Every object under user A's namespace fails; the pass must
        // still reach user B.
        let failing: Arc<dyn ObjectStore> =
            Arc::new(FailingStore::new(Arc::clone(&mem), a.user_id.clone()));
        let (docs2, registry2, files2) = stack(failing);
        let sweeper = RetentionSweeper::new(docs2, registry2, files2, 60);
        let summary = sweeper.run_cleanup().await;

        assert_eq!(summary.deleted, 1);
        assert!(summary.errors >= 1);
        assert!(files
            .get_metadata(&b.user_id, &file_b.file_id)
            .await
            .unwrap()
            .is_none());
        assert!(files
            .get_metadata(&a.user_id, &file_a.file_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn empty_registry_sweeps_nothing() {
        let (docs, registry, files) = stack(Arc::new(MemoryObjectStore::new()));
        let sweeper = RetentionSweeper::new(docs, registry, files, 60);
        let summary = sweeper.run_cleanup().await;
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.errors, 0);
    }
}
