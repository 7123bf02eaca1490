use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// A flat key/value object store holding raw (already encrypted) bytes.
///
/// Keys form a single flat namespace; the "/"-delimited hierarchy used
/// by callers is a naming convention, not something the store
/// enforces. Implementations must be `Send + Sync` and safe for
/// concurrent use; every operation may block on network I/O.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StoreError>;

    /// Fetch the object at `key`. Returns `Ok(None)` if no object
    /// exists there; transport failures are errors, never `None`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Delete the object at `key`. Idempotent: deleting a nonexistent
    /// key succeeds and has no effect.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Enumerate every key that starts with `prefix`, in no particular
    /// order. Implementations must drive any backend paging
    /// (continuation tokens) to exhaustion and return the full set.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<T> {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        (**self).put(key, body).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key).await
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_prefix(prefix).await
    }
}
