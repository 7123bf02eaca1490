//! Test support: backend conformance suite and fault injection.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::store::ObjectStore;

/// Run the full object-store conformance test suite.
///
/// Call this from a backend's test module with a fresh, empty store.
///
/// # Errors
///
/// Returns an error if any conformance check fails.
pub async fn run_object_store_conformance(store: &dyn ObjectStore) -> Result<(), StoreError> {
    test_get_missing(store).await?;
    test_put_get_round_trip(store).await?;
    test_put_overwrites(store).await?;
    test_delete_idempotent(store).await?;
    test_list_prefix_exact(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn ObjectStore) -> Result<(), StoreError> {
    let got = store.get("conformance/missing").await?;
    assert!(got.is_none(), "get on a never-written key should be None");
    Ok(())
}

async fn test_put_get_round_trip(store: &dyn ObjectStore) -> Result<(), StoreError> {
    store
        .put("conformance/round-trip", Bytes::from_static(b"payload"))
        .await?;
    let got = store.get("conformance/round-trip").await?;
    assert_eq!(got.as_deref(), Some(&b"payload"[..]));
    Ok(())
}

async fn test_put_overwrites(store: &dyn ObjectStore) -> Result<(), StoreError> {
    store
        .put("conformance/overwrite", Bytes::from_static(b"v1"))
        .await?;
    store
        .put("conformance/overwrite", Bytes::from_static(b"v2"))
        .await?;
    let got = store.get("conformance/overwrite").await?;
    assert_eq!(got.as_deref(), Some(&b"v2"[..]), "put must overwrite");
    Ok(())
}

async fn test_delete_idempotent(store: &dyn ObjectStore) -> Result<(), StoreError> {
    store
        .put("conformance/delete", Bytes::from_static(b"x"))
        .await?;
    store.delete("conformance/delete").await?;
    assert!(store.get("conformance/delete").await?.is_none());
    // Deleting the same (now absent) key again must also succeed.
    store.delete("conformance/delete").await?;
    store.delete("conformance/never-existed").await?;
    Ok(())
}

async fn test_list_prefix_exact(store: &dyn ObjectStore) -> Result<(), StoreError> {
    for i in 0..5 {
        store
            .put(&format!("conformance/list/{i}"), Bytes::from_static(b"x"))
            .await?;
    }
    store
        .put("conformance/other", Bytes::from_static(b"x"))
        .await?;

    let mut keys = store.list_prefix("conformance/list/").await?;
    keys.sort();
    let expected: Vec<String> = (0..5).map(|i| format!("conformance/list/{i}")).collect();
    assert_eq!(keys, expected, "listing must be exact (no extras, no gaps)");

    let none = store.list_prefix("conformance/empty-prefix/").await?;
    assert!(none.is_empty());
    Ok(())
}

/// Minimal in-process [`ObjectStore`] for unit tests in crates that
/// cannot depend on the memory backend (it would be a dependency
/// cycle). Production test setups should prefer `coffre-store-memory`.
#[derive(Debug, Default)]
pub struct EphemeralStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

#[async_trait]
impl ObjectStore for EphemeralStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        self.objects
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .insert(key.to_owned(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self
            .objects
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .get(key)
            .cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .remove(key);
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .objects
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Fault-injecting wrapper: fails any operation whose key contains the
/// configured fragment, passing everything else through. Used to test
/// that multi-key passes (the retention sweep in particular) tolerate
/// partial failure.
pub struct FailingStore<S> {
    inner: S,
    deny_fragment: String,
}

impl<S> FailingStore<S> {
    /// Wrap `inner`, failing operations on keys containing `fragment`.
    pub fn new(inner: S, fragment: impl Into<String>) -> Self {
        Self {
            inner,
            deny_fragment: fragment.into(),
        }
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if key.contains(&self.deny_fragment) {
            return Err(StoreError::Transport(format!(
                "injected failure for key {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for FailingStore<S> {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.put(key, body).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.delete(key).await
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_prefix(prefix).await
    }
}
