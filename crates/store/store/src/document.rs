//! JSON document layer over the encrypted blob store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::blob::EncryptedBlobStore;
use crate::error::StoreError;

/// Persists structured records as encrypted JSON objects.
///
/// Records are serialized to UTF-8 JSON, then encrypted and stored by
/// logical key. Loading a key that was never written yields `Ok(None)`;
/// a stored object that decrypts but does not parse as the expected
/// record is [`StoreError::Document`]; corruption is never silently
/// reported as absence.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    blobs: EncryptedBlobStore,
}

impl DocumentStore {
    /// Build a document layer over an encrypted blob store.
    #[must_use]
    pub fn new(blobs: EncryptedBlobStore) -> Self {
        Self { blobs }
    }

    /// The underlying encrypted blob store, for raw payload objects.
    #[must_use]
    pub fn blobs(&self) -> &EncryptedBlobStore {
        &self.blobs
    }

    /// Serialize `value` to JSON and store it encrypted under `key`.
    #[instrument(skip(self, value))]
    pub async fn save_document<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_vec(value).map_err(|e| StoreError::Document {
            key: key.to_owned(),
            reason: format!("serialize: {e}"),
        })?;
        self.blobs.put(key, &json).await
    }

    /// Load and parse the document at `key`.
    #[instrument(skip(self))]
    pub async fn load_document<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let Some(bytes) = self.blobs.get(key).await? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Document {
            key: key.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Some(value))
    }

    /// Delete the document at `key`. Idempotent.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.blobs.delete(key).await
    }

    /// Enumerate all keys starting with `prefix`.
    pub async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.blobs.list_prefix(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use coffre_crypto::{BlobCipher, MasterKey};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::testing::EphemeralStore;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u64,
        tags: Vec<String>,
    }

    fn docs() -> DocumentStore {
        let raw = Arc::new(EphemeralStore::default());
        let cipher = BlobCipher::new(MasterKey::from_bytes([5u8; 32]));
        DocumentStore::new(EncryptedBlobStore::new(raw, cipher))
    }

    #[tokio::test]
    async fn document_round_trip() {
        let docs = docs();
        let record = Record {
            name: "q3".into(),
            count: 42,
            tags: vec!["a".into(), "b".into()],
        };
        docs.save_document("r/1.json", &record).await.unwrap();
        let loaded: Record = docs.load_document("r/1.json").await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn absent_document_is_none_not_error() {
        let docs = docs();
        let loaded: Option<Record> = docs.load_document("never/written.json").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn malformed_document_is_loud_error() {
        let docs = docs();
        // Well-encrypted, but not the expected record shape.
        docs.blobs().put("r/1.json", b"[1, 2, 3]").await.unwrap();
        let err = docs.load_document::<Record>("r/1.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Document { .. }));
    }

    #[tokio::test]
    async fn delete_then_load_is_absent() {
        let docs = docs();
        docs.save_document("r/1.json", &serde_json::json!({"x": 1}))
            .await
            .unwrap();
        docs.delete("r/1.json").await.unwrap();
        let loaded: Option<serde_json::Value> = docs.load_document("r/1.json").await.unwrap();
        assert!(loaded.is_none());
    }
}
