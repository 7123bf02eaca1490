//! Transparent encrypt-on-write / decrypt-on-read over an [`ObjectStore`].

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument};

use coffre_crypto::BlobCipher;

use crate::error::StoreError;
use crate::store::ObjectStore;

/// Encrypting wrapper around a raw [`ObjectStore`].
///
/// Every `put` encrypts under the process master key before upload and
/// every `get` decrypts after download; delete and prefix listing pass
/// through. Constructed explicitly at startup and shared by reference;
/// there is no ambient global client or cipher.
#[derive(Clone)]
pub struct EncryptedBlobStore {
    inner: Arc<dyn ObjectStore>,
    cipher: BlobCipher,
}

impl EncryptedBlobStore {
    /// Wrap a raw store with the given cipher.
    pub fn new(inner: Arc<dyn ObjectStore>, cipher: BlobCipher) -> Self {
        Self { inner, cipher }
    }

    /// Encrypt `plaintext` and store it under `key`, overwriting any
    /// existing object.
    #[instrument(skip(self, plaintext), fields(size = plaintext.len()))]
    pub async fn put(&self, key: &str, plaintext: &[u8]) -> Result<(), StoreError> {
        let encrypted = self
            .cipher
            .encrypt(plaintext)
            .map_err(|e| StoreError::Backend(format!("encrypting {key}: {e}")))?;
        self.inner.put(key, Bytes::from(encrypted)).await?;
        debug!(key, "encrypted object stored");
        Ok(())
    }

    /// Fetch and decrypt the object at `key`.
    ///
    /// Returns `Ok(None)` only when no object exists. An object that
    /// exists but fails to decrypt is [`StoreError::Decrypt`], never
    /// `None`; callers must be able to tell "never existed" from
    /// "exists but unreadable".
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let Some(encrypted) = self.inner.get(key).await? else {
            return Ok(None);
        };
        let plaintext = self
            .cipher
            .decrypt(&encrypted)
            .map_err(|source| StoreError::Decrypt {
                key: key.to_owned(),
                source,
            })?;
        Ok(Some(Bytes::from(plaintext)))
    }

    /// Delete the object at `key`. Idempotent.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    /// Enumerate all keys starting with `prefix` (complete, unordered).
    pub async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_prefix(prefix).await
    }
}

impl std::fmt::Debug for EncryptedBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBlobStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use coffre_crypto::MasterKey;

    use super::*;
    use crate::testing::EphemeralStore;

    fn blob_store() -> (Arc<EphemeralStore>, EncryptedBlobStore) {
        let raw = Arc::new(EphemeralStore::default());
        let cipher = BlobCipher::new(MasterKey::from_bytes([3u8; 32]));
        (raw.clone(), EncryptedBlobStore::new(raw, cipher))
    }

    #[tokio::test]
    async fn put_stores_ciphertext_not_plaintext() {
        let (raw, blobs) = blob_store();
        blobs.put("k", b"plain contents").await.unwrap();

        let stored = raw.get("k").await.unwrap().unwrap();
        assert_ne!(stored.as_ref(), b"plain contents");
        assert_eq!(&stored[..4], b"CFR1");

        let read_back = blobs.get("k").await.unwrap().unwrap();
        assert_eq!(read_back.as_ref(), b"plain contents");
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let (_raw, blobs) = blob_store();
        assert!(blobs.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_key_is_decrypt_error_not_absence() {
        let (raw, blobs) = blob_store();
        blobs.put("k", b"secret").await.unwrap();

        let other = EncryptedBlobStore::new(raw, BlobCipher::new(MasterKey::from_bytes([9u8; 32])));
        let err = other.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Decrypt { .. }));
    }

    #[tokio::test]
    async fn corrupted_object_is_decrypt_error() {
        let (raw, blobs) = blob_store();
        raw.put("k", Bytes::from_static(b"garbage that is long enough to pass"))
            .await
            .unwrap();
        let err = blobs.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Decrypt { .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_raw, blobs) = blob_store();
        blobs.put("k", b"x").await.unwrap();
        blobs.delete("k").await.unwrap();
        blobs.delete("k").await.unwrap();
        assert!(blobs.get("k").await.unwrap().is_none());
    }
}
