use thiserror::Error;

/// Errors from object store and document operations.
///
/// Absence is not an error: `get`/`load_document` return `Ok(None)`
/// for a key that was never written (or was deleted). The variants
/// here are the loud failures a caller must be able to tell apart
/// from absence, in particular a blob that exists but cannot be
/// decrypted, and a document that exists but cannot be parsed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote store could not be reached or rejected the request
    /// (network failure, auth rejection, rate limit).
    #[error("transport error: {0}")]
    Transport(String),

    /// The object at `key` exists but could not be decrypted: wrong
    /// master key or corrupted ciphertext.
    #[error("cannot decrypt object at {key}: {source}")]
    Decrypt {
        key: String,
        #[source]
        source: coffre_crypto::CryptoError,
    },

    /// The document at `key` decrypted but is not valid JSON for the
    /// expected record shape. Distinct from absence by contract: the
    /// registry and the sweeper depend on never mistaking corruption
    /// for "never written".
    #[error("malformed document at {key}: {reason}")]
    Document { key: String, reason: String },

    /// A backend-specific failure that is not a transport problem.
    #[error("backend error: {0}")]
    Backend(String),
}
