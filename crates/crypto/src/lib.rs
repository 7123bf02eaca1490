//! AES-256-GCM encryption for stored blobs.
//!
//! Every object written to the remote store is encrypted under one
//! process-wide symmetric key loaded at startup. The on-the-wire
//! envelope is binary:
//!
//! ```text
//! "CFR1" (4 bytes) || nonce (12 bytes) || ciphertext+tag
//! ```
//!
//! The nonce is random per call, so identical plaintexts produce
//! distinct ciphertexts; the store is keyed by logical name, not
//! content, so this does not affect addressing. The key is never
//! rotated at runtime and is never stored alongside objects: losing it
//! makes all stored data permanently unrecoverable.
//!
//! The [`MasterKey`] wrapper zeroizes key material on drop and has a
//! redacted `Debug` implementation.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Envelope magic: identifies a Coffre v1 encrypted blob.
const MAGIC: &[u8; 4] = b"CFR1";

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// A 32-byte AES-256 master key that is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; 32]);

impl MasterKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Errors that can occur during blob encryption/decryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The provided master key is not valid (wrong length or encoding).
    #[error("invalid master key: {0}")]
    InvalidKey(String),

    /// The encrypted blob is not a well-formed envelope.
    #[error("invalid encrypted blob: {0}")]
    InvalidFormat(String),

    /// Decryption failed: wrong key or corrupted data.
    #[error("decryption failed (wrong key or corrupted data)")]
    DecryptionFailed,

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
}

/// Parse a 32-byte master key from hex or base64.
///
/// Accepts either 64 hex characters or a base64 string that decodes to
/// exactly 32 bytes.
pub fn parse_master_key(raw: &str) -> Result<MasterKey, CryptoError> {
    let trimmed = raw.trim();
    // Try hex first (64 hex chars = 32 bytes).
    if trimmed.len() == 64
        && let Ok(bytes) = hex::decode(trimmed)
        && bytes.len() == 32
    {
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        return Ok(MasterKey(key));
    }
    // Try base64.
    if let Ok(bytes) = B64.decode(trimmed)
        && bytes.len() == 32
    {
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        return Ok(MasterKey(key));
    }
    Err(CryptoError::InvalidKey(
        "must be 32 bytes encoded as 64 hex chars or base64".to_owned(),
    ))
}

/// Encrypts and decrypts stored blobs under the process master key.
///
/// Cheap to clone; safe to share across concurrent operations (the key
/// is read-only after construction).
#[derive(Clone)]
pub struct BlobCipher {
    key: MasterKey,
}

impl BlobCipher {
    /// Create a cipher from a parsed master key.
    #[must_use]
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    fn aead(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(self.key.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(format!("invalid AES key: {e}")))
    }

    /// Encrypt a plaintext into a `CFR1` envelope.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.aead()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut out = Vec::with_capacity(MAGIC.len() + NONCE_LEN + ciphertext.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a `CFR1` envelope back into the plaintext.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < MAGIC.len() + NONCE_LEN + TAG_LEN {
            return Err(CryptoError::InvalidFormat(format!(
                "blob too short: {} bytes",
                blob.len()
            )));
        }
        let (magic, rest) = blob.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(CryptoError::InvalidFormat(
                "missing CFR1 envelope header".to_owned(),
            ));
        }
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let cipher = self.aead()?;
        let nonce = Nonce::from_slice(nonce_bytes);
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl fmt::Debug for BlobCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> MasterKey {
        MasterKey::from_bytes([7u8; 32])
    }

    #[test]
    fn round_trip() {
        let cipher = BlobCipher::new(test_key());
        for plaintext in [&b""[..], b"x", b"hello world", &[0u8; 4096]] {
            let blob = cipher.encrypt(plaintext).unwrap();
            assert_eq!(cipher.decrypt(&blob).unwrap(), plaintext);
        }
    }

    #[test]
    fn encryption_is_non_deterministic() {
        let cipher = BlobCipher::new(test_key());
        let a = cipher.encrypt(b"same input").unwrap();
        let b = cipher.encrypt(b"same input").unwrap();
        assert_ne!(a, b, "random nonce must vary per call");
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let blob = BlobCipher::new(test_key()).encrypt(b"secret").unwrap();
        let other = BlobCipher::new(MasterKey::from_bytes([8u8; 32]));
        assert!(matches!(
            other.decrypt(&blob),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let cipher = BlobCipher::new(test_key());
        let mut blob = cipher.encrypt(b"secret").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert!(matches!(
            cipher.decrypt(&blob),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn missing_header_is_invalid_format() {
        let cipher = BlobCipher::new(test_key());
        assert!(matches!(
            cipher.decrypt(b"not an envelope at all, definitely"),
            Err(CryptoError::InvalidFormat(_))
        ));
        assert!(matches!(
            cipher.decrypt(b"short"),
            Err(CryptoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn parse_master_key_hex_and_base64() {
        let hex_key = "00".repeat(32);
        assert!(parse_master_key(&hex_key).is_ok());

        let b64_key = B64.encode([1u8; 32]);
        assert!(parse_master_key(&b64_key).is_ok());

        assert!(parse_master_key("too short").is_err());
        assert!(parse_master_key(&B64.encode([1u8; 16])).is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let shown = format!("{:?}", test_key());
        assert!(shown.contains("REDACTED"));
    }
}
