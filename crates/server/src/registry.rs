//! User registry over the document store.
//!
//! Registration, login, and user enumeration all revolve around two
//! kinds of documents: the singleton email -> user-id index at
//! `users/index.json` and one immutable profile per user.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use coffre_core::{Timestamp, User, UsersIndex, keys};
use coffre_store::{DocumentStore, StoreError};

use crate::auth::password::{hash_password, verify_password};

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An account already exists for the email.
    #[error("user with this email already exists")]
    AlreadyExists,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates, authenticates, and enumerates users.
///
/// The users index is read-modify-write with no conditional-write
/// support in the store, so every index mutation is serialized through
/// a single-writer mutex: two concurrent registrations with distinct
/// emails must both survive, and a duplicate email must be rejected
/// deterministically.
pub struct UserRegistry {
    docs: Arc<DocumentStore>,
    index_writer: Mutex<()>,
}

impl UserRegistry {
    /// Build a registry over the document store.
    #[must_use]
    pub fn new(docs: Arc<DocumentStore>) -> Self {
        Self {
            docs,
            index_writer: Mutex::new(()),
        }
    }

    /// Register a new account.
    ///
    /// Writes the profile document first and the index entry second,
    /// so a partial failure can leave an orphaned profile but never an
    /// index entry pointing at a missing profile.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, RegistryError> {
        // Single writer for the whole read-modify-write cycle.
        let _guard = self.index_writer.lock().await;

        let mut index: UsersIndex = self
            .docs
            .load_document(&keys::users_index_key())
            .await?
            .unwrap_or_default();

        if index.contains_email(email) {
            return Err(RegistryError::AlreadyExists);
        }

        let user = User {
            user_id: Uuid::new_v4().to_string(),
            email: email.to_owned(),
            full_name: full_name.to_owned(),
            hashed_password: hash_password(password)
                .map_err(|e| RegistryError::Hash(e.to_string()))?,
            created_at: Timestamp::now(),
        };

        self.docs
            .save_document(&keys::user_profile_key(&user.user_id), &user)
            .await?;

        index.insert(email, user.user_id.clone());
        self.docs
            .save_document(&keys::users_index_key(), &index)
            .await?;

        info!(user_id = %user.user_id, "user registered");
        Ok(user)
    }

    /// Authenticate by email and password.
    ///
    /// Returns `Ok(None)` for an unknown email, a missing profile, or
    /// a wrong password; the caller cannot tell which, on purpose.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, RegistryError> {
        let Some(index) = self
            .docs
            .load_document::<UsersIndex>(&keys::users_index_key())
            .await?
        else {
            return Ok(None);
        };
        let Some(user_id) = index.user_id_for(email) else {
            return Ok(None);
        };

        let Some(user) = self.get_user(user_id).await? else {
            // Index entry without a profile violates the registry
            // invariant; shout, but present it as a failed login.
            warn!(user_id, "users index points at a missing profile");
            return Ok(None);
        };

        if verify_password(&user.hashed_password, password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Load a user profile by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, RegistryError> {
        Ok(self
            .docs
            .load_document(&keys::user_profile_key(user_id))
            .await?)
    }

    /// All user ids known to the index.
    ///
    /// The enumeration source for the retention sweep; an absent index
    /// means no users have ever registered.
    pub async fn all_user_ids(&self) -> Result<Vec<String>, RegistryError> {
        let index: UsersIndex = self
            .docs
            .load_document(&keys::users_index_key())
            .await?
            .unwrap_or_default();
        Ok(index.user_ids())
    }
}

impl std::fmt::Debug for UserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegistry").finish_non_exhaustive()
    }
}
