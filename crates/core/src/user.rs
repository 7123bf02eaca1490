//! User profile and the singleton users index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// A registered user, stored at `users/{user_id}/profile.json`.
///
/// Profiles are immutable after registration. Field names match the
/// stored JSON of existing deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier (UUID-v4, assigned at registration).
    pub user_id: String,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Argon2 password hash. Never returned to clients.
    pub hashed_password: String,
    /// When the account was created.
    pub created_at: Timestamp,
}

/// Singleton email -> user-id index, stored at `users/index.json`.
///
/// Serves as the registration existence check and as the enumeration
/// source for "all known users". Invariant: every value corresponds to
/// an existing profile document; the registration path writes the
/// profile before the index entry so a partial failure can only leave
/// an orphaned profile, never a dangling index entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersIndex {
    /// Email address mapped to user id.
    pub users: BTreeMap<String, String>,
}

impl UsersIndex {
    /// Returns `true` if an account exists for `email`.
    #[must_use]
    pub fn contains_email(&self, email: &str) -> bool {
        self.users.contains_key(email)
    }

    /// Look up the user id registered for `email`.
    #[must_use]
    pub fn user_id_for(&self, email: &str) -> Option<&str> {
        self.users.get(email).map(String::as_str)
    }

    /// Record a registration.
    pub fn insert(&mut self, email: impl Into<String>, user_id: impl Into<String>) {
        self.users.insert(email.into(), user_id.into());
    }

    /// All known user ids, in index order.
    #[must_use]
    pub fn user_ids(&self) -> Vec<String> {
        self.users.values().cloned().collect()
    }
}
