//! Object-key scheme for the flat store namespace.
//!
//! The "/"-delimited hierarchy is a naming convention only; the backing
//! store is a flat keyspace. This layout is the persisted-state format
//! of existing deployments and must not change:
//!
//! ```text
//! users/index.json
//! users/{user_id}/profile.json
//! users/{user_id}/files/{file_id}/{filename}
//! users/{user_id}/files/{file_id}/metadata.json
//! users/{user_id}/files/{file_id}/report.json
//! ```

/// Fixed suffix of every file-metadata key.
///
/// Listing `file_prefix(user_id)` and filtering by this suffix yields
/// exactly one key per stored file, regardless of how many sibling
/// objects (payload, report) share the same folder-like prefix.
pub const METADATA_SUFFIX: &str = "/metadata.json";

/// Key of the singleton email -> user-id index document.
#[must_use]
pub fn users_index_key() -> String {
    "users/index.json".to_owned()
}

/// Key of a user's profile document.
#[must_use]
pub fn user_profile_key(user_id: &str) -> String {
    format!("users/{user_id}/profile.json")
}

/// Common prefix of every object belonging to a user's files.
#[must_use]
pub fn file_prefix(user_id: &str) -> String {
    format!("users/{user_id}/files/")
}

/// Key of the encrypted raw payload of an uploaded file.
#[must_use]
pub fn file_payload_key(user_id: &str, file_id: &str, filename: &str) -> String {
    format!("users/{user_id}/files/{file_id}/{filename}")
}

/// Key of a file's metadata document.
#[must_use]
pub fn file_metadata_key(user_id: &str, file_id: &str) -> String {
    format!("users/{user_id}/files/{file_id}/metadata.json")
}

/// Key of a file's analysis report document.
#[must_use]
pub fn file_report_key(user_id: &str, file_id: &str) -> String {
    format!("users/{user_id}/files/{file_id}/report.json")
}

/// Returns `true` if `key` addresses a file-metadata document.
#[must_use]
pub fn is_metadata_key(key: &str) -> bool {
    key.ends_with(METADATA_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_stable() {
        assert_eq!(users_index_key(), "users/index.json");
        assert_eq!(user_profile_key("u1"), "users/u1/profile.json");
        assert_eq!(file_prefix("u1"), "users/u1/files/");
        assert_eq!(
            file_payload_key("u1", "f1", "report.xlsx"),
            "users/u1/files/f1/report.xlsx"
        );
        assert_eq!(file_metadata_key("u1", "f1"), "users/u1/files/f1/metadata.json");
        assert_eq!(file_report_key("u1", "f1"), "users/u1/files/f1/report.json");
    }

    #[test]
    fn metadata_keys_start_with_file_prefix() {
        let key = file_metadata_key("u1", "f1");
        assert!(key.starts_with(&file_prefix("u1")));
        assert!(is_metadata_key(&key));
    }

    #[test]
    fn metadata_filter_excludes_siblings() {
        assert!(!is_metadata_key(&file_report_key("u1", "f1")));
        assert!(!is_metadata_key(&file_payload_key("u1", "f1", "data.xlsx")));
        // A payload whose filename happens to be metadata.json would
        // collide with the metadata document itself; the filter treats
        // it as metadata, which is why the upload path rejects it.
        assert!(is_metadata_key(&file_payload_key("u1", "f1", "metadata.json")));
    }
}
