use secrecy::SecretString;

/// Configuration for the S3-compatible object store backend.
///
/// Credentials come from this config explicitly; the backend never
/// reads the ambient AWS environment or instance metadata. Works
/// against AWS S3, Cloudflare R2, and MinIO (set `endpoint_url`).
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,

    /// AWS region. R2 accepts `"auto"`.
    pub region: String,

    /// Optional endpoint URL override (R2 account endpoint, MinIO,
    /// LocalStack).
    pub endpoint_url: Option<String>,

    /// Static access key id.
    pub access_key_id: String,

    /// Static secret access key.
    pub secret_access_key: SecretString,

    /// Use path-style addressing (`endpoint/bucket/key`). Required by
    /// MinIO and most local S3 implementations.
    pub force_path_style: bool,
}

impl S3Config {
    /// Build a config for `bucket` with the given static credentials.
    pub fn new(
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: SecretString,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: String::from("auto"),
            endpoint_url: None,
            access_key_id: access_key_id.into(),
            secret_access_key,
            force_path_style: false,
        }
    }

    /// Set the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the endpoint URL override.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Enable path-style addressing.
    #[must_use]
    pub fn with_force_path_style(mut self, force: bool) -> Self {
        self.force_path_style = force;
        self
    }
}
