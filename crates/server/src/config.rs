//! Server configuration.
//!
//! Loaded from a TOML file with secrets supplied (or overridden) by
//! environment variables:
//!
//! - `COFFRE_ENCRYPTION_KEY`: 32-byte master key, hex or base64
//! - `COFFRE_SECRET_KEY`: JWT signing secret
//! - `COFFRE_SECRET_ACCESS_KEY`: S3 secret access key

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoffreConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub retention: RetentionConfig,
}

/// HTTP bind and CORS settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Comma-separated list of allowed CORS origins.
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8000,
            allowed_origins: String::from("http://localhost:3000"),
        }
    }
}

impl ServerConfig {
    /// Parsed allowed-origins list.
    #[must_use]
    pub fn allowed_origins_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Remote object store settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Bucket name.
    pub bucket: String,
    /// Region (R2 accepts `"auto"`).
    pub region: Option<String>,
    /// Endpoint URL override (R2 account endpoint, MinIO).
    pub endpoint_url: Option<String>,
    /// Static access key id.
    pub access_key_id: String,
    /// Static secret access key; `COFFRE_SECRET_ACCESS_KEY` overrides.
    pub secret_access_key: Option<SecretString>,
    /// Path-style addressing for MinIO/LocalStack.
    pub force_path_style: bool,
}

/// Token issuance settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// JWT signing secret; `COFFRE_SECRET_KEY` overrides.
    pub secret_key: Option<SecretString>,
    /// Access token lifetime in hours.
    pub token_expiry_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            token_expiry_hours: 24,
        }
    }
}

/// Data retention settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    /// Files older than this many days are purged by the sweep.
    pub days: u32,
    /// Seconds between background sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: 60,
            sweep_interval_secs: 3600,
        }
    }
}

impl CoffreConfig {
    /// Load configuration from a TOML file. A missing file yields the
    /// defaults (secrets must then come from the environment).
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        if !std::path::Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Resolve the JWT signing secret (env overrides file).
    pub fn secret_key(&self) -> Result<SecretString, ConfigError> {
        if let Ok(raw) = std::env::var("COFFRE_SECRET_KEY") {
            return Ok(SecretString::new(raw));
        }
        self.auth
            .secret_key
            .clone()
            .ok_or(ConfigError::Missing("auth.secret_key (or COFFRE_SECRET_KEY)"))
    }

    /// Resolve the S3 secret access key (env overrides file).
    pub fn secret_access_key(&self) -> Result<SecretString, ConfigError> {
        if let Ok(raw) = std::env::var("COFFRE_SECRET_ACCESS_KEY") {
            return Ok(SecretString::new(raw));
        }
        self.storage.secret_access_key.clone().ok_or(ConfigError::Missing(
            "storage.secret_access_key (or COFFRE_SECRET_ACCESS_KEY)",
        ))
    }

    /// Resolve the raw (still encoded) blob encryption key.
    pub fn encryption_key(&self) -> Result<SecretString, ConfigError> {
        std::env::var("COFFRE_ENCRYPTION_KEY")
            .map(SecretString::new)
            .map_err(|_| ConfigError::Missing("COFFRE_ENCRYPTION_KEY"))
    }
}
