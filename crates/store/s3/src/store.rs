use async_trait::async_trait;
use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use secrecy::ExposeSecret;
use tracing::{debug, error};

use coffre_store::{ObjectStore, StoreError};

use crate::config::S3Config;

/// S3-backed implementation of [`ObjectStore`].
///
/// Objects land in a single bucket; keys are used verbatim. `NoSuchKey`
/// on read maps to `Ok(None)`, deleting a nonexistent key succeeds
/// (native S3 semantics), and prefix listings follow continuation
/// tokens until the enumeration is complete.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from explicit configuration.
    #[must_use]
    pub fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.expose_secret().to_owned(),
            None,
            None,
            "coffre-config",
        );

        // A hung connection becomes a transport error, not a stalled
        // request.
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .operation_attempt_timeout(Duration::from_secs(10))
            .build();

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .timeout_config(timeouts)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }

    /// Wrap a pre-built client (for tests).
    #[must_use]
    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                error!(key, error = %DisplayErrorContext(&e), "S3 put_object failed");
                StoreError::Transport(format!("put {key}: {}", DisplayErrorContext(&e)))
            })?;
        debug!(key, size, "object stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return Ok(None);
                }
                error!(key, error = %DisplayErrorContext(&e), "S3 get_object failed");
                return Err(StoreError::Transport(format!(
                    "get {key}: {}",
                    DisplayErrorContext(&e)
                )));
            }
        };

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Transport(format!("reading body of {key}: {e}")))?
            .into_bytes();
        debug!(key, size = bytes.len(), "object fetched");
        Ok(Some(bytes))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        // S3 delete_object succeeds for keys that do not exist, which
        // gives us idempotent delete for free.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!(key, error = %DisplayErrorContext(&e), "S3 delete_object failed");
                StoreError::Transport(format!("delete {key}: {}", DisplayErrorContext(&e)))
            })?;
        debug!(key, "object deleted");
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        // A single listing response is capped (1000 keys); follow
        // continuation tokens until the enumeration is complete.
        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let page = request.send().await.map_err(|e| {
                error!(prefix, error = %DisplayErrorContext(&e), "S3 list_objects_v2 failed");
                StoreError::Transport(format!("list {prefix}: {}", DisplayErrorContext(&e)))
            })?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_owned)),
            );

            if page.is_truncated() == Some(true) {
                continuation_token = page.next_continuation_token().map(str::to_owned);
                if continuation_token.is_none() {
                    // Truncated response without a token; stop rather
                    // than loop forever.
                    break;
                }
            } else {
                break;
            }
        }

        debug!(prefix, count = keys.len(), "prefix listed");
        Ok(keys)
    }
}
