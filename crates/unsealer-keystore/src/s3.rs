//! AWS S3 keystore — one object per key in a bucket.
//!
//! The bucket is expected to be dedicated (or namespaced via the object
//! prefix) and protected by bucket policy plus SSE; this backend does no
//! client-side encryption of its own.
//!
//! Region resolution: an explicit region wins, otherwise the SDK default
//! provider chain is used, which covers `AWS_REGION`, shared config, and the
//! EC2 instance-metadata service.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use crate::{KeyStore, KeyStoreError};

/// A keystore backed by an S3 bucket.
#[derive(Clone)]
pub struct S3KeyStore {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl std::fmt::Debug for S3KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3KeyStore")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl S3KeyStore {
    /// Connect to S3 using the default credential chain.
    ///
    /// `region` overrides the chain's region resolution when set; `prefix`
    /// is prepended to every object key as `{prefix}/{key}`.
    pub async fn connect(bucket: String, prefix: Option<String>, region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let config = loader.load().await;
        debug!(bucket = %bucket, region = ?config.region(), "connected to S3 keystore");
        Self {
            client: Client::new(&config),
            bucket,
            prefix,
        }
    }

    /// Build from an already-constructed SDK client. Used by tests and
    /// callers with custom credential setups.
    #[must_use]
    pub fn with_client(client: Client, bucket: String, prefix: Option<String>) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    fn object_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_owned(),
        }
    }
}

#[async_trait::async_trait]
impl KeyStore for S3KeyStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, KeyStoreError> {
        let object_key = self.object_key(key);
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await;

        let output = match resp {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return Err(KeyStoreError::NotFound {
                        key: key.to_owned(),
                    });
                }
                return Err(KeyStoreError::Read {
                    key: key.to_owned(),
                    reason: DisplayErrorContext(&err).to_string(),
                });
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| KeyStoreError::Read {
                key: key.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(body.into_bytes().to_vec())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), KeyStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .body(ByteStream::from(value.to_vec()))
            .send()
            .await
            .map_err(|e| KeyStoreError::Write {
                key: key.to_owned(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        // S3 DeleteObject on an absent key succeeds, matching the trait's
        // idempotency requirement.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| KeyStoreError::Delete {
                key: key.to_owned(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_applies_prefix() {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let client = Client::from_conf(config);

        let bare = S3KeyStore::with_client(client.clone(), "bucket".to_owned(), None);
        assert_eq!(bare.object_key("prod-root"), "prod-root");

        let prefixed = S3KeyStore::with_client(
            client,
            "bucket".to_owned(),
            Some("unsealer".to_owned()),
        );
        assert_eq!(prefixed.object_key("prod-root"), "unsealer/prod-root");
    }
}
