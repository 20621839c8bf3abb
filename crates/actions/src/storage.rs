use async_trait::async_trait;
use deckhand_core::config::{AwsConfig, StorageConfig};
use deckhand_core::ApplicationError;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use secrecy::ExposeSecret;
use tracing::info;

/// Durable object storage: one put plus a time-bounded retrieval link.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ApplicationError>;

    /// Presigned GET link for a stored key, valid for the configured window.
    async fn presigned_url(&self, key: &str) -> Result<String, ApplicationError>;
}

pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    presign_expiry_secs: u32,
}

impl S3ObjectStore {
    pub fn from_config(aws: &AwsConfig, storage: &StorageConfig) -> Result<Self, ApplicationError> {
        if storage.bucket.is_empty() {
            return Err(ApplicationError::Configuration("storage.bucket is not set".to_string()));
        }

        let region: Region = aws
            .region
            .parse()
            .map_err(|error| ApplicationError::Configuration(format!("aws.region: {error}")))?;
        let credentials = Credentials::new(
            Some(aws.access_key_id.as_str()),
            Some(aws.secret_access_key.expose_secret()),
            None,
            aws.session_token.as_ref().map(|token| token.expose_secret()),
            None,
        )
        .map_err(|error| ApplicationError::Configuration(format!("aws credentials: {error}")))?;
        let bucket = Bucket::new(&storage.bucket, region, credentials)
            .map_err(|error| ApplicationError::Configuration(format!("storage.bucket: {error}")))?;

        Ok(Self { bucket: Box::new(bucket), presign_expiry_secs: storage.presign_expiry_secs })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ApplicationError> {
        let response = self
            .bucket
            .put_object(key, bytes)
            .await
            .map_err(|error| ApplicationError::Storage(error.to_string()))?;
        if response.status_code() != 200 {
            return Err(ApplicationError::Storage(format!(
                "put of `{key}` returned status {}",
                response.status_code()
            )));
        }

        info!(
            event_name = "actions.storage.object_stored",
            key = %key,
            byte_count = bytes.len(),
            "stored deck artifact"
        );
        Ok(())
    }

    async fn presigned_url(&self, key: &str) -> Result<String, ApplicationError> {
        self.bucket
            .presign_get(key, self.presign_expiry_secs, None)
            .await
            .map_err(|error| ApplicationError::Storage(error.to_string()))
    }
}
