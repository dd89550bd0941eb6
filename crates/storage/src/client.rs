//! Presigning and transfer against the object store.

use std::sync::Arc;
use std::time::Duration;

use rusty_s3::{Bucket, Credentials, S3Action, UrlStyle};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::Result;

/// A presigned PUT the browser can upload an image to directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresignedUpload {
    pub upload_url: String,
    /// Object key to hand back to the caption endpoint later.
    pub key: String,
}

/// Client for the S3-compatible object store.
///
/// Signing happens locally (presigned URLs); the only traffic this process
/// generates itself is the download on the caption path.
#[derive(Debug, Clone)]
pub struct StorageClient {
    config: Arc<StorageConfig>,
    bucket: Bucket,
    credentials: Credentials,
    client: reqwest::Client,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;

        let endpoint = config
            .endpoint
            .parse()
            .map_err(|e| StorageError::InvalidConfig(format!("invalid endpoint: {e}")))?;
        let bucket = Bucket::new(
            endpoint,
            UrlStyle::Path,
            config.bucket.clone(),
            config.region.clone(),
        )
        .map_err(|e| StorageError::InvalidConfig(format!("invalid bucket: {e}")))?;
        let credentials = Credentials::new(config.access_key.clone(), config.secret_key.clone());

        Ok(Self {
            config: Arc::new(config),
            bucket,
            credentials,
            client: reqwest::Client::new(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(StorageConfig::from_env()?)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn expiry(&self) -> Duration {
        Duration::from_secs(self.config.presign_expiry_secs)
    }

    /// Mint a time-limited upload URL under a fresh `uploads/` key.
    ///
    /// The UUID prefix keeps concurrent uploads of identically named files
    /// from clobbering each other.
    pub fn presign_upload(&self, file_name: &str, content_type: &str) -> PresignedUpload {
        let key = format!("uploads/{}-{}", uuid::Uuid::new_v4(), file_name);

        let mut action = self.bucket.put_object(Some(&self.credentials), &key);
        action.headers_mut().insert("content-type", content_type);
        let url = action.sign(self.expiry());

        tracing::debug!(key = %key, "presigned upload URL issued");
        PresignedUpload {
            upload_url: url.to_string(),
            key,
        }
    }

    /// Fetch object bytes via a presigned GET.
    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let action = self.bucket.get_object(Some(&self.credentials), key);
        let url = action.sign(self.expiry());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(StorageError::ObjectMissing(key.to_string()));
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(512)
                .collect();
            return Err(StorageError::Store {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(key = %key, bytes = bytes.len(), "object downloaded");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(endpoint: &str) -> StorageClient {
        StorageClient::new(StorageConfig {
            endpoint: endpoint.to_string(),
            region: "us-east-1".into(),
            bucket: "vitrine-uploads".into(),
            access_key: "AKIA".into(),
            secret_key: "secret".into(),
            presign_expiry_secs: 300,
        })
        .unwrap()
    }

    #[test]
    fn presigned_uploads_get_unique_namespaced_keys() {
        let client = test_client("https://s3.example.com");

        let a = client.presign_upload("dress.jpg", "image/jpeg");
        let b = client.presign_upload("dress.jpg", "image/jpeg");

        assert!(a.key.starts_with("uploads/"));
        assert!(a.key.ends_with("-dress.jpg"));
        assert_ne!(a.key, b.key);
        assert!(a.upload_url.contains("vitrine-uploads"));
        assert!(a.upload_url.contains("X-Amz-Signature"));
    }

    #[tokio::test]
    async fn download_returns_object_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/vitrine-uploads/uploads/abc-dress.jpg")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(b"jpeg-bytes".as_slice())
            .create_async()
            .await;

        let client = test_client(&server.url());
        let bytes = client.download("uploads/abc-dress.jpg").await.unwrap();
        assert_eq!(bytes, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn missing_object_is_a_typed_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/vitrine-uploads/uploads/ghost.jpg")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.download("uploads/ghost.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::ObjectMissing(_)));
    }
}
