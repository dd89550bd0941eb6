use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Connection settings for the S3-compatible object store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Store endpoint, e.g. `https://s3.ap-southeast-1.amazonaws.com` or a
    /// MinIO address.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Bucket holding uploaded product images.
    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    /// Lifetime of presigned URLs.
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
}

impl StorageConfig {
    /// Load from `VITRINE_STORAGE_*` environment variables.
    pub fn from_env() -> Result<Self, StorageError> {
        let mut cfg = Self::default();
        if let Ok(endpoint) = std::env::var("VITRINE_STORAGE_ENDPOINT") {
            cfg.endpoint = endpoint;
        }
        if let Ok(region) = std::env::var("VITRINE_STORAGE_REGION") {
            cfg.region = region;
        }
        if let Ok(bucket) = std::env::var("VITRINE_STORAGE_BUCKET") {
            cfg.bucket = bucket;
        }
        if let Ok(key) = std::env::var("VITRINE_STORAGE_ACCESS_KEY") {
            cfg.access_key = key;
        }
        if let Ok(key) = std::env::var("VITRINE_STORAGE_SECRET_KEY") {
            cfg.secret_key = key;
        }
        if let Ok(secs) = std::env::var("VITRINE_STORAGE_PRESIGN_EXPIRY_SECS") {
            cfg.presign_expiry_secs = secs.parse().map_err(|_| {
                StorageError::InvalidConfig("presign expiry must be an integer".into())
            })?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        if self.endpoint.trim().is_empty() {
            return Err(StorageError::InvalidConfig("endpoint is required".into()));
        }
        if self.bucket.trim().is_empty() {
            return Err(StorageError::InvalidConfig("bucket is required".into()));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(StorageError::InvalidConfig(
                "access_key and secret_key are required".into(),
            ));
        }
        if self.presign_expiry_secs == 0 {
            return Err(StorageError::InvalidConfig(
                "presign expiry must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            presign_expiry_secs: default_presign_expiry_secs(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_presign_expiry_secs() -> u64 {
    300
}
