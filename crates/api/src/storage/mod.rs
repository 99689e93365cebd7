//! Face image blob storage.
//!
//! The database row keeps the object key; the store owns the bytes and
//! hands back the public URL.

pub mod local;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use manta_core::types::DbId;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

use crate::config::StorageConfig;

/// Longest file extension kept from an uploaded filename.
const MAX_EXTENSION_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    S3(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` and return the URL clients fetch it from.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Remove the object. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Object key for a new face image: `{org}/{person_hash}_{uuid}{ext}`.
///
/// Characters outside `[A-Za-z0-9_-]` are dropped from the hash so the key
/// is always a two-segment relative path.
pub fn face_object_key(organization_id: DbId, person_hash: &str, filename: Option<&str>) -> String {
    let hash: String = person_hash
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    let ext = filename
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    format!("{organization_id}/{hash}_{}{ext}", uuid::Uuid::new_v4())
}

/// Build the configured blob store.
pub async fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config {
        StorageConfig::Local { path, public_url } => {
            let store = LocalBlobStore::open(path.clone(), public_url.clone()).await?;
            Ok(Arc::new(store))
        }
        StorageConfig::S3(s3) => Ok(Arc::new(S3BlobStore::connect(s3).await?)),
    }
}
