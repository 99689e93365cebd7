use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use super::{BlobStore, StorageError};
use crate::config::S3Config;

/// Stores blobs in an S3-compatible bucket.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    base_url: String,
}

impl S3BlobStore {
    /// Build a client with static credentials and create the bucket if missing.
    pub async fn connect(config: &S3Config) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "manta-static",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.use_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        if client.head_bucket().bucket(&config.bucket).send().await.is_err() {
            client
                .create_bucket()
                .bucket(&config.bucket)
                .send()
                .await
                .map_err(s3_error)?;
            tracing::info!(bucket = %config.bucket, "Created face image bucket");
        }

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            base_url: public_base_url(config),
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(s3_error)?;
        Ok(format!("{}/{key}", self.base_url))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(s3_error)?;
        Ok(())
    }
}

fn public_base_url(config: &S3Config) -> String {
    match &config.endpoint {
        Some(endpoint) => format!("{endpoint}/{}", config.bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region),
    }
}

fn s3_error<E: std::error::Error>(err: E) -> StorageError {
    StorageError::S3(DisplayErrorContext(err).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>) -> S3Config {
        S3Config {
            endpoint: endpoint.map(str::to_string),
            region: "ap-southeast-1".into(),
            bucket: "faces".into(),
            access_key: "k".into(),
            secret_key: "s".into(),
            use_path_style: true,
        }
    }

    #[test]
    fn base_url_uses_custom_endpoint() {
        assert_eq!(
            public_base_url(&config(Some("http://minio:9000"))),
            "http://minio:9000/faces"
        );
    }

    #[test]
    fn base_url_defaults_to_aws() {
        assert_eq!(
            public_base_url(&config(None)),
            "https://faces.s3.ap-southeast-1.amazonaws.com"
        );
    }
}
