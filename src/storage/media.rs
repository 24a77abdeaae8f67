//! Media storage using Cloudflare R2
//!
//! Files are served via R2 Custom Domain (CDN).

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;

use super::{ObjectStore, build_r2_http_client};
use crate::error::StoreError;

/// Media storage service
///
/// Uploads attachments to Cloudflare R2 and resolves public URLs.
pub struct MediaStorage {
    /// S3-compatible client for R2
    client: S3Client,
    /// Media bucket name
    bucket: String,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

impl MediaStorage {
    /// Create new media storage client
    ///
    /// # Arguments
    /// * `config` - Storage configuration
    /// * `cloudflare` - Cloudflare credentials
    pub fn new(
        config: &crate::config::MediaStorageConfig,
        cloudflare: &crate::config::CloudflareConfig,
    ) -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

        let credentials = Credentials::new(
            &cloudflare.r2_access_key_id,
            &cloudflare.r2_secret_access_key,
            None,
            None,
            "postboard-r2",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(build_r2_http_client())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for MediaStorage {
    /// Upload one object
    ///
    /// # Example
    /// ```ignore
    /// storage.upload("posts/1717243200000-k3j9x2.png", data, "image/png").await?;
    /// let url = storage.public_url("posts/1717243200000-k3j9x2.png");
    /// // https://media.example.com/posts/1717243200000-k3j9x2.png
    /// ```
    async fn upload(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("R2 upload failed: {}", e)))?;

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url, path)
    }
}
