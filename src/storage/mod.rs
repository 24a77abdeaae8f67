//! Attachment storage module
//!
//! Handles:
//! - The object store interface (path-based upload, public URLs)
//! - Cloudflare R2 and in-memory backends
//! - Sequential upload of attachment batches

use async_trait::async_trait;

use crate::error::StoreError;

mod media;
mod memory;
mod uploader;

pub use media::MediaStorage;
pub use memory::{MemoryObjectStore, StoredObject};
pub use uploader::{AttachmentUploader, UploadFile};

/// Binary blob storage addressed by path
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path`
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Public URL of an object; valid once its upload succeeded
    fn public_url(&self, path: &str) -> String;
}

pub(crate) fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
