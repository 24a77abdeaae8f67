//! Sequential attachment upload
//!
//! Files are uploaded one at a time, in input order. The first failure aborts
//! the batch; objects uploaded before it are left in place (orphaned).

use rand::Rng;
use std::sync::Arc;

use super::ObjectStore;
use crate::data::Attachment;
use crate::error::AppError;

const TOKEN_LEN: usize = 6;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub data: Vec<u8>,
    /// Original file name
    pub name: String,
    /// MIME type
    pub content_type: String,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            data,
            name: name.into(),
            content_type: content_type.into(),
        }
    }
}

/// Text after the last `.`; a name without a dot is returned whole
fn file_extension(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// `{millis}-{base36 token}.{extension}`
fn storage_key(name: &str) -> String {
    format!(
        "{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        random_token(),
        file_extension(name)
    )
}

/// Uploads attachment batches to an [`ObjectStore`]
pub struct AttachmentUploader {
    store: Arc<dyn ObjectStore>,
    /// Logical folder, e.g. "posts"
    prefix: String,
}

impl AttachmentUploader {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Upload `files` in order and describe each uploaded object
    ///
    /// # Returns
    /// One attachment per file, in input order
    ///
    /// # Errors
    /// `AppError::Upload` naming the first file that failed. Earlier files
    /// of the batch are not removed.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<Attachment>, AppError> {
        use crate::metrics::{
            MEDIA_BYTES_UPLOADED, MEDIA_UPLOAD_FAILURES_TOTAL, MEDIA_UPLOADS_TOTAL,
        };

        let total = files.len();
        let mut attachments = Vec::with_capacity(total);

        for (index, file) in files.into_iter().enumerate() {
            let path = format!("{}/{}", self.prefix, storage_key(&file.name));
            let size = file.data.len();

            if let Err(source) = self
                .store
                .upload(&path, file.data, &file.content_type)
                .await
            {
                MEDIA_UPLOAD_FAILURES_TOTAL.inc();
                tracing::warn!(
                    index,
                    name = %file.name,
                    path = %path,
                    orphaned = attachments.len(),
                    error = %source,
                    "Attachment upload failed; earlier uploads of this batch remain stored"
                );
                return Err(AppError::Upload {
                    index,
                    name: file.name,
                    source,
                }
                .record("upload_attachments"));
            }

            MEDIA_UPLOADS_TOTAL.inc();
            MEDIA_BYTES_UPLOADED.inc_by(size as f64);
            tracing::debug!(index, path = %path, bytes = size, "Attachment uploaded");

            attachments.push(Attachment {
                url: self.store.public_url(&path),
                content_type: file.content_type,
                name: file.name,
            });
        }

        if total > 0 {
            tracing::info!(count = total, "Attachment batch uploaded");
        }

        Ok(attachments)
    }
}
