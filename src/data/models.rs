//! Data models
//!
//! `RawPostRecord` is what a store hands back; `Post` is the canonical,
//! normalized shape callers see. All IDs are ULIDs and all timestamps are
//! chrono UTC values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Post
// =============================================================================

/// A post with its author summary and attachments
///
/// Built atomically from one store record by [`Post::from_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Owner reference (author's user ID)
    pub user_id: String,
    /// In upload order
    pub attachments: Vec<Attachment>,
    /// In extraction order, duplicates kept
    pub hashtags: Vec<String>,
    pub like_count: u64,
    /// Always 0: comments are not tracked by the store yet
    pub comment_count: u64,
    pub author: AuthorSummary,
}

/// Uploaded file descriptor stored with a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Public URL
    pub url: String,
    /// MIME type of the source file
    #[serde(rename = "type")]
    pub content_type: String,
    /// Original file name (not the storage key)
    pub name: String,
}

/// Author profile embedded in a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

// =============================================================================
// Store records
// =============================================================================

/// Post record as returned by a store, joined with the author profile
///
/// `attachment_urls` and `hashtags` are whatever JSON the store holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPostRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub attachment_urls: serde_json::Value,
    pub hashtags: serde_json::Value,
    pub like_count: Option<i64>,
    pub profile: Option<AuthorSummary>,
}

/// Record handed to the store on insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewPostRecord {
    pub title: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub attachment_urls: Vec<Attachment>,
    pub user_id: String,
    pub like_count: u64,
}

impl Post {
    /// Validate and normalize a store record
    ///
    /// - non-array `attachment_urls` / `hashtags` become empty lists
    /// - array elements of the wrong shape are dropped
    /// - missing or negative `like_count` becomes 0
    /// - `comment_count` is always 0
    ///
    /// # Errors
    /// Returns `StoreError::Schema` if the author profile is missing
    pub fn from_record(record: RawPostRecord) -> Result<Self, StoreError> {
        let author = record.profile.ok_or_else(|| {
            StoreError::Schema(format!("post {} has no author profile", record.id))
        })?;

        let attachments = coerce_list(&record.id, "attachment_urls", record.attachment_urls);
        let hashtags = coerce_list(&record.id, "hashtags", record.hashtags);
        let like_count = record
            .like_count
            .and_then(|count| u64::try_from(count).ok())
            .unwrap_or(0);

        Ok(Self {
            id: record.id,
            title: record.title,
            content: record.content,
            created_at: record.created_at,
            user_id: record.user_id,
            attachments,
            hashtags,
            like_count,
            comment_count: 0,
            author,
        })
    }
}

fn coerce_list<T: serde::de::DeserializeOwned>(
    post_id: &str,
    field: &str,
    value: serde_json::Value,
) -> Vec<T> {
    let serde_json::Value::Array(items) = value else {
        return Vec::new();
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if parsed.len() < total {
        tracing::warn!(
            post_id = %post_id,
            field = %field,
            dropped = total - parsed.len(),
            "Dropped malformed list elements from post record"
        );
    }

    parsed
}
