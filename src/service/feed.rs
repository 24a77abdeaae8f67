//! Feed service
//!
//! Read pipeline: select every post with its author and normalize it.

use std::sync::Arc;

use crate::data::{Post, PostStore};
use crate::error::AppError;

/// Feed service
pub struct FeedService {
    store: Arc<dyn PostStore>,
}

impl FeedService {
    /// Create new feed service
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Fetch the whole post list, newest first
    ///
    /// Read-only and idempotent; no retry is attempted here.
    ///
    /// Records that cannot be normalized (no author profile) are logged and
    /// left out of the list.
    ///
    /// # Errors
    /// `AppError::Query` carrying the store failure
    pub async fn fetch_posts(&self) -> Result<Vec<Post>, AppError> {
        let records = self.store.select_posts().await.map_err(|e| {
            tracing::error!(error = %e, "Post list query failed");
            AppError::Query(e).record("fetch_posts")
        })?;

        let posts: Vec<Post> = records
            .into_iter()
            .filter_map(|record| match Post::from_record(record) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed post record");
                    None
                }
            })
            .collect();

        tracing::debug!(count = posts.len(), "Post list fetched");

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AuthorSummary, MockPostStore, RawPostRecord};
    use crate::error::StoreError;
    use chrono::Utc;
    use serde_json::json;

    fn raw(id: &str, attachment_urls: serde_json::Value) -> RawPostRecord {
        RawPostRecord {
            id: id.to_string(),
            title: "title".to_string(),
            content: "content".to_string(),
            created_at: Utc::now(),
            user_id: "user-1".to_string(),
            attachment_urls,
            hashtags: json!(["a"]),
            like_count: Some(2),
            profile: Some(AuthorSummary {
                id: "user-1".to_string(),
                username: "alice".to_string(),
                avatar_url: None,
            }),
        }
    }

    #[tokio::test]
    async fn test_fetch_normalizes_every_record() {
        let mut store = MockPostStore::new();
        store.expect_select_posts().returning(|| {
            Ok(vec![
                raw("missing", serde_json::Value::Null),
                raw("object", json!({"url": "u"})),
                raw("array", json!([{"url": "u", "type": "t", "name": "n"}])),
            ])
        });

        let posts = FeedService::new(Arc::new(store)).fetch_posts().await.unwrap();

        assert_eq!(posts.len(), 3);
        assert!(posts[0].attachments.is_empty());
        assert!(posts[1].attachments.is_empty());
        assert_eq!(posts[2].attachments.len(), 1);
        assert!(posts.iter().all(|post| post.comment_count == 0));
    }

    #[tokio::test]
    async fn test_fetch_preserves_store_order() {
        let mut store = MockPostStore::new();
        store
            .expect_select_posts()
            .returning(|| Ok(vec![raw("new", json!([])), raw("old", json!([]))]));

        let posts = FeedService::new(Arc::new(store)).fetch_posts().await.unwrap();
        let ids: Vec<_> = posts.iter().map(|post| post.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
    }

    #[tokio::test]
    async fn test_store_failure_is_a_query_error() {
        let mut store = MockPostStore::new();
        store
            .expect_select_posts()
            .times(1)
            .returning(|| Err(StoreError::Storage("timeout".to_string())));

        let error = FeedService::new(Arc::new(store))
            .fetch_posts()
            .await
            .expect_err("store failure must propagate");
        assert!(matches!(error, AppError::Query(StoreError::Storage(msg)) if msg == "timeout"));
    }

    #[tokio::test]
    async fn test_record_without_author_is_skipped() {
        let mut store = MockPostStore::new();
        store.expect_select_posts().returning(|| {
            let mut orphan = raw("orphan", json!([]));
            orphan.profile = None;
            Ok(vec![raw("new", json!([])), orphan, raw("old", json!([]))])
        });

        let posts = FeedService::new(Arc::new(store)).fetch_posts().await.unwrap();
        let ids: Vec<_> = posts.iter().map(|post| post.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
    }
}
