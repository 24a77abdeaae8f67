//! Post service
//!
//! Create pipeline: session check → sequential attachment upload → insert →
//! post list invalidation. Each step gates the next.

use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::data::{NewPostRecord, POSTS_QUERY_KEY, Post, PostListCache, PostStore};
use crate::error::AppError;
use crate::storage::{AttachmentUploader, UploadFile};

/// Post service
pub struct PostService {
    session: Arc<dyn SessionProvider>,
    uploader: AttachmentUploader,
    store: Arc<dyn PostStore>,
    cache: Arc<PostListCache>,
}

impl PostService {
    /// Create new post service
    pub fn new(
        session: Arc<dyn SessionProvider>,
        uploader: AttachmentUploader,
        store: Arc<dyn PostStore>,
        cache: Arc<PostListCache>,
    ) -> Self {
        Self {
            session,
            uploader,
            store,
            cache,
        }
    }

    /// Create a new post
    ///
    /// # Arguments
    /// * `title` - Post title
    /// * `content` - Post body
    /// * `hashtags` - Stored as given (no dedup or validation)
    /// * `files` - Attachments, uploaded one by one in this order
    ///
    /// # Returns
    /// The canonical post as stored
    ///
    /// # Side Effects
    /// - Uploads every file to object storage
    /// - Inserts the post record
    /// - Invalidates the post list cache; the new post is not inserted
    ///   into any cached list
    ///
    /// # Errors
    /// - `Unauthorized` without a session (nothing uploaded or inserted)
    /// - `Upload` when a file fails (nothing inserted, earlier files orphaned)
    /// - `Insert` when the store rejects the record (all files orphaned), or
    ///   when the stored row has no author (the list is still invalidated)
    pub async fn create_post(
        &self,
        title: String,
        content: String,
        hashtags: Vec<String>,
        files: Vec<UploadFile>,
    ) -> Result<Post, AppError> {
        use crate::metrics::POSTS_CREATED_TOTAL;

        let session = self.session.current_session().await.ok_or_else(|| {
            tracing::debug!("Create post rejected: no active session");
            AppError::Unauthorized.record("create_post")
        })?;

        let attachment_urls = self.uploader.upload(files).await?;
        let attachment_count = attachment_urls.len();

        let record = NewPostRecord {
            title,
            content,
            hashtags,
            attachment_urls,
            user_id: session.user_id,
            like_count: 0,
        };

        let stored = self.store.insert_post(record).await.map_err(|e| {
            tracing::error!(
                error = %e,
                orphaned = attachment_count,
                "Post insert failed; uploaded attachments remain stored"
            );
            AppError::Insert(e).record("create_post")
        })?;

        // The row exists from here on, even if it cannot be normalized
        self.cache.invalidate(POSTS_QUERY_KEY).await;

        let post = Post::from_record(stored).map_err(|e| {
            tracing::error!(error = %e, "Inserted post could not be normalized");
            AppError::Insert(e).record("create_post")
        })?;

        POSTS_CREATED_TOTAL.inc();
        tracing::info!(
            post_id = %post.id,
            user_id = %post.user_id,
            attachments = post.attachments.len(),
            hashtags = post.hashtags.len(),
            "Post created"
        );

        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MockSessionProvider, Session};
    use crate::config::CacheConfig;
    use crate::data::{AuthorSummary, MockPostStore, RawPostRecord};
    use crate::error::StoreError;
    use crate::service::FeedService;
    use crate::storage::{MemoryObjectStore, MockObjectStore, ObjectStore};
    use chrono::Utc;
    use serde_json::json;

    fn signed_in() -> MockSessionProvider {
        let mut session = MockSessionProvider::new();
        session
            .expect_current_session()
            .returning(|| Some(Session::new("user-1")));
        session
    }

    fn stored(record: NewPostRecord) -> RawPostRecord {
        RawPostRecord {
            id: "post-1".to_string(),
            title: record.title,
            content: record.content,
            created_at: Utc::now(),
            user_id: record.user_id,
            attachment_urls: serde_json::to_value(&record.attachment_urls).unwrap(),
            hashtags: serde_json::to_value(&record.hashtags).unwrap(),
            like_count: Some(record.like_count as i64),
            profile: Some(AuthorSummary {
                id: "user-1".to_string(),
                username: "alice".to_string(),
                avatar_url: None,
            }),
        }
    }

    fn service(
        session: MockSessionProvider,
        objects: Arc<dyn ObjectStore>,
        store: MockPostStore,
    ) -> (PostService, Arc<PostListCache>) {
        let store: Arc<dyn PostStore> = Arc::new(store);
        let feed = Arc::new(FeedService::new(store.clone()));
        let cache = Arc::new(PostListCache::new(feed, &CacheConfig::default()));
        let service = PostService::new(
            Arc::new(session),
            AttachmentUploader::new(objects, "posts"),
            store,
            cache.clone(),
        );
        (service, cache)
    }

    fn files(n: usize) -> Vec<UploadFile> {
        (0..n)
            .map(|i| UploadFile::new(format!("file{i}.png"), "image/png", vec![i as u8]))
            .collect()
    }

    #[tokio::test]
    async fn test_no_session_has_no_side_effects() {
        let mut session = MockSessionProvider::new();
        session.expect_current_session().returning(|| None);
        let mut objects = MockObjectStore::new();
        objects.expect_upload().never();
        let mut store = MockPostStore::new();
        store.expect_insert_post().never();

        let (service, cache) = service(session, Arc::new(objects), store);
        let error = service
            .create_post("t".into(), "c".into(), vec![], files(2))
            .await
            .expect_err("no session");

        assert!(matches!(error, AppError::Unauthorized));
        assert_eq!(cache.version(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_insert_and_orphans_earlier_files() {
        let objects = Arc::new(MemoryObjectStore::new("https://cdn.test").with_quota(1));
        let mut store = MockPostStore::new();
        store.expect_insert_post().never();

        let (service, cache) = service(signed_in(), objects.clone(), store);
        let error = service
            .create_post("t".into(), "c".into(), vec![], files(3))
            .await
            .expect_err("second upload exceeds quota");

        assert!(matches!(error, AppError::Upload { index: 1, .. }));
        assert_eq!(objects.len(), 1);
        assert_eq!(objects.get(&objects.paths()[0]).unwrap().data, vec![0u8]);
        assert_eq!(cache.version(), 0);
    }

    #[tokio::test]
    async fn test_insert_receives_uploaded_attachments_and_session_owner() {
        let objects = Arc::new(MemoryObjectStore::new("https://cdn.test"));
        let mut store = MockPostStore::new();
        store
            .expect_insert_post()
            .times(1)
            .withf(|record| {
                record.user_id == "user-1"
                    && record.like_count == 0
                    && record.hashtags == ["dup", "dup"]
                    && record.attachment_urls.len() == 2
                    && record.attachment_urls[0].name == "file0.png"
                    && record.attachment_urls[1].name == "file1.png"
                    && record.attachment_urls[0].url.starts_with("https://cdn.test/posts/")
            })
            .returning(|record| Ok(stored(record)));

        let (service, cache) = service(signed_in(), objects.clone(), store);
        let post = service
            .create_post(
                "Hello".into(),
                "#dup #dup".into(),
                vec!["dup".into(), "dup".into()],
                files(2),
            )
            .await
            .unwrap();

        assert_eq!(post.id, "post-1");
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.attachments.len(), 2);
        assert_eq!(post.hashtags, ["dup", "dup"]);
        assert_eq!(objects.len(), 2);
        assert_eq!(cache.version(), 1);
    }

    #[tokio::test]
    async fn test_insert_failure_is_an_insert_error() {
        let objects = Arc::new(MemoryObjectStore::new("https://cdn.test"));
        let mut store = MockPostStore::new();
        store
            .expect_insert_post()
            .times(1)
            .returning(|_| Err(StoreError::Storage("permission denied".to_string())));

        let (service, cache) = service(signed_in(), objects.clone(), store);
        let error = service
            .create_post("t".into(), "c".into(), vec![], files(1))
            .await
            .expect_err("insert rejected");

        assert!(matches!(error, AppError::Insert(StoreError::Storage(_))));
        assert_eq!(objects.len(), 1);
        assert_eq!(cache.version(), 0);
    }

    #[tokio::test]
    async fn test_inserted_record_without_author_still_invalidates() {
        let objects = Arc::new(MemoryObjectStore::new("https://cdn.test"));
        let mut store = MockPostStore::new();
        store.expect_insert_post().times(1).returning(|record| {
            let mut raw = stored(record);
            raw.profile = None;
            Ok(raw)
        });

        let (service, cache) = service(signed_in(), objects, store);
        let error = service
            .create_post("t".into(), "c".into(), vec![], vec![])
            .await
            .expect_err("record cannot be normalized");

        assert!(matches!(error, AppError::Insert(StoreError::Schema(_))));
        assert_eq!(cache.version(), 1);
        assert!(cache.subscribe().current().is_stale);
    }

    #[tokio::test]
    async fn test_returned_record_is_normalized() {
        let objects = Arc::new(MemoryObjectStore::new("https://cdn.test"));
        let mut store = MockPostStore::new();
        store.expect_insert_post().returning(|record| {
            let mut raw = stored(record);
            raw.attachment_urls = json!("not a list");
            raw.hashtags = serde_json::Value::Null;
            raw.like_count = None;
            Ok(raw)
        });

        let (service, _cache) = service(signed_in(), objects, store);
        let post = service
            .create_post("t".into(), "c".into(), vec!["x".into()], vec![])
            .await
            .unwrap();

        assert!(post.attachments.is_empty());
        assert!(post.hashtags.is_empty());
        assert_eq!(post.like_count, 0);
        assert_eq!(post.comment_count, 0);
    }
}
