//! Postboard - client-side data layer for a community posts feed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PostsClient (facade)                     │
//! │  - posts() / refresh() / subscribe()                        │
//! │  - create_post() / publish()                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - FeedService: read pipeline                               │
//! │  - PostService: session → uploads → insert → invalidate     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Data / Storage Layer                        │
//! │  - PostStore: SQLite (sqlx)                                 │
//! │  - ObjectStore: R2 storage, in-memory                       │
//! │  - PostListCache: versioned post list (moka + watch)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `service`: Read and create pipelines, hashtag extraction
//! - `data`: Models, relational store, post list cache
//! - `storage`: Object storage and attachment uploads
//! - `auth`: Session provider
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

use auth::SessionProvider;
use config::{AppConfig, CacheConfig};
use data::{Post, PostListCache, PostListSubscription, PostStore, POSTS_QUERY_KEY};
use error::AppError;
use service::{FeedService, PostService};
use storage::{AttachmentUploader, ObjectStore, UploadFile};

/// Entry point for reading and creating posts
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct PostsClient {
    cache: Arc<PostListCache>,
    posts: PostService,
}

impl PostsClient {
    /// Build a client backed by SQLite and Cloudflare R2
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Build R2 media storage
    /// 3. Wire cache and services
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated
    pub async fn connect(
        config: &AppConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, AppError> {
        tracing::info!("Initializing posts client...");

        let db = data::Database::connect(&config.database.path).await?;
        let storage = storage::MediaStorage::new(&config.storage.media, &config.cloudflare);
        tracing::info!(bucket = %config.storage.media.bucket, "Media storage initialized");

        Ok(Self::from_parts(
            Arc::new(db),
            Arc::new(storage),
            session,
            &config.cache,
            &config.storage.media.key_prefix,
        ))
    }

    /// Build a client over injected stores
    pub fn from_parts(
        store: Arc<dyn PostStore>,
        objects: Arc<dyn ObjectStore>,
        session: Arc<dyn SessionProvider>,
        cache_config: &CacheConfig,
        key_prefix: &str,
    ) -> Self {
        let feed = Arc::new(FeedService::new(store.clone()));
        let cache = Arc::new(PostListCache::new(feed, cache_config));
        let uploader = AttachmentUploader::new(objects, key_prefix);
        let posts = PostService::new(session, uploader, store, cache.clone());

        Self { cache, posts }
    }

    /// Current post list, newest first (served from cache when fresh)
    pub async fn posts(&self) -> Result<Arc<Vec<Post>>, AppError> {
        self.cache.get().await
    }

    /// Drop the cached list and fetch it again
    pub async fn refresh(&self) -> Result<Arc<Vec<Post>>, AppError> {
        self.cache.invalidate(POSTS_QUERY_KEY).await;
        self.cache.get().await
    }

    /// Subscribe to post list changes
    pub fn subscribe(&self) -> PostListSubscription {
        self.cache.subscribe()
    }

    /// Create a post with explicit hashtags
    ///
    /// See [`PostService::create_post`].
    pub async fn create_post(
        &self,
        title: String,
        content: String,
        hashtags: Vec<String>,
        files: Vec<UploadFile>,
    ) -> Result<Post, AppError> {
        self.posts.create_post(title, content, hashtags, files).await
    }

    /// Create a post, taking its hashtags from `content`
    pub async fn publish(
        &self,
        title: String,
        content: String,
        files: Vec<UploadFile>,
    ) -> Result<Post, AppError> {
        let hashtags = service::extract_hashtags(&content);
        self.posts.create_post(title, content, hashtags, files).await
    }
}
