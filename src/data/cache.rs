//! In-memory post list cache
//!
//! One logical key (`"posts"`) holds the whole feed. Entries are versioned:
//! invalidation bumps the version and notifies subscribers, who pull the
//! refreshed list with [`PostListCache::get`].

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

use super::models::Post;
use crate::config::CacheConfig;
use crate::error::AppError;
use crate::service::FeedService;

/// Cache key of the post list
pub const POSTS_QUERY_KEY: &str = "posts";

/// What subscribers observe
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    /// Bumped on every invalidation
    pub version: u64,
    /// Latest successfully fetched list, kept while stale
    pub posts: Option<Arc<Vec<Post>>>,
    /// True between an invalidation and the next completed fetch
    pub is_stale: bool,
}

#[derive(Clone)]
struct CachedList {
    version: u64,
    posts: Arc<Vec<Post>>,
}

/// Post list cache (volatile)
///
/// Concurrent misses share a single fetch. A fetch that was overtaken by an
/// invalidation is handed to its caller but never served from the cache.
pub struct PostListCache {
    entries: Cache<String, CachedList>,
    feed: Arc<FeedService>,
    snapshot: watch::Sender<CacheSnapshot>,
    fetch_lock: Mutex<()>,
}

impl PostListCache {
    /// Create new post list cache
    ///
    /// # Arguments
    /// * `feed` - Read pipeline used on a miss
    /// * `config` - TTL settings
    pub fn new(feed: Arc<FeedService>, config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.posts_ttl_seconds))
            .build();
        let (snapshot, _) = watch::channel(CacheSnapshot::default());

        Self {
            entries,
            feed,
            snapshot,
            fetch_lock: Mutex::new(()),
        }
    }

    /// Current entry version
    pub fn version(&self) -> u64 {
        self.snapshot.borrow().version
    }

    /// Get the post list, fetching it on a miss
    ///
    /// # Errors
    /// Returns `AppError::Query` if the read pipeline fails; nothing is cached
    /// in that case.
    pub async fn get(&self) -> Result<Arc<Vec<Post>>, AppError> {
        use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL, CACHE_SIZE};

        if let Some(posts) = self.lookup().await {
            CACHE_HITS_TOTAL.with_label_values(&["posts"]).inc();
            return Ok(posts);
        }

        let _guard = self.fetch_lock.lock().await;

        // Filled by the caller we waited on
        if let Some(posts) = self.lookup().await {
            CACHE_HITS_TOTAL.with_label_values(&["posts"]).inc();
            return Ok(posts);
        }
        CACHE_MISSES_TOTAL.with_label_values(&["posts"]).inc();

        let version = self.version();
        let posts = Arc::new(self.feed.fetch_posts().await?);

        self.entries
            .insert(
                POSTS_QUERY_KEY.to_string(),
                CachedList {
                    version,
                    posts: posts.clone(),
                },
            )
            .await;

        let published = self.snapshot.send_if_modified(|snapshot| {
            if snapshot.version != version {
                return false;
            }
            snapshot.posts = Some(posts.clone());
            snapshot.is_stale = false;
            true
        });

        if published {
            CACHE_SIZE
                .with_label_values(&["posts"])
                .set(posts.len() as i64);
            tracing::debug!(version, count = posts.len(), "Post list cached");
        } else {
            tracing::debug!(version, "Post list invalidated during fetch; result not cached");
        }

        Ok(posts)
    }

    async fn lookup(&self) -> Option<Arc<Vec<Post>>> {
        let cached = self.entries.get(POSTS_QUERY_KEY).await?;
        (cached.version == self.version()).then_some(cached.posts)
    }

    /// Invalidate a cache key
    ///
    /// The next [`get`](Self::get) refetches. Unknown keys are ignored.
    pub async fn invalidate(&self, key: &str) {
        if key != POSTS_QUERY_KEY {
            tracing::debug!(key = %key, "Ignoring invalidation of unknown cache key");
            return;
        }

        self.snapshot.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.is_stale = true;
        });
        self.entries.invalidate(key).await;

        tracing::debug!(version = self.version(), "Post list invalidated");
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> PostListSubscription {
        PostListSubscription {
            receiver: self.snapshot.subscribe(),
        }
    }
}

/// Receives a notification for every fetched list and every invalidation
pub struct PostListSubscription {
    receiver: watch::Receiver<CacheSnapshot>,
}

impl PostListSubscription {
    /// Latest snapshot without waiting
    pub fn current(&self) -> CacheSnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change
    ///
    /// Returns `None` once the cache is dropped.
    pub async fn changed(&mut self) -> Option<CacheSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}
