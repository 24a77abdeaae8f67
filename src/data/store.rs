//! The [`PostStore`] trait defining the relational store interface.
//!
//! Any backend (SQLite, a hosted Postgres REST endpoint, an in-memory fake)
//! implements this trait to serve the read and create pipelines.

use async_trait::async_trait;

use super::models::{NewPostRecord, RawPostRecord};
use crate::error::StoreError;

/// Relational store holding post records and the author profile relation.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Select every post joined with its author profile, newest first.
    async fn select_posts(&self) -> Result<Vec<RawPostRecord>, StoreError>;

    /// Insert a post and return the stored record joined with its author.
    ///
    /// The store assigns `id` and `created_at`.
    async fn insert_post(&self, post: NewPostRecord) -> Result<RawPostRecord, StoreError>;
}
