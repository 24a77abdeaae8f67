//! Data layer module
//!
//! Handles all data persistence and caching:
//! - Post and attachment models
//! - Relational store interface and SQLite backend
//! - Post list cache (volatile)

mod cache;
mod database;
mod models;
mod store;

pub use cache::{CacheSnapshot, POSTS_QUERY_KEY, PostListCache, PostListSubscription};
pub use database::Database;
pub use models::*;
pub use store::PostStore;

#[cfg(test)]
pub use store::MockPostStore;
