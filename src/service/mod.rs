//! Service layer
//!
//! Contains the read and create pipelines.
//! Services orchestrate the relational store, object storage, and cache.

mod feed;
mod hashtags;
mod post;

pub use feed::FeedService;
pub use hashtags::extract_hashtags;
pub use post::PostService;
