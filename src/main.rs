//! Postboard binary entry point
//!
//! Prints the current post feed as JSON.

use std::sync::Arc;

use postboard::{PostsClient, auth::SessionHandle, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize metrics
/// 4. Connect the posts client
/// 5. Fetch and print the feed
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let default_filter = format!("postboard={}", config.logging.level);
    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.clone().into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.clone().into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!(
        database = %config.database.path.display(),
        bucket = %config.storage.media.bucket,
        "Configuration loaded"
    );

    // 3. Initialize metrics
    postboard::metrics::init_metrics();

    // 4. Connect; reading the feed needs no session
    let client = PostsClient::connect(&config, Arc::new(SessionHandle::signed_out())).await?;

    // 5. Fetch and print
    let posts = client.posts().await?;
    tracing::info!(count = posts.len(), "Feed fetched");

    println!("{}", serde_json::to_string_pretty(posts.as_slice())?);

    match postboard::metrics::render() {
        Ok(text) => tracing::debug!(metrics = %text, "Metrics snapshot"),
        Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
    }

    Ok(())
}
