//! SQLite database operations
//!
//! All relational access goes through this module.
//! JSON columns are read back untyped and validated by `Post::from_record`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use super::store::PostStore;
use crate::error::{AppError, StoreError};

const SELECT_POSTS_WITH_AUTHOR: &str = r#"
    SELECT
        p.id, p.title, p.content, p.created_at, p.user_id,
        p.attachment_urls, p.hashtags, p.like_count,
        pr.id AS profile_id,
        pr.username AS profile_username,
        pr.avatar_url AS profile_avatar_url
    FROM posts p
    LEFT JOIN profiles pr ON pr.id = p.user_id
"#;

fn parse_json_value(raw: Option<String>) -> serde_json::Value {
    raw.and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .unwrap_or(serde_json::Value::Null)
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| StoreError::Schema(format!("invalid created_at {raw:?}: {e}")))
}

fn record_from_row(row: &SqliteRow) -> Result<RawPostRecord, StoreError> {
    let created_at: String = row.try_get("created_at")?;
    let profile_id: Option<String> = row.try_get("profile_id")?;
    let profile = match profile_id {
        Some(id) => Some(AuthorSummary {
            id,
            username: row.try_get("profile_username")?,
            avatar_url: row.try_get("profile_avatar_url")?,
        }),
        None => None,
    };

    Ok(RawPostRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: parse_timestamp(&created_at)?,
        user_id: row.try_get("user_id")?,
        attachment_urls: parse_json_value(row.try_get("attachment_urls")?),
        hashtags: parse_json_value(row.try_get("hashtags")?),
        like_count: row.try_get("like_count")?,
        profile,
    })
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to (or create) the SQLite file at `path` and run migrations
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to open database: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Insert or update an author profile
    pub async fn upsert_profile(&self, profile: &AuthorSummary) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, username, avatar_url)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                avatar_url = excluded.avatar_url
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.username)
        .bind(&profile.avatar_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Count stored posts
    pub async fn count_posts(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl PostStore for Database {
    async fn select_posts(&self) -> Result<Vec<RawPostRecord>, StoreError> {
        use crate::metrics::STORE_QUERIES_TOTAL;
        STORE_QUERIES_TOTAL
            .with_label_values(&["select", "posts"])
            .inc();

        let sql = format!("{SELECT_POSTS_WITH_AUTHOR} ORDER BY p.created_at DESC, p.id DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn insert_post(&self, post: NewPostRecord) -> Result<RawPostRecord, StoreError> {
        use crate::metrics::STORE_QUERIES_TOTAL;
        STORE_QUERIES_TOTAL
            .with_label_values(&["insert", "posts"])
            .inc();

        let id = EntityId::new().0;
        let created_at = format_timestamp(&Utc::now());
        let attachment_urls = serde_json::to_string(&post.attachment_urls)
            .map_err(|e| StoreError::Schema(e.to_string()))?;
        let hashtags =
            serde_json::to_string(&post.hashtags).map_err(|e| StoreError::Schema(e.to_string()))?;
        let like_count = i64::try_from(post.like_count)
            .map_err(|_| StoreError::Schema("like_count out of range".to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (
                id, title, content, created_at, user_id,
                attachment_urls, hashtags, like_count
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&created_at)
        .bind(&post.user_id)
        .bind(&attachment_urls)
        .bind(&hashtags)
        .bind(like_count)
        .execute(&mut *tx)
        .await?;

        let sql = format!("{SELECT_POSTS_WITH_AUTHOR} WHERE p.id = ?");
        let row = sqlx::query(&sql).bind(&id).fetch_one(&mut *tx).await?;
        let record = record_from_row(&row)?;

        tx.commit().await?;

        tracing::debug!(post_id = %id, user_id = %post.user_id, "Post row inserted");

        Ok(record)
    }
}
