//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::Arc;

use postboard::PostsClient;
use postboard::auth::{Session, SessionHandle};
use postboard::config::CacheConfig;
use postboard::data::{AuthorSummary, Database};
use postboard::storage::{MemoryObjectStore, UploadFile};
use tempfile::TempDir;

pub const MEDIA_BASE_URL: &str = "https://media.test.example.com";

/// Client wired to a temporary SQLite database and in-memory object storage
pub struct TestClient {
    pub client: PostsClient,
    pub db: Arc<Database>,
    pub objects: Arc<MemoryObjectStore>,
    pub session: Arc<SessionHandle>,
    pub _temp_dir: TempDir,
}

impl TestClient {
    /// Create a signed-out client with the `alice` profile seeded
    pub async fn new() -> Self {
        Self::with_objects(MemoryObjectStore::new(MEDIA_BASE_URL)).await
    }

    pub async fn with_objects(objects: MemoryObjectStore) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::connect(&temp_dir.path().join("test.db")).await.unwrap());
        db.upsert_profile(&alice()).await.unwrap();

        let objects = Arc::new(objects);
        let session = Arc::new(SessionHandle::signed_out());
        let client = PostsClient::from_parts(
            db.clone(),
            objects.clone(),
            session.clone(),
            &CacheConfig::default(),
            "posts",
        );

        Self {
            client,
            db,
            objects,
            session,
            _temp_dir: temp_dir,
        }
    }

    pub async fn sign_in_alice(&self) {
        self.session.sign_in(Session::new(alice().id)).await;
    }
}

pub fn alice() -> AuthorSummary {
    AuthorSummary {
        id: "user-alice".to_string(),
        username: "alice".to_string(),
        avatar_url: Some("https://media.test.example.com/avatars/alice.webp".to_string()),
    }
}

pub fn png(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", name.as_bytes().to_vec())
}
