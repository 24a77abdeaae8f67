//! In-memory object store for testing and ephemeral use.
//!
//! [`MemoryObjectStore`] keeps every object in a `HashMap` behind a
//! `RwLock`. An optional quota makes uploads fail once it is reached.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::ObjectStore;
use crate::error::StoreError;

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// An in-memory implementation of [`ObjectStore`].
#[derive(Debug)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    base_url: String,
    max_objects: Option<usize>,
}

impl MemoryObjectStore {
    /// Create an unbounded store serving URLs under `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_objects: None,
        }
    }

    /// Reject uploads once `max_objects` objects are stored
    pub fn with_quota(mut self, max_objects: usize) -> Self {
        self.max_objects = Some(max_objects);
        self
    }

    /// Fetch a stored object
    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(path).cloned())
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {e}")))?;

        if let Some(max) = self.max_objects {
            if objects.len() >= max && !objects.contains_key(path) {
                return Err(StoreError::Storage(format!(
                    "quota of {max} objects exceeded"
                )));
            }
        }

        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_read_back() {
        let store = MemoryObjectStore::new("https://cdn.test/");
        store
            .upload("posts/a.txt", b"hello".to_vec(), "text/plain")
            .await
            .unwrap();

        let object = store.get("posts/a.txt").unwrap();
        assert_eq!(object.data, b"hello");
        assert_eq!(object.content_type, "text/plain");
        assert_eq!(store.public_url("posts/a.txt"), "https://cdn.test/posts/a.txt");
    }

    #[tokio::test]
    async fn quota_rejects_new_objects() {
        let store = MemoryObjectStore::new("https://cdn.test").with_quota(1);
        store.upload("a", vec![1], "x/y").await.unwrap();

        let error = store.upload("b", vec![2], "x/y").await.unwrap_err();
        assert!(matches!(error, StoreError::Storage(msg) if msg.contains("quota")));
        assert_eq!(store.paths(), ["a"]);
    }
}
