//! Persisted path-list cache handle.
//!
//! The kernel-spec root list is the only cross-invocation shared state in
//! this crate. It is held behind an explicit cache object whose lifecycle the
//! composing application owns; writes are whole-value replacements, so
//! concurrent writers are last-write-wins. The cached value is a re-derivable
//! optimization, never a source of truth.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Key-value store for cached path lists.
#[async_trait]
pub trait PathCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<PathBuf>>;

    /// Whole-value replacement of the entry at `key`.
    async fn update(&self, key: &str, value: Vec<PathBuf>);
}

/// In-memory cache, also the test double for persisted host stores.
#[derive(Default)]
pub struct MemoryPathCache {
    entries: Mutex<HashMap<String, Vec<PathBuf>>>,
}

impl MemoryPathCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PathCache for MemoryPathCache {
    async fn get(&self, key: &str) -> Option<Vec<PathBuf>> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn update(&self, key: &str, value: Vec<PathBuf>) {
        self.entries.lock().await.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let cache = MemoryPathCache::new();
        assert!(cache.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_whole_value() {
        let cache = MemoryPathCache::new();
        cache
            .update("roots", vec![PathBuf::from("/a"), PathBuf::from("/b")])
            .await;
        cache.update("roots", vec![PathBuf::from("/c")]).await;
        assert_eq!(cache.get("roots").await.unwrap(), vec![PathBuf::from("/c")]);
    }
}
