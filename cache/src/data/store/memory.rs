//! In-memory storage backend
//!
//! Ordered map behind a lock. Used for embedding and tests; a production
//! deployment can swap in any backend implementing `SpanStore`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::backend::SpanStore;
use crate::data::error::StoreError;

/// In-memory `SpanStore` backed by a `BTreeMap`
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl SpanStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new();

        store.put("key1", b"value1".to_vec()).await.unwrap();
        let result = store.get("key1").await.unwrap();
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let store = MemoryStore::new();

        let result = store.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let store = MemoryStore::new();

        store.put("key1", b"old".to_vec()).await.unwrap();
        store.put("key1", b"new".to_vec()).await.unwrap();
        assert_eq!(store.get("key1").await.unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();

        store.put("key1", b"value1".to_vec()).await.unwrap();
        assert!(store.delete("key1").await.unwrap());
        assert!(!store.delete("key1").await.unwrap());
        assert_eq!(store.get("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_many_ignores_missing() {
        let store = MemoryStore::new();

        store.put("a", b"1".to_vec()).await.unwrap();
        store.put("b", b"2".to_vec()).await.unwrap();

        store
            .delete_many(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_by_prefix_is_ordered() {
        let store = MemoryStore::new();

        store.put("span:t1:b", b"2".to_vec()).await.unwrap();
        store.put("span:t1:a", b"1".to_vec()).await.unwrap();
        store.put("span:t2:a", b"3".to_vec()).await.unwrap();
        store.put("other:x", b"4".to_vec()).await.unwrap();

        let entries = store.list("span:t1:").await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["span:t1:a", "span:t1:b"]);

        let all_spans = store.list("span:").await.unwrap();
        assert_eq!(all_spans.len(), 3);
    }

    #[tokio::test]
    async fn test_list_empty_prefix_returns_everything() {
        let store = MemoryStore::new();

        store.put("a", b"1".to_vec()).await.unwrap();
        store.put("b", b"2".to_vec()).await.unwrap();

        let entries = store.list("").await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
