//! Storage backend trait definition

use async_trait::async_trait;

use crate::data::error::StoreError;

/// Ordered, prefix-scannable key-value storage backend
///
/// All operations are asynchronous and may fail. Durability is assumed only
/// within the lifetime of the owning partition actor; the cache layers its
/// own TTL and capacity semantics on top.
#[async_trait]
pub trait SpanStore: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a value, replacing any existing value at the key
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Delete a key
    ///
    /// Returns `true` if the key existed before deletion.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete a batch of keys; missing keys are ignored
    async fn delete_many(&self, keys: &[String]) -> Result<(), StoreError>;

    /// List all entries whose key starts with `prefix`, in key order
    async fn list(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
