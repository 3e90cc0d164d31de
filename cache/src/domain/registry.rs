//! Partition registry
//!
//! Partitions are keyed by environment id and spawned lazily on first use.
//! Cross-partition operations are fully independent: each partition owns
//! its storage backend exclusively and serializes its own operations.

use std::sync::Arc;

use dashmap::DashMap;

use crate::core::config::CacheConfig;
use crate::data::store::{MemoryStore, SpanStore};
use crate::domain::partition::PartitionHandle;

/// Factory producing one storage backend per partition
pub type StoreFactory = Arc<dyn Fn() -> Arc<dyn SpanStore> + Send + Sync>;

/// Lazily-spawning registry of partition actors
pub struct PartitionRegistry {
    partitions: DashMap<String, PartitionHandle>,
    config: CacheConfig,
    store_factory: StoreFactory,
}

impl PartitionRegistry {
    /// Registry whose partitions store records in process memory.
    pub fn in_memory(config: CacheConfig) -> Self {
        let factory: StoreFactory = Arc::new(|| {
            let store: Arc<dyn SpanStore> = Arc::new(MemoryStore::new());
            store
        });
        Self::with_store_factory(config, factory)
    }

    /// Registry with a custom storage backend per partition.
    pub fn with_store_factory(config: CacheConfig, store_factory: StoreFactory) -> Self {
        Self {
            partitions: DashMap::new(),
            config,
            store_factory,
        }
    }

    /// Handle to the partition for an environment, spawning it on first use.
    pub fn partition(&self, environment_id: &str) -> PartitionHandle {
        self.partitions
            .entry(environment_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(environment_id, "Spawning cache partition");
                PartitionHandle::spawn(
                    environment_id.to_string(),
                    (self.store_factory)(),
                    self.config.clone(),
                )
            })
            .clone()
    }

    /// Number of partitions spawned so far
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}
