//! Retention management
//!
//! Two-phase sweep, invoked once after each ingestion batch:
//!
//! 1. TTL: every record with `expires_at <= now` is deleted unconditionally.
//! 2. Capacity: if the remaining records exceed the item or byte cap, the
//!    oldest-written records are evicted first until both caps hold.
//!
//! Eviction order is strictly by cache write time, independent of trace
//! membership; evicting one span of a trace while keeping its siblings is
//! expected.

use chrono::{DateTime, Utc};

use crate::core::config::CacheConfig;
use crate::data::error::CacheError;
use crate::data::key::SpanKey;
use crate::data::store::SpanStore;
use crate::data::types::CacheRecord;

/// Result of one retention sweep
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Records removed because their TTL elapsed
    pub expired: u64,
    /// Records removed by capacity pressure
    pub evicted: u64,
}

/// Run one retention sweep over the whole partition.
pub async fn run_sweep(
    store: &dyn SpanStore,
    config: &CacheConfig,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, CacheError> {
    let entries = store.list(SpanKey::SCAN_PREFIX).await?;

    let mut expired_keys: Vec<String> = Vec::new();
    let mut active: Vec<(String, DateTime<Utc>, u64)> = Vec::new();
    for (key, bytes) in entries {
        match CacheRecord::decode(&bytes) {
            Ok(record) if record.is_expired(now) => expired_keys.push(key),
            Ok(record) => active.push((key, record.received_at, record.size_bytes)),
            Err(error) => {
                tracing::warn!(%key, %error, "Removing undecodable cache record");
                expired_keys.push(key);
            }
        }
    }

    if !expired_keys.is_empty() {
        store.delete_many(&expired_keys).await?;
    }

    let mut count = active.len();
    let mut total_bytes: u64 = active.iter().map(|(_, _, size)| size).sum();
    let mut evicted_keys: Vec<String> = Vec::new();

    if count > config.max_items || total_bytes > config.max_bytes {
        // Oldest cache write first; span-reported timestamps play no part.
        active.sort_by(|a, b| a.1.cmp(&b.1));
        let mut oldest = active.iter();
        while count > config.max_items || total_bytes > config.max_bytes {
            let Some((key, _, size)) = oldest.next() else {
                break;
            };
            evicted_keys.push(key.clone());
            count -= 1;
            total_bytes -= size;
        }
        store.delete_many(&evicted_keys).await?;
    }

    let outcome = SweepOutcome {
        expired: expired_keys.len() as u64,
        evicted: evicted_keys.len() as u64,
    };
    if outcome.expired > 0 || outcome.evicted > 0 {
        tracing::debug!(
            expired = outcome.expired,
            evicted = outcome.evicted,
            remaining = count,
            remaining_bytes = total_bytes,
            "Retention sweep removed records"
        );
    } else {
        tracing::debug!(
            remaining = count,
            remaining_bytes = total_bytes,
            "Retention sweep complete, nothing to delete"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::MemoryStore;
    use crate::data::types::{AttrMap, CachedSpan, Span};
    use std::time::Duration;

    fn test_config(max_items: usize, max_bytes: u64) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(600),
            max_items,
            max_bytes,
        }
    }

    fn make_record(span_id: &str, written_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> CacheRecord {
        let span = Span {
            trace_id: "trace".to_string(),
            span_id: span_id.to_string(),
            parent_span_id: None,
            name: "op".to_string(),
            kind: Default::default(),
            start_time_unix_nano: None,
            end_time_unix_nano: None,
            attributes: AttrMap::new(),
            events: vec![],
            links: vec![],
            status: None,
            dropped_attributes_count: 0,
            dropped_events_count: 0,
            dropped_links_count: 0,
        };
        CacheRecord {
            span: CachedSpan {
                span,
                received_at: None,
                environment_id: "env".to_string(),
                project_id: "proj".to_string(),
                organization_id: "org".to_string(),
                service_name: None,
                service_version: None,
                resource_attributes: AttrMap::new(),
            },
            received_at: written_at,
            expires_at,
            size_bytes: 100,
        }
    }

    async fn insert(store: &MemoryStore, record: &CacheRecord) {
        let key = SpanKey::span(&record.span.span.trace_id, &record.span.span.span_id);
        store.put(&key, record.encode().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_empty_store() {
        let store = MemoryStore::new();
        let outcome = run_sweep(&store, &test_config(10, 10_000), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, SweepOutcome::default());
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_records() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let ttl = chrono::Duration::minutes(10);

        insert(&store, &make_record("dead", now - ttl * 2, now - ttl)).await;
        insert(&store, &make_record("live", now, now + ttl)).await;

        let outcome = run_sweep(&store, &test_config(10, 10_000), now)
            .await
            .unwrap();
        assert_eq!(outcome.expired, 1);
        assert_eq!(outcome.evicted, 0);
        assert!(store.get("span:trace:dead").await.unwrap().is_none());
        assert!(store.get("span:trace:live").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_under_caps_keeps_everything() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let later = now + chrono::Duration::minutes(10);

        insert(&store, &make_record("a", now, later)).await;
        insert(&store, &make_record("b", now, later)).await;

        let outcome = run_sweep(&store, &test_config(10, 10_000), now)
            .await
            .unwrap();
        assert_eq!(outcome, SweepOutcome::default());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_sweep_evicts_oldest_written_beyond_item_cap() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let later = now + chrono::Duration::minutes(10);

        // Strictly increasing write times: a oldest, e newest
        for (index, span_id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let written = now + chrono::Duration::seconds(index as i64);
            insert(&store, &make_record(span_id, written, later)).await;
        }

        let outcome = run_sweep(&store, &test_config(2, 10_000), now)
            .await
            .unwrap();
        assert_eq!(outcome.evicted, 3);

        // Exactly the 3 earliest-written spans are absent
        for span_id in ["a", "b", "c"] {
            let key = format!("span:trace:{}", span_id);
            assert!(store.get(&key).await.unwrap().is_none());
        }
        for span_id in ["d", "e"] {
            let key = format!("span:trace:{}", span_id);
            assert!(store.get(&key).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_sweep_enforces_byte_cap() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let later = now + chrono::Duration::minutes(10);

        // 4 records at 100 accounted bytes each; byte cap of 250 keeps 2
        for (index, span_id) in ["a", "b", "c", "d"].iter().enumerate() {
            let written = now + chrono::Duration::seconds(index as i64);
            insert(&store, &make_record(span_id, written, later)).await;
        }

        let outcome = run_sweep(&store, &test_config(100, 250), now)
            .await
            .unwrap();
        assert_eq!(outcome.evicted, 2);
        assert!(store.get("span:trace:a").await.unwrap().is_none());
        assert!(store.get("span:trace:b").await.unwrap().is_none());
        assert!(store.get("span:trace:c").await.unwrap().is_some());
        assert!(store.get("span:trace:d").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_expiry_runs_before_capacity() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let ttl = chrono::Duration::minutes(10);

        // The newest record is expired; capacity pressure must not save it,
        // and the oldest active record must be the one evicted.
        insert(&store, &make_record("old-active", now, now + ttl)).await;
        insert(
            &store,
            &make_record("mid-active", now + chrono::Duration::seconds(1), now + ttl),
        )
        .await;
        insert(
            &store,
            &make_record("new-expired", now + chrono::Duration::seconds(2), now - ttl),
        )
        .await;

        let outcome = run_sweep(&store, &test_config(1, 10_000), now)
            .await
            .unwrap();
        assert_eq!(outcome.expired, 1);
        assert_eq!(outcome.evicted, 1);
        assert!(store.get("span:trace:new-expired").await.unwrap().is_none());
        assert!(store.get("span:trace:old-active").await.unwrap().is_none());
        assert!(store.get("span:trace:mid-active").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_removes_undecodable_records() {
        let store = MemoryStore::new();
        store
            .put("span:trace:garbage", b"not json".to_vec())
            .await
            .unwrap();

        let outcome = run_sweep(&store, &test_config(10, 10_000), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.expired, 1);
        assert!(store.is_empty());
    }
}
