//! # hotspan
//!
//! **Live span cache** — a short-lived, high-churn cache for in-flight
//! telemetry spans with an embedded query engine.
//!
//! Spans arrive as streamed, possibly partial and out-of-order updates; the
//! cache merges updates to the same `(trace_id, span_id)`, keeps records
//! only within a bounded time-and-size budget, and answers search,
//! trace-reconstruction, and existence queries against the live window
//! before the data lands in a durable long-term store.
//!
//! One [`PartitionHandle`] owns one cache partition (typically one per
//! environment) and processes operations one at a time, run to completion.
//! Partitions are created on demand through a [`PartitionRegistry`].
//!
//! ## Status
//!
//! This crate is under development. The API is not yet stable.

pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

pub use crate::core::config::CacheConfig;
pub use crate::data::error::{CacheError, StoreError};
pub use crate::data::store::{MemoryStore, SpanStore};
pub use crate::data::types::{AttrMap, CacheRecord, CachedSpan, Span, SpanKind, SpanStatus};
pub use crate::domain::partition::{IngestBatch, PartitionHandle};
pub use crate::domain::registry::PartitionRegistry;
pub use crate::domain::spans::query::{SearchQuery, SearchResponse, SpanSummary};
pub use crate::domain::spans::trace::{SpanDetail, TraceDetail};
