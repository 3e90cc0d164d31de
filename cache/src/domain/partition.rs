//! Cache partition actor
//!
//! One partition (scoped per environment) owns its storage backend and
//! processes operations strictly one at a time: the actor task pulls a
//! command from its mailbox and runs it to completion before receiving the
//! next, so merge, sweep, and query logic never observe interleaved writes.
//! A `search` or `trace_detail` issued after an `ingest` completes is
//! guaranteed to observe that ingest's effects.
//!
//! Ingestion is not atomic across a batch: if a storage write fails
//! mid-batch, spans already written stay committed and the error is
//! surfaced as-is. The merge is idempotent, so a caller-level retry of the
//! whole batch converges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};

use crate::core::config::CacheConfig;
use crate::core::constants::PARTITION_MAILBOX_SIZE;
use crate::data::error::CacheError;
use crate::data::key::SpanKey;
use crate::data::store::SpanStore;
use crate::data::types::{AttrMap, CacheRecord, CachedSpan, Span};
use crate::domain::spans::merge::merge_spans;
use crate::domain::spans::query::{SearchQuery, SearchResponse, run_search};
use crate::domain::spans::retention::run_sweep;
use crate::domain::spans::trace::{TraceDetail, reconstruct_trace};

/// A batch of spans sharing one ingestion context
#[derive(Debug, Clone, Deserialize)]
pub struct IngestBatch {
    pub environment_id: String,
    pub project_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_version: Option<String>,
    #[serde(default)]
    pub resource_attributes: AttrMap,
    /// Producer-reported ingestion time; defaults to now
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    pub spans: Vec<Span>,
}

enum PartitionCommand {
    Ingest {
        batch: IngestBatch,
        reply: oneshot::Sender<Result<(), CacheError>>,
    },
    Search {
        query: Box<SearchQuery>,
        reply: oneshot::Sender<Result<SearchResponse, CacheError>>,
    },
    TraceDetail {
        trace_id: String,
        reply: oneshot::Sender<Result<TraceDetail, CacheError>>,
    },
    Exists {
        trace_id: String,
        span_id: String,
        reply: oneshot::Sender<Result<bool, CacheError>>,
    },
}

/// Handle to one partition actor
///
/// Cheap to clone; all clones feed the same mailbox.
#[derive(Clone)]
pub struct PartitionHandle {
    tx: mpsc::Sender<PartitionCommand>,
}

impl PartitionHandle {
    /// Spawn the actor task for one partition and return its handle.
    pub fn spawn(key: impl Into<String>, store: Arc<dyn SpanStore>, config: CacheConfig) -> Self {
        let (tx, rx) = mpsc::channel(PARTITION_MAILBOX_SIZE);
        let partition = Partition {
            key: key.into(),
            store,
            config,
        };
        tokio::spawn(run(partition, rx));
        Self { tx }
    }

    /// Upsert a batch of spans, then sweep retention once.
    pub async fn ingest(&self, batch: IngestBatch) -> Result<(), CacheError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PartitionCommand::Ingest { batch, reply })
            .await
            .map_err(|_| CacheError::PartitionClosed)?;
        rx.await.map_err(|_| CacheError::PartitionClosed)?
    }

    /// Search all non-expired cached spans.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResponse, CacheError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PartitionCommand::Search {
                query: Box::new(query),
                reply,
            })
            .await
            .map_err(|_| CacheError::PartitionClosed)?;
        rx.await.map_err(|_| CacheError::PartitionClosed)?
    }

    /// Reconstruct one trace from its cached spans.
    pub async fn trace_detail(&self, trace_id: impl Into<String>) -> Result<TraceDetail, CacheError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PartitionCommand::TraceDetail {
                trace_id: trace_id.into(),
                reply,
            })
            .await
            .map_err(|_| CacheError::PartitionClosed)?;
        rx.await.map_err(|_| CacheError::PartitionClosed)?
    }

    /// Check whether a span is cached and alive. The only read with a write
    /// side effect: an expired record found here is deleted.
    pub async fn exists(
        &self,
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
    ) -> Result<bool, CacheError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PartitionCommand::Exists {
                trace_id: trace_id.into(),
                span_id: span_id.into(),
                reply,
            })
            .await
            .map_err(|_| CacheError::PartitionClosed)?;
        rx.await.map_err(|_| CacheError::PartitionClosed)?
    }
}

async fn run(partition: Partition, mut mailbox: mpsc::Receiver<PartitionCommand>) {
    tracing::debug!(partition = %partition.key, backend = partition.store.backend_name(), "Partition actor started");
    while let Some(command) = mailbox.recv().await {
        match command {
            PartitionCommand::Ingest { batch, reply } => {
                let _ = reply.send(partition.ingest(batch).await);
            }
            PartitionCommand::Search { query, reply } => {
                let _ = reply.send(partition.search(&query).await);
            }
            PartitionCommand::TraceDetail { trace_id, reply } => {
                let _ = reply.send(partition.trace_detail(&trace_id).await);
            }
            PartitionCommand::Exists {
                trace_id,
                span_id,
                reply,
            } => {
                let _ = reply.send(partition.exists(&trace_id, &span_id).await);
            }
        }
    }
    tracing::debug!(partition = %partition.key, "Partition actor stopped");
}

struct Partition {
    key: String,
    store: Arc<dyn SpanStore>,
    config: CacheConfig,
}

impl Partition {
    async fn ingest(&self, batch: IngestBatch) -> Result<(), CacheError> {
        // Reject malformed input before any merge or storage work
        for span in &batch.spans {
            if span.trace_id.is_empty() || span.span_id.is_empty() {
                return Err(CacheError::InvalidInput(
                    "every span requires a trace_id and a span_id".to_string(),
                ));
            }
        }

        let received_at = batch.received_at.unwrap_or_else(Utc::now);
        let span_count = batch.spans.len();

        for span in batch.spans {
            let key = SpanKey::span(&span.trace_id, &span.span_id);
            let existing = match self.store.get(&key).await? {
                Some(bytes) => match CacheRecord::decode(&bytes) {
                    Ok(record) => Some(record.span),
                    Err(error) => {
                        tracing::warn!(%key, %error, "Replacing undecodable cache record");
                        None
                    }
                },
                None => None,
            };

            let incoming = CachedSpan {
                span,
                received_at: Some(received_at),
                environment_id: batch.environment_id.clone(),
                project_id: batch.project_id.clone(),
                organization_id: batch.organization_id.clone(),
                service_name: batch.service_name.clone(),
                service_version: batch.service_version.clone(),
                resource_attributes: batch.resource_attributes.clone(),
            };
            let merged = merge_spans(existing, incoming);

            // Size accounting always reflects the value being written
            let size_bytes = serde_json::to_vec(&merged)?.len() as u64;
            let now = Utc::now();
            let record = CacheRecord {
                span: merged,
                received_at: now,
                expires_at: now + self.config.ttl_chrono(),
                size_bytes,
            };
            self.store.put(&key, record.encode()?).await?;
        }

        let outcome = run_sweep(self.store.as_ref(), &self.config, Utc::now()).await?;
        tracing::debug!(
            partition = %self.key,
            spans = span_count,
            expired = outcome.expired,
            evicted = outcome.evicted,
            "Ingested span batch"
        );
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, CacheError> {
        let spans = self.load_active(SpanKey::SCAN_PREFIX).await?;
        Ok(run_search(spans, query))
    }

    async fn trace_detail(&self, trace_id: &str) -> Result<TraceDetail, CacheError> {
        let spans = self.load_active(&SpanKey::trace_prefix(trace_id)).await?;
        Ok(reconstruct_trace(trace_id, spans))
    }

    async fn exists(&self, trace_id: &str, span_id: &str) -> Result<bool, CacheError> {
        let key = SpanKey::span(trace_id, span_id);
        let Some(bytes) = self.store.get(&key).await? else {
            return Ok(false);
        };
        match CacheRecord::decode(&bytes) {
            Ok(record) if !record.is_expired(Utc::now()) => Ok(true),
            Ok(_) => {
                // Lazy cleanup of the expired record
                self.store.delete(&key).await?;
                Ok(false)
            }
            Err(error) => {
                tracing::warn!(%key, %error, "Removing undecodable cache record");
                self.store.delete(&key).await?;
                Ok(false)
            }
        }
    }

    /// Load and decode all records under a prefix, hiding expired ones.
    /// Expired records are left in place for the next sweep.
    async fn load_active(&self, prefix: &str) -> Result<Vec<CachedSpan>, CacheError> {
        let now = Utc::now();
        let mut spans = Vec::new();
        for (key, bytes) in self.store.list(prefix).await? {
            match CacheRecord::decode(&bytes) {
                Ok(record) if record.is_expired(now) => {}
                Ok(record) => spans.push(record.span),
                Err(error) => {
                    tracing::warn!(%key, %error, "Skipping undecodable cache record");
                }
            }
        }
        Ok(spans)
    }
}
