//! Span, cached span, and cache record types
//!
//! Nanosecond timestamps travel as numeric strings on the wire so they
//! survive serialization boundaries without precision loss; internally they
//! are `i64` and are only converted to millisecond wall-clock values at
//! projection boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open, string-keyed map of dynamically-typed attribute values
pub type AttrMap = serde_json::Map<String, serde_json::Value>;

/// Span kind, mirroring the OTLP enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanKind {
    #[default]
    Unspecified,
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

/// Span status code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    #[default]
    Unset,
    Ok,
    Error,
}

/// Span status
///
/// A present status with code `UNSET` is still "explicitly present" for
/// merge purposes: a later update carrying it overwrites an earlier status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanStatus {
    #[serde(default)]
    pub code: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Timed event attached to a span
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    #[serde(default, with = "nano_ts")]
    pub time_unix_nano: Option<i64>,
    #[serde(default)]
    pub attributes: AttrMap,
}

/// Link from a span to a span in another trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanLink {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default)]
    pub attributes: AttrMap,
}

/// One timed unit of work in a distributed trace
///
/// `(trace_id, span_id)` is the unique identity; a span with no
/// `parent_span_id` is a root span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default)]
    pub parent_span_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: SpanKind,
    #[serde(default, with = "nano_ts")]
    pub start_time_unix_nano: Option<i64>,
    #[serde(default, with = "nano_ts")]
    pub end_time_unix_nano: Option<i64>,
    #[serde(default)]
    pub attributes: AttrMap,
    #[serde(default)]
    pub events: Vec<SpanEvent>,
    #[serde(default)]
    pub links: Vec<SpanLink>,
    #[serde(default)]
    pub status: Option<SpanStatus>,
    #[serde(default)]
    pub dropped_attributes_count: u32,
    #[serde(default)]
    pub dropped_events_count: u32,
    #[serde(default)]
    pub dropped_links_count: u32,
}

/// A span plus the ingestion context it arrived with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSpan {
    pub span: Span,
    /// Producer-reported ingestion time; start-time fallback in projections
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    pub environment_id: String,
    pub project_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_version: Option<String>,
    #[serde(default)]
    pub resource_attributes: AttrMap,
}

/// The unit of storage: a cached span plus cache bookkeeping
///
/// `received_at` is the cache write time (not the span's own ingestion
/// time) and is refreshed on every merge; `expires_at` is always exactly
/// one TTL after the last write, so expiry slides forward while a span
/// keeps receiving updates. `size_bytes` reflects only the most recently
/// written value and is used purely for capacity accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub span: CachedSpan,
    pub received_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub size_bytes: u64,
}

impl CacheRecord {
    /// Whether the record is logically absent for all read operations
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Serde helper for nanosecond timestamps: serializes as a numeric string,
/// accepts a number, a numeric string, or null.
mod nano_ts {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(nanos) => serializer.serialize_str(&nanos.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| D::Error::custom("nanosecond timestamp out of i64 range")),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid nanosecond timestamp: {s}"))),
            Some(other) => Err(D::Error::custom(format!(
                "invalid nanosecond timestamp: {other}"
            ))),
        }
    }
}
