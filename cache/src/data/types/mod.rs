//! Cached span data model

mod span;

pub use span::{
    AttrMap, CacheRecord, CachedSpan, Span, SpanEvent, SpanLink, SpanKind, SpanStatus, StatusCode,
};
