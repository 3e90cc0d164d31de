//! Trace reconstruction
//!
//! Rebuilds trace-level statistics from whatever spans of the trace are
//! still cached: the root span (the one with no parent, never guessed when
//! absent) and the total duration from the earliest start to the latest end
//! across all spans, computed on nanosecond timestamps.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::types::{AttrMap, CachedSpan, SpanEvent, SpanKind, SpanLink, StatusCode};
use crate::domain::extract;
use crate::utils::time::nanos_to_millis;

/// Detail projection of one cached span
#[derive(Debug, Clone, Serialize)]
pub struct SpanDetail {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: SpanKind,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cost_usd: Option<f64>,
    pub function_id: Option<String>,
    pub function_name: Option<String>,
    pub status_code: Option<StatusCode>,
    pub status_message: Option<String>,
    pub attributes: AttrMap,
    pub events: Vec<SpanEvent>,
    pub links: Vec<SpanLink>,
    pub environment_id: String,
    pub project_id: String,
    pub organization_id: String,
    pub service_name: Option<String>,
    pub service_version: Option<String>,
}

/// Reconstructed view of one trace
#[derive(Debug, Serialize)]
pub struct TraceDetail {
    pub trace_id: String,
    pub spans: Vec<SpanDetail>,
    pub root_span_id: Option<String>,
    pub total_duration_ms: Option<i64>,
}

/// Build the trace detail response from all cached spans of one trace.
pub fn reconstruct_trace(trace_id: &str, spans: Vec<CachedSpan>) -> TraceDetail {
    let root_span_id = spans
        .iter()
        .find(|cached| cached.span.parent_span_id.is_none())
        .map(|cached| cached.span.span_id.clone());

    let total_duration_ms = total_duration_ms(&spans);

    let mut details: Vec<SpanDetail> = spans.iter().map(to_detail).collect();
    // Ascending by start time, spans without one at the end
    details.sort_by(|a, b| match (a.start_time, b.start_time) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    TraceDetail {
        trace_id: trace_id.to_string(),
        spans: details,
        root_span_id,
        total_duration_ms,
    }
}

/// Latest end minus earliest start across all spans, in milliseconds.
/// `None` when the trace has no spans or no parseable timestamps.
fn total_duration_ms(spans: &[CachedSpan]) -> Option<i64> {
    let min_start = spans
        .iter()
        .filter_map(|cached| cached.span.start_time_unix_nano)
        .min()?;
    let max_end = spans
        .iter()
        .filter_map(|cached| cached.span.end_time_unix_nano)
        .max()?;
    Some(nanos_to_millis(max_end - min_start))
}

fn to_detail(cached: &CachedSpan) -> SpanDetail {
    let span = &cached.span;
    let attrs = &span.attributes;
    SpanDetail {
        trace_id: span.trace_id.clone(),
        span_id: span.span_id.clone(),
        parent_span_id: span.parent_span_id.clone(),
        name: span.name.clone(),
        kind: span.kind,
        start_time: extract::resolve_start_time(cached),
        end_time: extract::resolve_end_time(span),
        duration_ms: extract::resolve_duration_ms(span),
        model: extract::resolve_model(attrs),
        provider: extract::resolve_provider(attrs),
        input_tokens: extract::resolve_input_tokens(attrs),
        output_tokens: extract::resolve_output_tokens(attrs),
        total_tokens: extract::resolve_total_tokens(attrs),
        cost_usd: extract::resolve_cost_usd(attrs),
        function_id: extract::resolve_function_id(attrs),
        function_name: extract::resolve_function_name(attrs),
        status_code: span.status.as_ref().map(|s| s.code),
        status_message: span.status.as_ref().and_then(|s| s.message.clone()),
        attributes: attrs.clone(),
        events: span.events.clone(),
        links: span.links.clone(),
        environment_id: cached.environment_id.clone(),
        project_id: cached.project_id.clone(),
        organization_id: cached.organization_id.clone(),
        service_name: cached.service_name.clone(),
        service_version: cached.service_version.clone(),
    }
}
