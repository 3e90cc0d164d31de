//! Span search over the live cache
//!
//! A search is a linear scan: every non-expired cached span is checked
//! against the supplied predicates (ANDed; absent predicates are no-ops),
//! survivors are projected to a summary shape and sorted. There is no
//! pagination over a bounded recent-window cache, so `has_more` is always
//! `false`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::types::{AttrMap, CachedSpan};
use crate::domain::extract;
use crate::utils::text::{contains_ascii_ignore_case, tokenize, value_text};

// ============================================================================
// QUERY TYPES
// ============================================================================

/// Operator for a generic attribute filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Neq,
    Contains,
    Exists,
}

/// One predicate against the raw attribute map
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeFilter {
    pub key: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: JsonValue,
}

/// Sortable summary field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    StartTime,
    DurationMs,
    TotalTokens,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Search request over one cache partition
///
/// The time range is required; every other predicate is optional and ANDed
/// with the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Free-text tokens matched against the span name
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub span_id: Option<String>,
    /// Allow-list of resolved model names
    #[serde(default)]
    pub model: Option<Vec<String>>,
    /// Allow-list of resolved provider ids
    #[serde(default)]
    pub provider: Option<Vec<String>>,
    #[serde(default)]
    pub function_id: Option<String>,
    #[serde(default)]
    pub function_name: Option<String>,
    /// Exact name or `prefix + "."` dotted match
    #[serde(default)]
    pub span_name_prefix: Option<String>,
    #[serde(default)]
    pub has_error: Option<bool>,
    #[serde(default)]
    pub min_tokens: Option<i64>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
    /// Inclusive duration bounds in milliseconds
    #[serde(default)]
    pub min_duration: Option<i64>,
    #[serde(default)]
    pub max_duration: Option<i64>,
    #[serde(default)]
    pub attribute_filters: Vec<AttributeFilter>,
    #[serde(default)]
    pub input_messages_query: Option<String>,
    #[serde(default)]
    pub output_messages_query: Option<String>,
    #[serde(default)]
    pub root_spans_only: bool,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Summary projection of one matching span
///
/// `has_children` cannot be computed accurately from a single cached span,
/// so it is fixed to `false`.
#[derive(Debug, Clone, Serialize)]
pub struct SpanSummary {
    pub trace_id: String,
    pub span_id: String,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cost_usd: Option<f64>,
    pub function_id: Option<String>,
    pub function_name: Option<String>,
    pub has_children: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub spans: Vec<SpanSummary>,
    pub total: usize,
    pub has_more: bool,
}

// ============================================================================
// SEARCH
// ============================================================================

/// Filter, project, and sort the given non-expired spans.
pub fn run_search(spans: Vec<CachedSpan>, query: &SearchQuery) -> SearchResponse {
    let mut results: Vec<SpanSummary> = spans
        .iter()
        .filter(|cached| matches(cached, query))
        .map(to_summary)
        .collect();

    sort_summaries(&mut results, query.sort_by, query.sort_order);

    tracing::debug!(
        scanned = spans.len(),
        matched = results.len(),
        "Span search complete"
    );

    SearchResponse {
        total: results.len(),
        spans: results,
        has_more: false,
    }
}

fn matches(cached: &CachedSpan, query: &SearchQuery) -> bool {
    let span = &cached.span;
    let attrs = &span.attributes;

    // Required time range over the resolved start time
    let Some(start) = extract::resolve_start_time(cached) else {
        return false;
    };
    if start < query.start_time || start > query.end_time {
        return false;
    }

    if let Some(trace_id) = &query.trace_id {
        if span.trace_id != *trace_id {
            return false;
        }
    }
    if let Some(span_id) = &query.span_id {
        if span.span_id != *span_id {
            return false;
        }
    }

    // Free-text: every token must appear in the lowercased name
    if let Some(text) = &query.query {
        let name = span.name.to_lowercase();
        if !tokenize(text).iter().all(|token| name.contains(token)) {
            return false;
        }
    }

    if let Some(needle) = &query.input_messages_query {
        let matched = extract::resolve_input_messages(attrs)
            .is_some_and(|text| contains_ascii_ignore_case(&text, needle));
        if !matched {
            return false;
        }
    }
    if let Some(needle) = &query.output_messages_query {
        let matched = extract::resolve_output_messages(attrs)
            .is_some_and(|text| contains_ascii_ignore_case(&text, needle));
        if !matched {
            return false;
        }
    }

    if let Some(models) = &query.model {
        if !models.is_empty() {
            let matched = extract::resolve_model(attrs).is_some_and(|m| models.contains(&m));
            if !matched {
                return false;
            }
        }
    }
    if let Some(providers) = &query.provider {
        if !providers.is_empty() {
            let matched =
                extract::resolve_provider(attrs).is_some_and(|p| providers.contains(&p));
            if !matched {
                return false;
            }
        }
    }

    if let Some(function_id) = &query.function_id {
        if extract::resolve_function_id(attrs).as_deref() != Some(function_id.as_str()) {
            return false;
        }
    }
    if let Some(function_name) = &query.function_name {
        if extract::resolve_function_name(attrs).as_deref() != Some(function_name.as_str()) {
            return false;
        }
    }

    if let Some(prefix) = &query.span_name_prefix {
        if !name_matches_prefix(&span.name, prefix) {
            return false;
        }
    }

    if let Some(wants_error) = query.has_error {
        if extract::span_has_error(span) != wants_error {
            return false;
        }
    }

    if query.min_tokens.is_some() || query.max_tokens.is_some() {
        let Some(total) = extract::resolve_total_tokens(attrs) else {
            return false;
        };
        if query.min_tokens.is_some_and(|min| total < min)
            || query.max_tokens.is_some_and(|max| total > max)
        {
            return false;
        }
    }

    if query.min_duration.is_some() || query.max_duration.is_some() {
        let Some(duration) = extract::resolve_duration_ms(span) else {
            return false;
        };
        if query.min_duration.is_some_and(|min| duration < min)
            || query.max_duration.is_some_and(|max| duration > max)
        {
            return false;
        }
    }

    if !query
        .attribute_filters
        .iter()
        .all(|filter| eval_attribute_filter(attrs, filter))
    {
        return false;
    }

    if query.root_spans_only && span.parent_span_id.is_some() {
        return false;
    }

    true
}

/// Exact equality, or dotted-suffix match under `prefix + "."`.
fn name_matches_prefix(name: &str, prefix: &str) -> bool {
    name == prefix
        || name
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Evaluate one attribute filter against the raw attribute map.
///
/// Missing value semantics: `exists` is false, `neq` is true, `eq` and
/// `contains` are false.
fn eval_attribute_filter(attrs: &AttrMap, filter: &AttributeFilter) -> bool {
    let attr = attrs.get(&filter.key);
    match filter.operator {
        FilterOperator::Exists => attr.is_some(),
        FilterOperator::Eq => attr.is_some_and(|v| value_text(v) == value_text(&filter.value)),
        FilterOperator::Neq => attr.is_none_or(|v| value_text(v) != value_text(&filter.value)),
        FilterOperator::Contains => attr
            .is_some_and(|v| contains_ascii_ignore_case(&value_text(v), &value_text(&filter.value))),
    }
}

// ============================================================================
// PROJECTION & SORT
// ============================================================================

fn to_summary(cached: &CachedSpan) -> SpanSummary {
    let span = &cached.span;
    let attrs = &span.attributes;
    SpanSummary {
        trace_id: span.trace_id.clone(),
        span_id: span.span_id.clone(),
        name: span.name.clone(),
        start_time: extract::resolve_start_time(cached),
        duration_ms: extract::resolve_duration_ms(span),
        model: extract::resolve_model(attrs),
        provider: extract::resolve_provider(attrs),
        input_tokens: extract::resolve_input_tokens(attrs),
        output_tokens: extract::resolve_output_tokens(attrs),
        total_tokens: extract::resolve_total_tokens(attrs),
        cost_usd: extract::resolve_cost_usd(attrs),
        function_id: extract::resolve_function_id(attrs),
        function_name: extract::resolve_function_name(attrs),
        has_children: false,
    }
}

fn sort_key(summary: &SpanSummary, sort_by: SortBy) -> Option<i64> {
    match sort_by {
        SortBy::StartTime => summary.start_time.map(|t| t.timestamp_millis()),
        SortBy::DurationMs => summary.duration_ms,
        SortBy::TotalTokens => summary.total_tokens,
    }
}

/// Sort with missing values pushed to the end for either direction, never
/// treated as zero.
fn sort_summaries(summaries: &mut [SpanSummary], sort_by: SortBy, order: SortOrder) {
    summaries.sort_by(|a, b| {
        match (sort_key(a, sort_by), sort_key(b, sort_by)) {
            (Some(a), Some(b)) => match order {
                SortOrder::Asc => a.cmp(&b),
                SortOrder::Desc => b.cmp(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}
