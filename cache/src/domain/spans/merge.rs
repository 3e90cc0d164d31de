//! Span merge engine
//!
//! Spans stream in as partial updates: typically one "start" report and one
//! "finalize" report per span, but duplicates and reordering are expected.
//! The merge keeps the earliest start and latest end, and prefers non-empty
//! incoming collections so a sparser later update never erases detail that
//! already arrived. The result is commutative for the start/finalize pair
//! and idempotent under duplicate delivery.

use crate::data::types::{CachedSpan, SpanKind};

/// Merge an incoming span update into the existing cached span, if any.
pub fn merge_spans(existing: Option<CachedSpan>, incoming: CachedSpan) -> CachedSpan {
    let Some(previous) = existing else {
        return incoming;
    };
    let mut merged = incoming;

    // Earliest start, latest end; a missing side defers to the other.
    merged.span.start_time_unix_nano = min_defer(
        previous.span.start_time_unix_nano,
        merged.span.start_time_unix_nano,
    );
    merged.span.end_time_unix_nano = max_defer(
        previous.span.end_time_unix_nano,
        merged.span.end_time_unix_nano,
    );

    // Non-empty incoming wins, else keep what we had.
    if merged.span.attributes.is_empty() {
        merged.span.attributes = previous.span.attributes;
    }
    if merged.span.events.is_empty() {
        merged.span.events = previous.span.events;
    }
    if merged.span.links.is_empty() {
        merged.span.links = previous.span.links;
    }

    // Status: incoming wins when explicitly present (even an explicit UNSET).
    if merged.span.status.is_none() {
        merged.span.status = previous.span.status;
    }

    // Identity and context: incoming wins when present.
    if merged.span.parent_span_id.is_none() {
        merged.span.parent_span_id = previous.span.parent_span_id;
    }
    if merged.span.name.is_empty() {
        merged.span.name = previous.span.name;
    }
    if merged.span.kind == SpanKind::Unspecified {
        merged.span.kind = previous.span.kind;
    }
    if merged.received_at.is_none() {
        merged.received_at = previous.received_at;
    }
    if merged.service_name.is_none() {
        merged.service_name = previous.service_name;
    }
    if merged.service_version.is_none() {
        merged.service_version = previous.service_version;
    }
    if merged.resource_attributes.is_empty() {
        merged.resource_attributes = previous.resource_attributes;
    }

    merged
}

fn min_defer(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (value, None) | (None, value) => value,
    }
}

fn max_defer(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (value, None) | (None, value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{AttrMap, Span, SpanStatus, StatusCode};
    use serde_json::json;

    fn cached(span: Span) -> CachedSpan {
        CachedSpan {
            span,
            received_at: None,
            environment_id: "env".to_string(),
            project_id: "proj".to_string(),
            organization_id: "org".to_string(),
            service_name: None,
            service_version: None,
            resource_attributes: AttrMap::new(),
        }
    }

    fn span(start: Option<i64>, end: Option<i64>) -> Span {
        Span {
            trace_id: "t1".to_string(),
            span_id: "s1".to_string(),
            parent_span_id: None,
            name: "op".to_string(),
            kind: SpanKind::Internal,
            start_time_unix_nano: start,
            end_time_unix_nano: end,
            attributes: AttrMap::new(),
            events: vec![],
            links: vec![],
            status: None,
            dropped_attributes_count: 0,
            dropped_events_count: 0,
            dropped_links_count: 0,
        }
    }

    #[test]
    fn test_no_existing_returns_incoming_verbatim() {
        let incoming = cached(span(Some(100), None));
        let merged = merge_spans(None, incoming.clone());
        assert_eq!(merged, incoming);
    }

    #[test]
    fn test_earliest_start_latest_end() {
        let merged = merge_spans(
            Some(cached(span(Some(100), Some(500)))),
            cached(span(Some(200), Some(900))),
        );
        assert_eq!(merged.span.start_time_unix_nano, Some(100));
        assert_eq!(merged.span.end_time_unix_nano, Some(900));
    }

    #[test]
    fn test_missing_timestamps_defer() {
        let merged = merge_spans(
            Some(cached(span(Some(100), None))),
            cached(span(None, Some(900))),
        );
        assert_eq!(merged.span.start_time_unix_nano, Some(100));
        assert_eq!(merged.span.end_time_unix_nano, Some(900));
    }

    #[test]
    fn test_commutative_for_start_and_finalize() {
        let start_update = cached(span(Some(100), None));
        let finalize_update = cached(span(None, Some(900)));

        let forward = merge_spans(Some(start_update.clone()), finalize_update.clone());
        let reverse = merge_spans(Some(finalize_update), start_update);

        assert_eq!(
            forward.span.start_time_unix_nano,
            reverse.span.start_time_unix_nano
        );
        assert_eq!(
            forward.span.end_time_unix_nano,
            reverse.span.end_time_unix_nano
        );
    }

    #[test]
    fn test_idempotent_for_duplicate_delivery() {
        let update = cached(span(Some(100), Some(500)));
        let once = merge_spans(None, update.clone());
        let twice = merge_spans(Some(once.clone()), update);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sparser_update_does_not_erase_attributes() {
        let mut first = cached(span(Some(100), None));
        first
            .span
            .attributes
            .insert("gen_ai.system".to_string(), json!("anthropic"));

        let merged = merge_spans(Some(first), cached(span(None, Some(900))));
        assert_eq!(merged.span.attributes["gen_ai.system"], json!("anthropic"));
    }

    #[test]
    fn test_non_empty_incoming_attributes_win() {
        let mut first = cached(span(Some(100), None));
        first
            .span
            .attributes
            .insert("k".to_string(), json!("old"));

        let mut second = cached(span(None, None));
        second.span.attributes.insert("k".to_string(), json!("new"));

        let merged = merge_spans(Some(first), second);
        assert_eq!(merged.span.attributes["k"], json!("new"));
    }

    #[test]
    fn test_explicit_unset_status_overwrites_error() {
        let mut first = cached(span(Some(100), None));
        first.span.status = Some(SpanStatus {
            code: StatusCode::Error,
            message: Some("boom".to_string()),
        });

        let mut second = cached(span(None, None));
        second.span.status = Some(SpanStatus {
            code: StatusCode::Unset,
            message: None,
        });

        let merged = merge_spans(Some(first), second);
        assert_eq!(merged.span.status.unwrap().code, StatusCode::Unset);
    }

    #[test]
    fn test_absent_status_keeps_existing() {
        let mut first = cached(span(Some(100), None));
        first.span.status = Some(SpanStatus {
            code: StatusCode::Ok,
            message: None,
        });

        let merged = merge_spans(Some(first), cached(span(None, Some(900))));
        assert_eq!(merged.span.status.unwrap().code, StatusCode::Ok);
    }

    #[test]
    fn test_name_kind_and_service_fall_back_when_omitted() {
        let mut first = cached(span(Some(100), None));
        first.service_name = Some("checkout".to_string());
        first.service_version = Some("1.2.0".to_string());

        let mut second = cached(span(None, Some(900)));
        second.span.name = String::new();
        second.span.kind = SpanKind::Unspecified;

        let merged = merge_spans(Some(first), second);
        assert_eq!(merged.span.name, "op");
        assert_eq!(merged.span.kind, SpanKind::Internal);
        assert_eq!(merged.service_name, Some("checkout".to_string()));
        assert_eq!(merged.service_version, Some("1.2.0".to_string()));
    }

    #[test]
    fn test_parent_falls_back_when_omitted() {
        let mut first = cached(span(Some(100), None));
        first.span.parent_span_id = Some("parent-1".to_string());

        let merged = merge_spans(Some(first), cached(span(None, None)));
        assert_eq!(merged.span.parent_span_id, Some("parent-1".to_string()));
    }
}
