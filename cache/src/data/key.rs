//! Storage key builder for cached spans
//!
//! Keys are laid out so that one prefix scans the whole partition and a
//! longer prefix scans a single trace:
//!
//! - `span:` covers every cached span
//! - `span:{trace_id}:` covers all spans of one trace
//! - `span:{trace_id}:{span_id}` addresses one span

/// Storage key builder
pub struct SpanKey;

impl SpanKey {
    /// Prefix covering every cached span record
    pub const SCAN_PREFIX: &'static str = "span:";

    /// Storage key for one span
    pub fn span(trace_id: &str, span_id: &str) -> String {
        format!("span:{}:{}", trace_id, span_id)
    }

    /// Prefix covering all spans of one trace
    pub fn trace_prefix(trace_id: &str) -> String {
        format!("span:{}:", trace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_key() {
        assert_eq!(SpanKey::span("t1", "s1"), "span:t1:s1");
    }

    #[test]
    fn test_trace_prefix_covers_span_keys() {
        let key = SpanKey::span("trace-abc", "span-1");
        assert!(key.starts_with(&SpanKey::trace_prefix("trace-abc")));
        assert!(key.starts_with(SpanKey::SCAN_PREFIX));
    }

    #[test]
    fn test_trace_prefix_does_not_match_sibling_trace() {
        let key = SpanKey::span("trace-ab", "span-1");
        assert!(!key.starts_with(&SpanKey::trace_prefix("trace-abc")));
    }
}
