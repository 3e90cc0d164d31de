//! Attribute resolvers for cached spans
//!
//! Each resolver walks a prioritized key chain and returns the first usable
//! value. Numeric attributes tolerate both JSON numbers and numeric strings
//! (several SDKs stringify counters). Token counts additionally check a
//! framework usage-summary object before falling back to flat keys.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::keys;
use crate::data::types::{AttrMap, CachedSpan, Span, StatusCode};
use crate::utils::text::value_text;
use crate::utils::time::{nanos_to_datetime, nanos_to_millis};

// ============================================================================
// SHARED HELPER FUNCTIONS
// ============================================================================

/// Get a non-empty string attribute.
fn attr_str<'a>(attrs: &'a AttrMap, key: &str) -> Option<&'a str> {
    attrs
        .get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
}

/// Get an integer attribute, accepting numbers and numeric strings.
fn attr_i64(attrs: &AttrMap, key: &str) -> Option<i64> {
    attrs.get(key).and_then(value_as_i64)
}

/// Get a float attribute, accepting numbers and numeric strings.
fn attr_f64(attrs: &AttrMap, key: &str) -> Option<f64> {
    attrs.get(key).and_then(value_as_f64)
}

/// First non-empty string across a key chain.
fn first_str<'a>(attrs: &'a AttrMap, chain: &[&str]) -> Option<&'a str> {
    chain.iter().find_map(|key| attr_str(attrs, key))
}

/// First float across a key chain.
fn first_f64(attrs: &AttrMap, chain: &[&str]) -> Option<f64> {
    chain.iter().find_map(|key| attr_f64(attrs, key))
}

fn value_as_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_as_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ============================================================================
// MODEL / PROVIDER
// ============================================================================

const MODEL_KEYS: &[&str] = &[
    keys::GEN_AI_REQUEST_MODEL,
    keys::GEN_AI_RESPONSE_MODEL,
    keys::AI_MODEL_ID,
    keys::LLM_MODEL_NAME,
];

const PROVIDER_KEYS: &[&str] = &[
    keys::GEN_AI_SYSTEM,
    keys::GEN_AI_PROVIDER_NAME,
    keys::AI_MODEL_PROVIDER,
    keys::LLM_PROVIDER,
];

/// Model name reported for the span, if any.
pub fn resolve_model(attrs: &AttrMap) -> Option<String> {
    first_str(attrs, MODEL_KEYS).map(str::to_string)
}

/// Provider identifier reported for the span, if any.
pub fn resolve_provider(attrs: &AttrMap) -> Option<String> {
    first_str(attrs, PROVIDER_KEYS).map(str::to_string)
}

// ============================================================================
// TOKEN USAGE
// ============================================================================

/// Token count extraction: usage-summary object fields first, then flat
/// attribute keys.
struct TokenChain {
    summary_fields: &'static [&'static str],
    keys: &'static [&'static str],
}

impl TokenChain {
    fn resolve(&self, attrs: &AttrMap) -> Option<i64> {
        if let Some(usage) = usage_summary(attrs) {
            if let Some(count) = self
                .summary_fields
                .iter()
                .find_map(|field| usage.get(*field).and_then(value_as_i64))
            {
                return Some(count);
            }
        }
        self.keys.iter().find_map(|key| attr_i64(attrs, key))
    }
}

const INPUT_TOKENS: TokenChain = TokenChain {
    summary_fields: &["promptTokens", "inputTokens"],
    keys: &[
        keys::GEN_AI_USAGE_INPUT_TOKENS,
        keys::GEN_AI_USAGE_PROMPT_TOKENS,
        keys::LLM_USAGE_PROMPT_TOKENS,
    ],
};

const OUTPUT_TOKENS: TokenChain = TokenChain {
    summary_fields: &["completionTokens", "outputTokens"],
    keys: &[
        keys::GEN_AI_USAGE_OUTPUT_TOKENS,
        keys::GEN_AI_USAGE_COMPLETION_TOKENS,
        keys::LLM_USAGE_COMPLETION_TOKENS,
    ],
};

const TOTAL_TOKENS: TokenChain = TokenChain {
    summary_fields: &["totalTokens"],
    keys: &[
        keys::GEN_AI_USAGE_TOTAL_TOKENS,
        keys::LLM_TOKEN_COUNT_TOTAL,
    ],
};

/// The framework usage-summary object (`ai.usage`), either inline or as a
/// JSON string.
fn usage_summary(attrs: &AttrMap) -> Option<JsonValue> {
    match attrs.get(keys::AI_USAGE)? {
        JsonValue::Object(map) => Some(JsonValue::Object(map.clone())),
        JsonValue::String(s) => serde_json::from_str::<JsonValue>(s)
            .ok()
            .filter(|v| v.is_object()),
        _ => None,
    }
}

pub fn resolve_input_tokens(attrs: &AttrMap) -> Option<i64> {
    INPUT_TOKENS.resolve(attrs)
}

pub fn resolve_output_tokens(attrs: &AttrMap) -> Option<i64> {
    OUTPUT_TOKENS.resolve(attrs)
}

/// Total token count. When no source reports a total, input + output is
/// summed instead (totals only; input and output are never synthesized).
pub fn resolve_total_tokens(attrs: &AttrMap) -> Option<i64> {
    if let Some(total) = TOTAL_TOKENS.resolve(attrs) {
        return Some(total);
    }
    match (resolve_input_tokens(attrs), resolve_output_tokens(attrs)) {
        (None, None) => None,
        (input, output) => Some(input.unwrap_or(0) + output.unwrap_or(0)),
    }
}

// ============================================================================
// COST
// ============================================================================

/// Span cost normalized to USD. `ai.usage.costMicros` reports micro-USD;
/// the other sources are already USD.
pub fn resolve_cost_usd(attrs: &AttrMap) -> Option<f64> {
    first_f64(attrs, &[keys::LLM_COST_TOTAL, keys::GEN_AI_USAGE_COST])
        .or_else(|| attr_f64(attrs, keys::AI_USAGE_COST_MICROS).map(|micros| micros / 1_000_000.0))
}

// ============================================================================
// FUNCTION IDENTITY
// ============================================================================

pub fn resolve_function_id(attrs: &AttrMap) -> Option<String> {
    first_str(attrs, &[keys::AI_TELEMETRY_FUNCTION_ID, keys::FUNCTION_ID]).map(str::to_string)
}

pub fn resolve_function_name(attrs: &AttrMap) -> Option<String> {
    first_str(attrs, &[keys::CODE_FUNCTION, keys::AI_TELEMETRY_FUNCTION_NAME]).map(str::to_string)
}

pub fn resolve_function_version(attrs: &AttrMap) -> Option<String> {
    first_str(
        attrs,
        &[keys::AI_TELEMETRY_FUNCTION_VERSION, keys::FUNCTION_VERSION],
    )
    .map(str::to_string)
}

// ============================================================================
// ERRORS
// ============================================================================

/// Error information resolved from attributes, events, or status.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedError {
    pub error_type: Option<String>,
    pub message: Option<String>,
}

/// Resolve error details: exception attributes first, then an `exception`
/// span event, then an error status.
pub fn resolve_error(span: &Span) -> Option<ResolvedError> {
    let error_type =
        first_str(&span.attributes, &[keys::EXCEPTION_TYPE, keys::ERROR_TYPE]).map(str::to_string);
    let message = attr_str(&span.attributes, keys::EXCEPTION_MESSAGE).map(str::to_string);
    if error_type.is_some() || message.is_some() {
        return Some(ResolvedError {
            error_type,
            message,
        });
    }

    if let Some(event) = span.events.iter().find(|e| e.name == keys::EVENT_EXCEPTION) {
        let error_type = attr_str(&event.attributes, keys::EXCEPTION_TYPE).map(str::to_string);
        let message = attr_str(&event.attributes, keys::EXCEPTION_MESSAGE).map(str::to_string);
        if error_type.is_some() || message.is_some() {
            return Some(ResolvedError {
                error_type,
                message,
            });
        }
    }

    match &span.status {
        Some(status) if status.code == StatusCode::Error => Some(ResolvedError {
            error_type: None,
            message: status.message.clone(),
        }),
        _ => None,
    }
}

/// Whether the span carries any error signal.
pub fn span_has_error(span: &Span) -> bool {
    resolve_error(span).is_some()
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Span start as wall-clock time; the producer-reported ingestion time is
/// the fallback when the span never carried a start timestamp.
pub fn resolve_start_time(cached: &CachedSpan) -> Option<DateTime<Utc>> {
    cached
        .span
        .start_time_unix_nano
        .map(nanos_to_datetime)
        .or(cached.received_at)
}

/// Span end as wall-clock time, if reported.
pub fn resolve_end_time(span: &Span) -> Option<DateTime<Utc>> {
    span.end_time_unix_nano.map(nanos_to_datetime)
}

/// Span duration in whole milliseconds; requires both timestamps. Clamped
/// to zero when the producer reported end before start.
pub fn resolve_duration_ms(span: &Span) -> Option<i64> {
    match (span.start_time_unix_nano, span.end_time_unix_nano) {
        (Some(start), Some(end)) if end >= start => Some(nanos_to_millis(end - start)),
        (Some(_), Some(_)) => Some(0),
        _ => None,
    }
}

// ============================================================================
// MESSAGE I/O TEXT
// ============================================================================

const INPUT_MESSAGE_KEYS: &[&str] = &[
    keys::GEN_AI_INPUT_MESSAGES,
    keys::GEN_AI_PROMPT,
    keys::AI_PROMPT_MESSAGES,
    keys::INPUT_VALUE,
];

const OUTPUT_MESSAGE_KEYS: &[&str] = &[
    keys::GEN_AI_OUTPUT_MESSAGES,
    keys::GEN_AI_COMPLETION,
    keys::AI_RESULT_TEXT,
    keys::OUTPUT_VALUE,
];

fn first_text(attrs: &AttrMap, chain: &[&str]) -> Option<String> {
    chain
        .iter()
        .filter_map(|key| attrs.get(*key))
        .map(value_text)
        .find(|text| !text.is_empty())
}

/// Input message text for free-text matching, from the highest-priority key
/// that carries anything.
pub fn resolve_input_messages(attrs: &AttrMap) -> Option<String> {
    first_text(attrs, INPUT_MESSAGE_KEYS)
}

/// Output message text for free-text matching.
pub fn resolve_output_messages(attrs: &AttrMap) -> Option<String> {
    first_text(attrs, OUTPUT_MESSAGE_KEYS)
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;
