//! Attribute resolution layer
//!
//! Pure projections over a span's free-form attribute map. Every resolver is
//! a prioritized fallback chain over specific attribute keys; the only
//! "failure mode" is a missing value. Telemetry producers disagree on where
//! they put model names, token usage, and cost, so each chain checks the
//! current GenAI semantic conventions first and older or SDK-specific
//! spellings after.

mod attributes;

pub use attributes::{
    ResolvedError, resolve_cost_usd, resolve_duration_ms, resolve_end_time, resolve_error,
    resolve_function_id, resolve_function_name, resolve_function_version, resolve_input_messages,
    resolve_input_tokens, resolve_model, resolve_output_messages, resolve_output_tokens,
    resolve_provider, resolve_start_time, resolve_total_tokens, span_has_error,
};

// ============================================================================
// ATTRIBUTE KEYS
// ============================================================================

pub(crate) mod keys {
    // Models
    pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";
    pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";
    pub const AI_MODEL_ID: &str = "ai.model.id";
    pub const LLM_MODEL_NAME: &str = "llm.model_name";

    // Providers
    pub const GEN_AI_SYSTEM: &str = "gen_ai.system";
    pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";
    pub const AI_MODEL_PROVIDER: &str = "ai.model.provider";
    pub const LLM_PROVIDER: &str = "llm.provider";

    // Token usage
    pub const AI_USAGE: &str = "ai.usage";
    pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";
    pub const GEN_AI_USAGE_PROMPT_TOKENS: &str = "gen_ai.usage.prompt_tokens";
    pub const LLM_USAGE_PROMPT_TOKENS: &str = "llm.usage.prompt_tokens";
    pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";
    pub const GEN_AI_USAGE_COMPLETION_TOKENS: &str = "gen_ai.usage.completion_tokens";
    pub const LLM_USAGE_COMPLETION_TOKENS: &str = "llm.usage.completion_tokens";
    pub const GEN_AI_USAGE_TOTAL_TOKENS: &str = "gen_ai.usage.total_tokens";
    pub const LLM_TOKEN_COUNT_TOTAL: &str = "llm.token_count.total";

    // Cost
    pub const LLM_COST_TOTAL: &str = "llm.cost.total";
    pub const GEN_AI_USAGE_COST: &str = "gen_ai.usage.cost";
    pub const AI_USAGE_COST_MICROS: &str = "ai.usage.costMicros";

    // Function identity
    pub const AI_TELEMETRY_FUNCTION_ID: &str = "ai.telemetry.functionId";
    pub const FUNCTION_ID: &str = "function.id";
    pub const CODE_FUNCTION: &str = "code.function";
    pub const AI_TELEMETRY_FUNCTION_NAME: &str = "ai.telemetry.metadata.functionName";
    pub const AI_TELEMETRY_FUNCTION_VERSION: &str = "ai.telemetry.metadata.functionVersion";
    pub const FUNCTION_VERSION: &str = "function.version";

    // Errors
    pub const EXCEPTION_TYPE: &str = "exception.type";
    pub const EXCEPTION_MESSAGE: &str = "exception.message";
    pub const ERROR_TYPE: &str = "error.type";

    // Message I/O
    pub const GEN_AI_INPUT_MESSAGES: &str = "gen_ai.input.messages";
    pub const GEN_AI_PROMPT: &str = "gen_ai.prompt";
    pub const AI_PROMPT_MESSAGES: &str = "ai.prompt.messages";
    pub const INPUT_VALUE: &str = "input.value";
    pub const GEN_AI_OUTPUT_MESSAGES: &str = "gen_ai.output.messages";
    pub const GEN_AI_COMPLETION: &str = "gen_ai.completion";
    pub const AI_RESULT_TEXT: &str = "ai.result.text";
    pub const OUTPUT_VALUE: &str = "output.value";

    // Event names
    pub const EVENT_EXCEPTION: &str = "exception";
}
