//! Error types for failure handling across the agent loop.
//!
//! The taxonomy distinguishes transient failures that the retry layer may
//! re-attempt (raw LLM and tool errors) from domain errors produced after
//! retries are exhausted, lookup and construction failures that are never
//! retried, and the single control-flow error surfaced from a run
//! (`MaxIterations`). Malformed model output is deliberately absent here:
//! the response parser degrades it to a final response instead of failing.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AgentError {
    /// Raw LLM transport or provider failure, before retry accounting.
    #[error("LLM interaction failed: {0}")]
    LLMError(String),

    /// LLM failure after the retry budget was spent.
    #[error("LLM call failed after {retries} attempts: {message}")]
    LLMCall { message: String, retries: u32 },

    /// Raw failure raised by a tool implementation.
    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolError { tool_name: String, message: String },

    /// Tool failure after the retry budget was spent.
    #[error("Tool '{tool_name}' execution failed: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Tool '{tool_name}' not found in registry")]
    ToolNotFound { tool_name: String },

    #[error("ToolSet '{name}' not found in registry")]
    ToolSetNotFound { name: String },

    /// Raised synchronously at tool construction time, never deferred to
    /// execution.
    #[error("Tool '{tool_name}' has invalid schema: {reason}")]
    InvalidToolSchema { tool_name: String, reason: String },

    /// The iteration budget was spent without a final answer.
    #[error("Agent reached maximum iterations ({max_iterations}) without producing a final answer")]
    MaxIterations { max_iterations: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Whether the retry layer may re-attempt an operation that failed with
    /// this error. Lookup, schema, and configuration failures propagate
    /// immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::LLMError(_) | AgentError::ToolError { .. }
        )
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::LLMError(err.to_string())
    }
}
