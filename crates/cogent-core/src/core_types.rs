//! Core type definitions for the agent orchestration protocol.
//!
//! These types form the contract between the agent loop, the response parser,
//! and callers consuming the event stream. Conversation messages, tool calls
//! and results, the three structured response shapes the model can produce,
//! and the streaming event union all live here so that every other module
//! speaks the same vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation history. Immutable once created;
/// chronological order of the containing sequence is semantically significant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A single tool invocation request produced by the response parser and
/// consumed exactly once by dispatch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Outcome of one tool invocation. Exactly one of `result` or `error`
/// carries the payload; success is defined as `error == None`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// High-level outline emitted by the model before it starts executing.
/// Non-binding: a plan never advances tool execution by itself.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AgentPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub plan: Vec<String>,
}

/// Intermediate reasoning step requesting one or more tool invocations.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AgentStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl AgentStep {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Terminal response for a run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AgentFinalResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub final_answer: String,
}

/// Closed sum of the three structured responses a model turn can classify
/// into. Classification is an exhaustive match on this type; there is no
/// fourth outcome.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentResponse {
    Plan(AgentPlan),
    Step(AgentStep),
    Final(AgentFinalResponse),
}

/// Events emitted during one turn of the agent loop. Produced transiently,
/// consumed as they arrive, never persisted.
///
/// Events carrying a `complete` flag may be emitted repeatedly for the same
/// turn while streaming; only the last one with `complete == true` (or the
/// terminal event classified from the full response text) is validated data.
/// Earlier partials are best-effort hints reconstructed from incomplete JSON.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    StreamStart,
    Token {
        content: String,
    },
    StreamEnd,
    /// Partial parse of an in-flight turn whose response type is not yet
    /// identifiable. Carries the raw recovered JSON and the tokens seen.
    StepUpdate {
        data: Value,
        complete: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        tokens: Option<Vec<String>>,
    },
    ToolResults {
        results: Vec<ToolResult>,
    },
    #[serde(rename = "agent_plan")]
    Plan {
        plan: AgentPlan,
        complete: bool,
    },
    #[serde(rename = "agent_step")]
    Step {
        step: AgentStep,
        complete: bool,
    },
    FinalResponse {
        response: AgentFinalResponse,
        complete: bool,
    },
}
