//! Incremental parsing of in-flight model turns.
//!
//! One [`StreamingTokenParser`] serves a whole agent, keeping a buffer per
//! turn (keyed by step id). As tokens arrive the buffer is re-parsed through
//! the partial-JSON recovery path and classified with the same key-presence
//! rules as the complete-text parser, with one twist: the first type a turn
//! reveals is locked in, so later partials are interpreted under that type
//! even when the evolving data momentarily looks ambiguous.
//!
//! Events produced here are hints reconstructed from incomplete fragments.
//! Consumers must re-derive ground truth from the terminal event emitted
//! once the full response text has been classified.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::core_types::{AgentEvent, AgentFinalResponse, AgentPlan, AgentStep, ToolCall};
use crate::partial_json::parse_partial;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectedType {
    Plan,
    Step,
    FinalResponse,
}

fn detect_type(data: &Map<String, Value>) -> Option<DetectedType> {
    if data.contains_key("plan") {
        Some(DetectedType::Plan)
    } else if data.contains_key("tool_calls") {
        Some(DetectedType::Step)
    } else if data.contains_key("final_answer") {
        Some(DetectedType::FinalResponse)
    } else {
        None
    }
}

/// Per-turn accumulator that feeds arriving tokens into partial-JSON
/// recovery and emits incremental update events before the turn completes.
#[derive(Default)]
pub struct StreamingTokenParser {
    buffers: HashMap<String, String>,
    tokens: HashMap<String, Vec<String>>,
    detected_types: HashMap<String, DetectedType>,
}

impl StreamingTokenParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw token text to the buffer for `step_id`.
    pub fn add_token(&mut self, step_id: &str, token: &str) {
        self.buffers
            .entry(step_id.to_string())
            .or_default()
            .push_str(token);
        self.tokens
            .entry(step_id.to_string())
            .or_default()
            .push(token.to_string());
    }

    pub fn buffer(&self, step_id: &str) -> &str {
        self.buffers.get(step_id).map(String::as_str).unwrap_or("")
    }

    /// Discards the buffer and the locked-in type for `step_id`.
    pub fn clear(&mut self, step_id: &str) {
        self.buffers.remove(step_id);
        self.tokens.remove(step_id);
        self.detected_types.remove(step_id);
    }

    /// Attempts to parse the accumulated buffer into a structured event.
    ///
    /// Returns `None` while the buffer is empty or nothing classifiable has
    /// arrived. Once the payload's defining field is present and non-empty
    /// the returned event carries `complete == true`. A payload that parses
    /// to an object but reveals no known key yet is reported as a
    /// [`AgentEvent::StepUpdate`] so consumers can surface progress.
    pub fn try_parse_partial(&mut self, step_id: &str) -> Option<AgentEvent> {
        let buffer = self.buffers.get(step_id)?;
        if buffer.trim().is_empty() {
            return None;
        }

        let json_text = extract_json_from_partial(buffer);
        let value = parse_partial(&json_text);
        let data = value.as_object()?;
        if data.is_empty() {
            return None;
        }

        let detected = match self.detected_types.get(step_id).copied() {
            Some(locked) => locked,
            None => match detect_type(data) {
                Some(found) => {
                    log::debug!("Early detection: {:?} (step_id={})", found, step_id);
                    self.detected_types.insert(step_id.to_string(), found);
                    found
                }
                None => {
                    return Some(AgentEvent::StepUpdate {
                        data: value.clone(),
                        complete: false,
                        tokens: self.tokens.get(step_id).cloned(),
                    });
                }
            },
        };

        match detected {
            DetectedType::Plan => {
                let plan = partial_plan_steps(data.get("plan"));
                let complete = !plan.is_empty();
                Some(AgentEvent::Plan {
                    plan: AgentPlan {
                        thought: partial_string(data.get("thought")),
                        plan,
                    },
                    complete,
                })
            }
            DetectedType::Step => {
                let tool_calls = partial_tool_calls(data.get("tool_calls"));
                let complete = !tool_calls.is_empty();
                Some(AgentEvent::Step {
                    step: AgentStep {
                        thought: partial_string(data.get("thought")),
                        tool_calls,
                    },
                    complete,
                })
            }
            DetectedType::FinalResponse => {
                let final_answer = data
                    .get("final_answer")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                let complete = !final_answer.is_empty();
                Some(AgentEvent::FinalResponse {
                    response: AgentFinalResponse {
                        thought: partial_string(data.get("thought")),
                        final_answer,
                    },
                    complete,
                })
            }
        }
    }
}

fn partial_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Plan steps from partial data: a list keeps its string entries, a bare
/// string becomes a single entry.
fn partial_plan_steps(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Tool calls from partial data: only entries that already carry both an id
/// and a tool name count; half-received entries are dropped from the hint.
fn partial_tool_calls(value: Option<&Value>) -> Vec<ToolCall> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let object = item.as_object()?;
            let id = object.get("id").and_then(Value::as_str)?;
            let tool_name = object.get("tool_name").and_then(Value::as_str)?;
            if id.is_empty() || tool_name.is_empty() {
                return None;
            }
            Some(ToolCall {
                id: id.to_string(),
                tool_name: tool_name.to_string(),
                parameters: object
                    .get("parameters")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Fence stripping for partial text: tolerates a missing closing fence by
/// taking everything after the opening one.
fn extract_json_from_partial(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    match rest.find("```") {
        Some(end) => rest[..end].trim().to_string(),
        None => rest.to_string(),
    }
}
