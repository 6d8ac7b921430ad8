//! Classification of complete model output into structured responses.
//!
//! [`ResponseParser::parse`] is a total function: whatever the model sends
//! back, the loop receives one of the three [`AgentResponse`] variants. Text
//! that fails to parse or classify degrades to a final response carrying the
//! raw text, never an error. This path expects complete text; recovery of
//! in-flight fragments lives in [`crate::partial_json`] and
//! [`crate::streaming`].

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::core_types::{AgentFinalResponse, AgentPlan, AgentResponse, AgentStep, ToolCall};

pub struct ResponseParser;

impl ResponseParser {
    /// Parses raw LLM output into a plan, step, or final response.
    ///
    /// The fenced JSON payload is extracted (a block tagged `json` wins over
    /// an untagged one), parsed strictly, and classified by key presence:
    /// `plan`, then a non-empty `final_answer`, then a non-empty
    /// `tool_calls` list. Unclassifiable or unparseable text becomes a
    /// final response holding the original text verbatim.
    pub fn parse(response_text: &str) -> AgentResponse {
        let trimmed = response_text.trim();
        let json_text = Self::extract_json_from_markdown(trimmed);

        let data: Value = match serde_json::from_str(&json_text) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(
                    "Failed to parse JSON response, treating as final answer: {}",
                    err
                );
                return AgentResponse::Final(AgentFinalResponse {
                    thought: None,
                    final_answer: trimmed.to_string(),
                });
            }
        };

        match Self::classify(&data, trimmed) {
            Ok(response) => response,
            Err(err) => {
                log::error!("Error constructing response model: {}", err);
                AgentResponse::Final(AgentFinalResponse {
                    thought: None,
                    final_answer: format!("Error parsing response: {}", err),
                })
            }
        }
    }

    fn classify(data: &Value, raw_text: &str) -> Result<AgentResponse, serde_json::Error> {
        let object = match data.as_object() {
            Some(object) => object,
            None => {
                log::debug!("Response JSON is not an object, treating as final answer");
                return Ok(AgentResponse::Final(AgentFinalResponse {
                    thought: None,
                    final_answer: raw_text.to_string(),
                }));
            }
        };

        if object.contains_key("plan") {
            let plan: AgentPlan = serde_json::from_value(data.clone())?;
            log::debug!("Parsed as AgentPlan with {} steps", plan.plan.len());
            return Ok(AgentResponse::Plan(plan));
        }

        let has_final_answer = object
            .get("final_answer")
            .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
        if has_final_answer {
            let response: AgentFinalResponse = serde_json::from_value(data.clone())?;
            log::debug!("Parsed as AgentFinalResponse");
            return Ok(AgentResponse::Final(response));
        }

        let has_tool_calls = object
            .get("tool_calls")
            .and_then(Value::as_array)
            .is_some_and(|calls| !calls.is_empty());
        if has_tool_calls {
            let mut step: AgentStep = serde_json::from_value(data.clone())?;
            for tool_call in &mut step.tool_calls {
                tool_call.id = Self::normalize_call_id(&tool_call.id);
            }
            log::debug!("Parsed as AgentStep with {} tool calls", step.tool_calls.len());
            return Ok(AgentResponse::Step(step));
        }

        log::debug!("No recognizable structure, treating as final answer");
        Ok(AgentResponse::Final(AgentFinalResponse {
            thought: None,
            final_answer: raw_text.to_string(),
        }))
    }

    /// A valid supplied UUID is preserved byte-for-byte; anything else is
    /// replaced with a freshly generated v4 UUID.
    fn normalize_call_id(id: &str) -> String {
        if Uuid::parse_str(id).is_ok() {
            id.to_string()
        } else {
            let fresh = Uuid::new_v4().to_string();
            log::debug!("Replacing invalid tool call id '{}' with '{}'", id, fresh);
            fresh
        }
    }

    /// Extracts the content of a fenced code block, preferring one tagged
    /// `json`. Text without any fence is returned trimmed.
    fn extract_json_from_markdown(text: &str) -> String {
        let tagged = Regex::new(r"(?s)```json\s*\n?(.*?)```").expect("valid pattern");
        if let Some(captures) = tagged.captures(text) {
            return captures[1].trim().to_string();
        }

        let untagged = Regex::new(r"(?s)```\s*\n?(.*?)```").expect("valid pattern");
        if let Some(captures) = untagged.captures(text) {
            return captures[1].trim().to_string();
        }

        text.trim().to_string()
    }

    /// Structural completeness check per variant. Does not mutate and never
    /// fails; an invalid response simply reports `false`.
    pub fn validate(response: &AgentResponse) -> bool {
        match response {
            AgentResponse::Plan(plan) => {
                if plan.plan.is_empty() {
                    log::warn!("Invalid AgentPlan: must have non-empty plan");
                    return false;
                }
                true
            }
            AgentResponse::Step(step) => {
                if !step.has_tool_calls() {
                    log::warn!("Invalid AgentStep: must have tool_calls");
                    return false;
                }
                for tool_call in &step.tool_calls {
                    if tool_call.id.is_empty() || tool_call.tool_name.is_empty() {
                        log::warn!("Invalid tool call: missing id or tool_name");
                        return false;
                    }
                }
                true
            }
            AgentResponse::Final(response) => {
                if response.final_answer.is_empty() {
                    log::warn!("Invalid AgentFinalResponse: must have final_answer");
                    return false;
                }
                true
            }
        }
    }
}
