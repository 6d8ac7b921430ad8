//! The agent orchestration loop.
//!
//! An [`Agent`] owns the conversation history, a tool registry, and an LLM
//! client, and drives the iterate-until-final-answer cycle: build the
//! outbound message list, call the model (optionally streaming), classify
//! the response, dispatch any requested tools, and feed the results back as
//! the next user turn. Every run is bounded by `max_iterations`; spending
//! the budget without a final answer is the one control-flow error a run
//! can surface.

use std::sync::Arc;

use async_stream::stream;
use chrono::{FixedOffset, Utc};
use futures_util::{Stream, StreamExt};
use uuid::Uuid;

use crate::core_types::{
    AgentEvent, AgentFinalResponse, AgentResponse, Message, Role, ToolCall, ToolResult,
};
use crate::errors::AgentError;
use crate::llm::LlmClient;
use crate::parser::ResponseParser;
use crate::prompts::{build_system_prompt, default_format_instructions};
use crate::retry::RetryConfig;
use crate::streaming::StreamingTokenParser;
use crate::tools::{Tool, ToolRegistry, ToolSet};

#[derive(Clone)]
pub struct AgentConfig {
    /// Upper bound on model turns per run.
    pub max_iterations: usize,
    /// Task instructions prepended to the system prompt. `None` uses a
    /// generic default.
    pub system_prompt: Option<String>,
    /// Override for the response format block. `None` uses the built-in
    /// instructions.
    pub format_instructions: Option<String>,
    /// Whether to request token streams from the client.
    pub stream: bool,
    /// Offset for the timestamp rendered into the system prompt. `None`
    /// renders UTC.
    pub timezone: Option<FixedOffset>,
    /// Backoff policy shared by LLM calls and tool executions.
    pub retry: RetryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            system_prompt: None,
            format_instructions: None,
            stream: false,
            timezone: None,
            retry: RetryConfig::default(),
        }
    }
}

pub struct Agent {
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    history: Vec<Message>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_config(llm, AgentConfig::default())
    }

    pub fn with_config(llm: Arc<dyn LlmClient>, config: AgentConfig) -> Self {
        Self {
            llm,
            registry: ToolRegistry::new(),
            history: Vec::new(),
            config,
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        self.registry.register(tool);
    }

    pub fn unregister_tool(&mut self, tool_name: &str) -> Result<(), AgentError> {
        self.registry.unregister(tool_name)
    }

    pub fn register_toolset(&mut self, toolset: ToolSet) {
        self.registry.register_toolset(toolset);
    }

    pub fn list_tools(&self) -> Vec<String> {
        self.registry.list_tool_names()
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.config.system_prompt = Some(prompt.into());
    }

    pub fn set_format_instructions(&mut self, instructions: impl Into<String>) {
        self.config.format_instructions = Some(instructions.into());
    }

    pub fn set_timezone(&mut self, offset: FixedOffset) {
        self.config.timezone = Some(offset);
    }

    /// Clears the conversation history. Registered tools are kept.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// The outbound message list for one model turn: a freshly rendered
    /// system message followed by the history. The system message is
    /// rebuilt every turn so the tool listing and timestamp stay current.
    fn build_messages(&self) -> Vec<Message> {
        let format_instructions = self
            .config
            .format_instructions
            .as_deref()
            .unwrap_or(default_format_instructions());
        let base = build_system_prompt(self.config.system_prompt.as_deref(), format_instructions);
        let now = match self.config.timezone {
            Some(offset) => Utc::now()
                .with_timezone(&offset)
                .format("%A, %B %d, %Y at %I:%M:%S %p UTC%:z")
                .to_string(),
            None => Utc::now()
                .format("%A, %B %d, %Y at %I:%M:%S %p UTC")
                .to_string(),
        };
        let system = format!(
            "{}\n\nCurrent Date and Time: {}\n\n{}",
            base,
            now,
            self.registry.format_for_prompt()
        );

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(Message::new(Role::System, system));
        messages.extend(self.history.iter().cloned());
        messages
    }

    /// Runs the loop to completion and returns the final answer text.
    ///
    /// LLM failures after retries degrade to an `Error:`-prefixed answer
    /// rather than an `Err`; only spending the iteration budget (or a
    /// streaming configuration error) fails the run.
    pub async fn run(&mut self, user_input: impl Into<String>) -> Result<String, AgentError> {
        let max_iterations = self.config.max_iterations;
        let mut events = Box::pin(self.run_stream(user_input));
        let mut answer = None;
        while let Some(event) = events.next().await {
            if let AgentEvent::FinalResponse {
                response,
                complete: true,
            } = event?
            {
                answer = Some(response.final_answer);
            }
        }
        answer.ok_or(AgentError::MaxIterations { max_iterations })
    }

    /// Runs the loop, yielding events as they occur. The stream ends after
    /// a complete `FinalResponse` event, or with `Err(MaxIterations)` when
    /// the iteration budget is spent first.
    pub fn run_stream(
        &mut self,
        user_input: impl Into<String>,
    ) -> impl Stream<Item = Result<AgentEvent, AgentError>> + '_ {
        let user_input = user_input.into();
        stream! {
            self.history.push(Message::new(Role::User, user_input));
            let mut accumulator = StreamingTokenParser::new();

            for iteration in 1..=self.config.max_iterations {
                log::debug!("Agent iteration {}/{}", iteration, self.config.max_iterations);
                let messages = self.build_messages();

                let response_text = if self.config.stream {
                    let step_id = Uuid::new_v4().to_string();
                    let mut token_stream = match self.llm.call_stream(&messages).await {
                        Ok(token_stream) => token_stream,
                        // A client without streaming support is a setup
                        // problem, not a transient one; surface it as-is.
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    };

                    yield Ok(AgentEvent::StreamStart);
                    let mut type_complete = false;
                    let mut stream_error = None;
                    while let Some(chunk) = token_stream.next().await {
                        match chunk {
                            Ok(token) => {
                                yield Ok(AgentEvent::Token { content: token.clone() });
                                accumulator.add_token(&step_id, &token);
                                if !type_complete {
                                    if let Some(event) = accumulator.try_parse_partial(&step_id) {
                                        type_complete = event_is_complete(&event);
                                        yield Ok(event);
                                    }
                                }
                            }
                            Err(err) => {
                                stream_error = Some(err.to_string());
                                break;
                            }
                        }
                    }
                    yield Ok(AgentEvent::StreamEnd);

                    if let Some(message) = stream_error {
                        log::error!("Token stream failed: {}", message);
                        accumulator.clear(&step_id);
                        yield Ok(degraded_final_event(&message));
                        return;
                    }

                    let text = accumulator.buffer(&step_id).to_string();
                    accumulator.clear(&step_id);
                    text
                } else {
                    let llm = self.llm.clone();
                    let result = self
                        .config
                        .retry
                        .run(
                            || {
                                let llm = llm.clone();
                                let messages = messages.clone();
                                async move { llm.call(&messages).await }
                            },
                            AgentError::is_retryable,
                        )
                        .await;
                    match result {
                        Ok(text) => text,
                        Err(err) => {
                            // Exhaustion converts to the domain error; the
                            // degraded answer carries the underlying cause,
                            // not the transport wrapper.
                            let cause = match err {
                                AgentError::LLMError(message) => message,
                                other => other.to_string(),
                            };
                            let exhausted = AgentError::LLMCall {
                                message: cause.clone(),
                                retries: self.config.retry.max_attempts,
                            };
                            log::error!("{}", exhausted);
                            yield Ok(degraded_final_event(&cause));
                            return;
                        }
                    }
                };

                // The raw model output always enters history, even when it
                // fails to parse as structured JSON.
                self.history
                    .push(Message::new(Role::Assistant, response_text.clone()));

                match ResponseParser::parse(&response_text) {
                    AgentResponse::Plan(plan) => {
                        log::info!("Agent produced a plan with {} steps", plan.plan.len());
                        yield Ok(AgentEvent::Plan { plan, complete: true });
                    }
                    AgentResponse::Step(step) => {
                        log::info!(
                            "Agent requested {} tool call(s)",
                            step.tool_calls.len()
                        );
                        yield Ok(AgentEvent::Step {
                            step: step.clone(),
                            complete: true,
                        });
                        let results = self.dispatch_tools(&step.tool_calls).await;
                        self.history
                            .push(Message::new(Role::User, format_tool_results(&results)));
                        yield Ok(AgentEvent::ToolResults { results });
                    }
                    AgentResponse::Final(response) => {
                        yield Ok(AgentEvent::FinalResponse {
                            response,
                            complete: true,
                        });
                        return;
                    }
                }
            }

            yield Err(AgentError::MaxIterations {
                max_iterations: self.config.max_iterations,
            });
        }
    }

    /// Executes the requested calls sequentially. A failing call never
    /// aborts the batch; its failure is recorded in that call's result and
    /// the rest still run.
    async fn dispatch_tools(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.dispatch_one(call).await);
        }
        results
    }

    async fn dispatch_one(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.registry.get(&call.tool_name) else {
            log::warn!("Requested tool '{}' is not registered", call.tool_name);
            return ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.tool_name.clone(),
                result: String::new(),
                error: Some(format!("Tool '{}' not found", call.tool_name)),
            };
        };

        // Hidden toolset parameters merge underneath the model-supplied
        // ones; on a key collision the model's value wins.
        let mut parameters = self
            .registry
            .toolset_params(&call.tool_name)
            .cloned()
            .unwrap_or_default();
        for (key, value) in &call.parameters {
            parameters.insert(key.clone(), value.clone());
        }

        let outcome = self
            .config
            .retry
            .run(
                || {
                    let tool = tool.clone();
                    let parameters = parameters.clone();
                    async move { tool.execute(parameters).await }
                },
                AgentError::is_retryable,
            )
            .await;

        match outcome {
            // Legacy convention: tools may report failure as an Ok payload
            // beginning with "Error".
            Ok(output) if output.starts_with("Error") => ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.tool_name.clone(),
                result: String::new(),
                error: Some(output),
            },
            Ok(output) => ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.tool_name.clone(),
                result: output,
                error: None,
            },
            Err(err) => {
                let wrapped = AgentError::ToolExecution {
                    tool_name: call.tool_name.clone(),
                    message: err.to_string(),
                };
                log::warn!("{}", wrapped);
                ToolResult {
                    tool_call_id: call.id.clone(),
                    tool_name: call.tool_name.clone(),
                    result: String::new(),
                    error: Some(wrapped.to_string()),
                }
            }
        }
    }
}

fn event_is_complete(event: &AgentEvent) -> bool {
    match event {
        AgentEvent::Plan { complete, .. }
        | AgentEvent::Step { complete, .. }
        | AgentEvent::FinalResponse { complete, .. }
        | AgentEvent::StepUpdate { complete, .. } => *complete,
        _ => false,
    }
}

fn degraded_final_event(message: &str) -> AgentEvent {
    AgentEvent::FinalResponse {
        response: AgentFinalResponse {
            thought: None,
            final_answer: format!("Error: Failed to get response from LLM - {}", message),
        },
        complete: true,
    }
}

/// Renders a batch of tool results as the user turn fed back to the model.
fn format_tool_results(results: &[ToolResult]) -> String {
    let mut text = String::from("Tool Results:\n\n");
    for result in results {
        text.push_str(&format!(
            "[{}] (ID: {})\n",
            result.tool_name, result.tool_call_id
        ));
        match &result.error {
            None => text.push_str(&format!("Success: {}\n", result.result)),
            Some(error) => text.push_str(&format!("Error: {}\n", error)),
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TokenStream;
    use crate::tools::{CalculatorTool, FunctionTool};
    use async_trait::async_trait;
    use futures_util::stream;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns scripted responses in order, repeating the last one once the
    /// script is exhausted.
    struct ScriptedLlm {
        responses: Vec<String>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: responses.into_iter().map(String::from).collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn call(&self, _messages: &[Message]) -> Result<String, AgentError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let clamped = index.min(self.responses.len() - 1);
            Ok(self.responses[clamped].clone())
        }
    }

    struct FailingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn call(&self, _messages: &[Message]) -> Result<String, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::LLMError("connection reset".to_string()))
        }
    }

    /// Records the system message of every call and answers immediately.
    struct CapturingLlm {
        system_prompts: Mutex<Vec<String>>,
    }

    impl CapturingLlm {
        fn new() -> Self {
            Self {
                system_prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for CapturingLlm {
        async fn call(&self, messages: &[Message]) -> Result<String, AgentError> {
            self.system_prompts
                .lock()
                .unwrap()
                .push(messages[0].content.clone());
            Ok(r#"{"final_answer": "ok"}"#.to_string())
        }
    }

    /// Streams a fixed response in small chunks.
    struct StreamingLlm {
        text: String,
    }

    #[async_trait]
    impl LlmClient for StreamingLlm {
        async fn call(&self, _messages: &[Message]) -> Result<String, AgentError> {
            Ok(self.text.clone())
        }

        async fn call_stream(&self, _messages: &[Message]) -> Result<TokenStream, AgentError> {
            let chunks: Vec<Result<String, AgentError>> = self
                .text
                .as_bytes()
                .chunks(7)
                .map(|chunk| Ok(String::from_utf8_lossy(chunk).into_owned()))
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    fn instant_config() -> AgentConfig {
        let _ = env_logger::builder().is_test(true).try_init();
        AgentConfig {
            retry: RetryConfig::new(2, 0.0, 0.0, 0.0),
            ..AgentConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_returns_final_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"thought": "done", "final_answer": "The answer is 42"}"#,
        ]));
        let mut agent = Agent::with_config(llm.clone(), instant_config());

        let answer = agent.run("What is the answer?").await.unwrap();
        assert_eq!(answer, "The answer is 42");
        assert_eq!(llm.call_count(), 1);
        // user turn + assistant turn
        assert_eq!(agent.history().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_call_then_final_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"thought": "add them", "tool_calls": [{"id": "a9b3f5ce-6c8e-4f74-9d2b-0b5e3a3c9f4d", "tool_name": "calculator", "parameters": {"operation": "add", "a": 5, "b": 3}}]}"#,
            r#"{"final_answer": "5 + 3 = 8"}"#,
        ]));
        let mut agent = Agent::with_config(llm.clone(), instant_config());
        agent.register_tool(Arc::new(CalculatorTool::new()));

        let answer = agent.run("What is 5 + 3?").await.unwrap();
        assert_eq!(answer, "5 + 3 = 8");
        assert_eq!(llm.call_count(), 2);

        // The tool result went back to the model as a user turn.
        let feedback = agent
            .history()
            .iter()
            .find(|m| m.role == Role::User && m.content.starts_with("Tool Results:"))
            .unwrap();
        assert!(feedback.content.contains("[calculator]"));
        assert!(feedback.content.contains("Success: 8"));
    }

    #[tokio::test]
    async fn test_iteration_budget_is_enforced() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"tool_calls": [{"tool_name": "calculator", "parameters": {"operation": "add", "a": 1, "b": 1}}]}"#,
        ]));
        let mut agent = Agent::with_config(
            llm.clone(),
            AgentConfig {
                max_iterations: 3,
                ..instant_config()
            },
        );
        agent.register_tool(Arc::new(CalculatorTool::new()));

        let result = agent.run("loop forever").await;
        assert!(matches!(
            result,
            Err(AgentError::MaxIterations { max_iterations: 3 })
        ));
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_abort_the_batch() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"tool_calls": [
                {"id": "1", "tool_name": "calculator", "parameters": {"operation": "add", "a": 2, "b": 2}},
                {"id": "2", "tool_name": "missing_tool", "parameters": {}}
            ]}"#,
            r#"{"final_answer": "done"}"#,
        ]));
        let mut agent = Agent::with_config(llm, instant_config());
        agent.register_tool(Arc::new(CalculatorTool::new()));

        let mut events = Box::pin(agent.run_stream("go"));
        let mut tool_results = None;
        while let Some(event) = events.next().await {
            if let AgentEvent::ToolResults { results } = event.unwrap() {
                tool_results = Some(results);
            }
        }
        drop(events);

        let results = tool_results.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].success());
        assert_eq!(results[0].result, "4");
        assert!(!results[1].success());
        assert!(results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("Tool 'missing_tool' not found"));
    }

    #[tokio::test]
    async fn test_error_prefixed_output_counts_as_failure() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"tool_calls": [{"id": "1", "tool_name": "flaky", "parameters": {}}]}"#,
            r#"{"final_answer": "done"}"#,
        ]));
        let mut agent = Agent::with_config(llm, instant_config());
        agent.register_tool(Arc::new(
            FunctionTool::new(
                "flaky",
                "Reports failure in its output text",
                json!({"type": "object", "properties": {}}),
                |_| Ok("Error: upstream unavailable".to_string()),
            )
            .unwrap(),
        ));

        let mut events = Box::pin(agent.run_stream("go"));
        let mut tool_results = None;
        while let Some(event) = events.next().await {
            if let AgentEvent::ToolResults { results } = event.unwrap() {
                tool_results = Some(results);
            }
        }
        drop(events);

        let results = tool_results.unwrap();
        assert!(!results[0].success());
        assert_eq!(results[0].result, "");
        assert_eq!(
            results[0].error.as_deref(),
            Some("Error: upstream unavailable")
        );
    }

    #[tokio::test]
    async fn test_hidden_toolset_params_merge_under_model_params() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"tool_calls": [{"id": "1", "tool_name": "echo_params", "parameters": {"query": "rust", "region": "eu"}}]}"#,
            r#"{"final_answer": "done"}"#,
        ]));
        let mut agent = Agent::with_config(llm, instant_config());
        agent.register_toolset(ToolSet {
            name: "search".to_string(),
            description: "Search backend".to_string(),
            tools: vec![Arc::new(
                FunctionTool::new(
                    "echo_params",
                    "Echoes its parameters",
                    json!({"type": "object", "properties": {}}),
                    |params| Ok(serde_json::to_string(&params).unwrap()),
                )
                .unwrap(),
            )],
            toolset_params: json!({"api_key": "k-123", "region": "us"})
                .as_object()
                .cloned()
                .unwrap(),
        });

        let mut events = Box::pin(agent.run_stream("go"));
        let mut tool_results = None;
        while let Some(event) = events.next().await {
            if let AgentEvent::ToolResults { results } = event.unwrap() {
                tool_results = Some(results);
            }
        }
        drop(events);

        let echoed: serde_json::Value =
            serde_json::from_str(&tool_results.unwrap()[0].result).unwrap();
        assert_eq!(echoed["api_key"], "k-123");
        assert_eq!(echoed["query"], "rust");
        // Model-supplied value wins the collision.
        assert_eq!(echoed["region"], "eu");
    }

    #[tokio::test]
    async fn test_llm_failure_degrades_to_error_answer() {
        let llm = Arc::new(FailingLlm {
            calls: AtomicUsize::new(0),
        });
        let mut agent = Agent::with_config(llm.clone(), instant_config());

        let answer = agent.run("hello").await.unwrap();
        // The underlying cause surfaces, not the transport wrapper text.
        assert_eq!(
            answer,
            "Error: Failed to get response from LLM - connection reset"
        );
        // instant_config allows 2 attempts
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_streaming_run_emits_token_events() {
        let llm = Arc::new(StreamingLlm {
            text: r#"{"thought": "streamed", "final_answer": "Streaming works"}"#.to_string(),
        });
        let mut agent = Agent::with_config(
            llm,
            AgentConfig {
                stream: true,
                ..instant_config()
            },
        );

        let mut events = Vec::new();
        {
            let mut stream = Box::pin(agent.run_stream("stream it"));
            while let Some(event) = stream.next().await {
                events.push(event.unwrap());
            }
        }

        assert!(matches!(events.first(), Some(AgentEvent::StreamStart)));
        let token_text: String = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::Token { content } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert!(token_text.contains("Streaming works"));
        assert!(events.iter().any(|e| matches!(e, AgentEvent::StreamEnd)));
        assert!(matches!(
            events.last(),
            Some(AgentEvent::FinalResponse { response, complete: true })
                if response.final_answer == "Streaming works"
        ));
    }

    #[tokio::test]
    async fn test_streaming_without_support_surfaces_config_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![r#"{"final_answer": "x"}"#]));
        let mut agent = Agent::with_config(
            llm,
            AgentConfig {
                stream: true,
                ..instant_config()
            },
        );

        let result = agent.run("go").await;
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[tokio::test]
    async fn test_plain_text_response_is_the_final_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec!["Just plain prose, no JSON."]));
        let mut agent = Agent::with_config(llm, instant_config());

        let answer = agent.run("say something").await.unwrap();
        assert_eq!(answer, "Just plain prose, no JSON.");
    }

    #[tokio::test]
    async fn test_format_instructions_default_and_override() {
        let llm = Arc::new(CapturingLlm::new());
        let mut agent = Agent::with_config(llm.clone(), instant_config());

        agent.run("first").await.unwrap();
        agent.set_format_instructions("Reply only in rhyming couplets.");
        agent.reset();
        agent.run("second").await.unwrap();

        let prompts = llm.system_prompts.lock().unwrap();
        assert!(prompts[0].contains("RESPONSE FORMAT INSTRUCTIONS"));
        assert!(prompts[0].contains("CRITICAL RULES"));
        assert!(prompts[1].contains("Reply only in rhyming couplets."));
        assert!(!prompts[1].contains("CRITICAL RULES"));
    }

    #[tokio::test]
    async fn test_timezone_offset_is_rendered_in_prompt() {
        let llm = Arc::new(CapturingLlm::new());
        let mut agent = Agent::with_config(llm.clone(), instant_config());

        agent.run("first").await.unwrap();
        agent.set_timezone(FixedOffset::east_opt(5 * 3600 + 1800).unwrap());
        agent.reset();
        agent.run("second").await.unwrap();

        let prompts = llm.system_prompts.lock().unwrap();
        assert!(prompts[0].contains("Current Date and Time:"));
        assert!(prompts[0].contains(" UTC"));
        assert!(!prompts[0].contains("+05:30"));
        assert!(prompts[1].contains("UTC+05:30"));
    }

    #[tokio::test]
    async fn test_reset_clears_history_but_keeps_tools() {
        let llm = Arc::new(ScriptedLlm::new(vec![r#"{"final_answer": "ok"}"#]));
        let mut agent = Agent::with_config(llm, instant_config());
        agent.register_tool(Arc::new(CalculatorTool::new()));

        agent.run("hi").await.unwrap();
        assert!(!agent.history().is_empty());

        agent.reset();
        assert!(agent.history().is_empty());
        assert_eq!(agent.list_tools(), vec!["calculator"]);
    }
}
