//! Core orchestration engine for tool-using AI agents.
//!
//! This crate provides the loop that turns a conversational language model
//! into an agent: structured response parsing with graceful degradation,
//! a tool registry with grouped toolsets and hidden invocation parameters,
//! retry with exponential backoff, and incremental parsing of streamed
//! responses for early UI updates.
//!
//! # Architecture Overview
//!
//! The engine is organized around a few focused subsystems:
//!
//! - **Agent loop**: Iteration-bounded orchestration from user input to final answer
//! - **Response parsing**: Total classification of model output into plan, step, or final response
//! - **Partial JSON recovery**: Best-effort completion of truncated JSON during streaming
//! - **Tool ecosystem**: Registry, toolsets, schema-validated function tools
//! - **LLM integration**: Provider-agnostic client trait with optional token streaming
//! - **Retry policy**: Bounded exponential backoff shared by LLM and tool calls

pub mod agent;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod parser;
pub mod partial_json;
pub mod prompts;
pub mod retry;
pub mod streaming;
pub mod tools;

pub use agent::{Agent, AgentConfig};
pub use core_types::{
    AgentEvent, AgentFinalResponse, AgentPlan, AgentResponse, AgentStep, Message, Role, ToolCall,
    ToolResult,
};
pub use errors::AgentError;
pub use llm::{HttpLlmClient, LlmClient, TokenStream};
pub use parser::ResponseParser;
pub use partial_json::parse_partial;
pub use retry::RetryConfig;
pub use streaming::StreamingTokenParser;
pub use tools::{CalculatorTool, FunctionTool, Tool, ToolMetadata, ToolRegistry, ToolSet};
