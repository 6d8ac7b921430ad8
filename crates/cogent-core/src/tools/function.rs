//! Wraps a plain closure as a [`Tool`], validating its schema at
//! construction so malformed tools are rejected before they can be
//! registered.

use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde_json::{Map, Value};

use crate::errors::AgentError;
use crate::tools::{Tool, ToolMetadata};

type ToolFn = dyn Fn(Map<String, Value>) -> Result<String, AgentError> + Send + Sync;

pub struct FunctionTool {
    name: String,
    description: String,
    input_schema: Value,
    func: Arc<ToolFn>,
}

impl FunctionTool {
    /// Builds a tool from a closure and a JSON Schema describing its
    /// parameters. The schema must be a valid draft schema with
    /// `"type": "object"` at the top level.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        func: F,
    ) -> Result<Self, AgentError>
    where
        F: Fn(Map<String, Value>) -> Result<String, AgentError> + Send + Sync + 'static,
    {
        let name = name.into();
        Self::validate_schema(&name, &input_schema)?;
        Ok(Self {
            name,
            description: description.into(),
            input_schema,
            func: Arc::new(func),
        })
    }

    fn validate_schema(name: &str, schema: &Value) -> Result<(), AgentError> {
        match schema.get("type").and_then(Value::as_str) {
            Some("object") => {}
            _ => {
                return Err(AgentError::InvalidToolSchema {
                    tool_name: name.to_string(),
                    reason: "top-level \"type\" must be \"object\"".to_string(),
                })
            }
        }
        JSONSchema::compile(schema).map_err(|e| AgentError::InvalidToolSchema {
            tool_name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    async fn execute(&self, parameters: Map<String, Value>) -> Result<String, AgentError> {
        (self.func)(parameters)
    }
}
