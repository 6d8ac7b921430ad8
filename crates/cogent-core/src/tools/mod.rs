//! Tool system: the `Tool` trait, toolsets, and the registry.
//!
//! Tools are registered by name and invoked when the model's response names
//! them. A toolset groups tools that share hidden invocation parameters
//! (credentials, endpoints) which are merged into each call at dispatch
//! time without ever appearing in the tool schemas or in the prompt text.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::AgentError;

pub mod calculator;
pub mod function;

pub use calculator::CalculatorTool;
pub use function::FunctionTool;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> ToolMetadata;

    /// Executes the tool and returns its textual output.
    ///
    /// By inherited convention, output beginning with the literal prefix
    /// `Error` is reinterpreted by dispatch as a failure even though the
    /// call returned `Ok`. New tool types should prefer returning
    /// `Err(AgentError::ToolError { .. })` instead of relying on it.
    async fn execute(&self, parameters: Map<String, Value>) -> Result<String, AgentError>;
}

/// A named group of tools sharing hidden invocation parameters.
#[derive(Clone)]
pub struct ToolSet {
    pub name: String,
    pub description: String,
    pub tools: Vec<Arc<dyn Tool>>,
    /// Merged under user-supplied parameters at dispatch; user values win.
    /// Never exposed in schemas or prompt text.
    pub toolset_params: Map<String, Value>,
}

/// Name-keyed catalog of tools and toolsets. Ordered maps keep the prompt
/// listing deterministic.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    toolsets: BTreeMap<String, ToolSet>,
    tool_to_toolset: BTreeMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tool, overwriting any existing registration with the same
    /// name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name;
        if self.tools.contains_key(&name) {
            log::warn!("Tool '{}' already registered, overwriting", name);
        }
        self.tools.insert(name.clone(), tool);
        log::info!("Registered tool: {}", name);
    }

    pub fn unregister(&mut self, tool_name: &str) -> Result<(), AgentError> {
        if self.tools.remove(tool_name).is_none() {
            return Err(AgentError::ToolNotFound {
                tool_name: tool_name.to_string(),
            });
        }
        log::info!("Unregistered tool: {}", tool_name);
        Ok(())
    }

    pub fn get(&self, tool_name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(tool_name).cloned()
    }

    pub fn has_tool(&self, tool_name: &str) -> bool {
        self.tools.contains_key(tool_name)
    }

    pub fn list_tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.toolsets.is_empty()
    }

    /// Registers a toolset and every tool it contains, recording the
    /// tool-to-toolset association used for hidden parameter lookup.
    pub fn register_toolset(&mut self, toolset: ToolSet) {
        if self.toolsets.contains_key(&toolset.name) {
            log::warn!("ToolSet '{}' already registered, overwriting", toolset.name);
        }
        for tool in &toolset.tools {
            let tool_name = tool.metadata().name;
            self.register(tool.clone());
            self.tool_to_toolset
                .insert(tool_name, toolset.name.clone());
        }
        log::info!(
            "Registered toolset: {} with {} tools",
            toolset.name,
            toolset.tools.len()
        );
        self.toolsets.insert(toolset.name.clone(), toolset);
    }

    /// Removes a toolset, all its tools, and their associations.
    pub fn unregister_toolset(&mut self, toolset_name: &str) -> Result<(), AgentError> {
        let toolset = self
            .toolsets
            .remove(toolset_name)
            .ok_or_else(|| AgentError::ToolSetNotFound {
                name: toolset_name.to_string(),
            })?;
        for tool in &toolset.tools {
            let tool_name = tool.metadata().name;
            self.tools.remove(&tool_name);
            self.tool_to_toolset.remove(&tool_name);
        }
        log::info!("Unregistered toolset: {}", toolset_name);
        Ok(())
    }

    pub fn list_toolsets(&self) -> Vec<String> {
        self.toolsets.keys().cloned().collect()
    }

    /// Hidden parameters for a tool, if it belongs to a toolset.
    pub fn toolset_params(&self, tool_name: &str) -> Option<&Map<String, Value>> {
        let toolset_name = self.tool_to_toolset.get(tool_name)?;
        self.toolsets
            .get(toolset_name)
            .map(|toolset| &toolset.toolset_params)
    }

    pub fn clear(&mut self) {
        self.tools.clear();
        self.toolsets.clear();
        self.tool_to_toolset.clear();
        log::info!("Cleared all tools from registry");
    }

    /// Deterministic, human-readable listing of every toolset and tool for
    /// injection into the system prompt. Hidden toolset parameters never
    /// appear here.
    pub fn format_for_prompt(&self) -> String {
        if self.is_empty() {
            return "No tools available.".to_string();
        }

        let mut text = String::new();

        if !self.toolsets.is_empty() {
            text.push_str("AVAILABLE TOOLSETS:\n\n");
            for toolset in self.toolsets.values() {
                text.push_str(&format!("ToolSet: {}\n", toolset.name));
                text.push_str(&format!("Description: {}\n", toolset.description));
                let member_names: Vec<String> = toolset
                    .tools
                    .iter()
                    .map(|tool| tool.metadata().name)
                    .collect();
                text.push_str(&format!(
                    "Tools in this set: {}\n\n",
                    member_names.join(", ")
                ));
            }
        }

        text.push_str("AVAILABLE TOOLS:\n\n");

        for toolset in self.toolsets.values() {
            text.push_str(&format!("--- Tools from {} ---\n", toolset.name));
            for tool in &toolset.tools {
                Self::format_tool(&mut text, tool.as_ref());
            }
        }

        let standalone: Vec<&Arc<dyn Tool>> = self
            .tools
            .iter()
            .filter(|(name, _)| !self.tool_to_toolset.contains_key(*name))
            .map(|(_, tool)| tool)
            .collect();
        if !standalone.is_empty() {
            if !self.toolsets.is_empty() {
                text.push_str("--- Standalone Tools ---\n");
            }
            for tool in standalone {
                Self::format_tool(&mut text, tool.as_ref());
            }
        }

        text
    }

    fn format_tool(text: &mut String, tool: &dyn Tool) {
        let metadata = tool.metadata();
        text.push_str(&format!("Tool: {}\n", metadata.name));
        text.push_str(&format!("Description: {}\n", metadata.description));
        if !metadata.input_schema.is_null() {
            let pretty = serde_json::to_string_pretty(&metadata.input_schema)
                .unwrap_or_else(|_| metadata.input_schema.to_string());
            text.push_str(&format!("Schema: {}\n", pretty));
        }
        text.push('\n');
    }
}
