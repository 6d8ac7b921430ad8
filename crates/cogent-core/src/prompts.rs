//! System prompt construction.
//!
//! The agent's system message is assembled from three parts: caller-supplied
//! custom instructions, the response-format instructions produced here, and
//! the tool registry listing appended by the agent at call time.

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful AI agent with access to tools.";

/// The standard response-format block: the three JSON response shapes the
/// parser understands, with fenced examples and the rules the model must
/// follow.
pub fn default_format_instructions() -> &'static str {
    r#"RESPONSE FORMAT INSTRUCTIONS:

You MUST ALWAYS respond with valid JSON wrapped in a markdown code block. No exceptions.

You can respond with one of three types of responses:

1. AgentPlan - Initial planning response (use when you first receive a task)
2. AgentStep - Intermediate step with tool calls (use when you need to call tools)
3. AgentFinalResponse - Final answer to user (use when you have the complete answer)

RESPONSE FORMAT EXAMPLES:

For initial planning:
```json
{
  "thought": "your reasoning about the task",
  "plan": ["step 1", "step 2", "step 3"]
}
```

For tool execution:
```json
{
  "thought": "reasoning for this step",
  "tool_calls": [
    {
      "id": "a unique UUID for this call",
      "tool_name": "tool_name",
      "parameters": {"param": "value"}
    }
  ]
}
```

For final answer:
```json
{
  "thought": "final reasoning (optional)",
  "final_answer": "your complete answer to the user"
}
```

CRITICAL RULES:
1. ALWAYS wrap your JSON response in markdown code fences with 'json' language tag
2. Your response must be ONLY the JSON code block, nothing else
3. Use AgentPlan when you first receive a complex task (optional)
4. Use AgentStep when you need to call one or more tools
5. Use AgentFinalResponse when you have the complete answer
6. Each tool call must have a unique "id" field
7. Never respond with plain text - ALWAYS use one of the JSON formats above
8. The "final_answer" field MUST be a STRING containing your complete answer to the user
9. DO NOT put structured data (dicts/objects) in final_answer - format it as readable text

Available tools will be listed below."#
}

/// Builds the system prompt from custom instructions (or a default line)
/// and the format instructions.
pub fn build_system_prompt(custom_instructions: Option<&str>, format_instructions: &str) -> String {
    let instructions = custom_instructions.unwrap_or(DEFAULT_INSTRUCTIONS);
    format!(
        "{}\n\n{}\n\n{}",
        instructions,
        "=".repeat(60),
        format_instructions
    )
}
