//! Built-in arithmetic tool.
//!
//! Gives agents a dependable numeric primitive for quantitative tasks
//! without evaluating arbitrary expressions: operations are a closed enum,
//! so there is nothing to inject through.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::errors::AgentError;
use crate::tools::{Tool, ToolMetadata};

pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }

    fn err(message: impl Into<String>) -> AgentError {
        AgentError::ToolError {
            tool_name: "calculator".to_string(),
            message: message.into(),
        }
    }

    fn number(parameters: &Map<String, Value>, key: &str, context: &str) -> Result<f64, AgentError> {
        parameters
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| Self::err(format!("Missing or invalid parameter '{}' for {}", key, context)))
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "calculator".to_string(),
            description: "Performs basic arithmetic operations including addition, subtraction, multiplication, division, exponentiation, and square root".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": ["add", "subtract", "multiply", "divide", "power", "sqrt"],
                        "description": "The arithmetic operation to perform"
                    },
                    "a": {
                        "type": "number",
                        "description": "The first number"
                    },
                    "b": {
                        "type": "number",
                        "description": "The second number (not required for sqrt)"
                    }
                },
                "required": ["operation", "a"]
            }),
        }
    }

    async fn execute(&self, parameters: Map<String, Value>) -> Result<String, AgentError> {
        let operation = parameters
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| Self::err("Missing or invalid 'operation' parameter"))?;
        let a = Self::number(&parameters, "a", operation)?;

        let result = match operation {
            "add" => a + Self::number(&parameters, "b", "addition")?,
            "subtract" => a - Self::number(&parameters, "b", "subtraction")?,
            "multiply" => a * Self::number(&parameters, "b", "multiplication")?,
            "divide" => {
                let b = Self::number(&parameters, "b", "division")?;
                if b == 0.0 {
                    return Err(Self::err("Division by zero is not allowed"));
                }
                a / b
            }
            "power" => a.powf(Self::number(&parameters, "b", "exponentiation")?),
            "sqrt" => {
                if a < 0.0 {
                    return Err(Self::err("Cannot calculate square root of negative number"));
                }
                a.sqrt()
            }
            other => return Err(Self::err(format!("Unknown operation: {}", other))),
        };

        // Integers render without a trailing ".0".
        let formatted = if result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
            format!("{}", result as i64)
        } else {
            format!("{:.6}", result)
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        };

        log::debug!("calculator: {} on a={} -> {}", operation, a, formatted);
        Ok(formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_addition() {
        let calc = CalculatorTool::new();
        let result = calc
            .execute(params(json!({"operation": "add", "a": 5, "b": 3})))
            .await
            .unwrap();
        assert_eq!(result, "8");
    }

    #[tokio::test]
    async fn test_division_formats_integer_results() {
        let calc = CalculatorTool::new();
        let result = calc
            .execute(params(json!({"operation": "divide", "a": 10, "b": 2})))
            .await
            .unwrap();
        assert_eq!(result, "5");
    }

    #[tokio::test]
    async fn test_fractional_result_trims_zeros() {
        let calc = CalculatorTool::new();
        let result = calc
            .execute(params(json!({"operation": "divide", "a": 1, "b": 4})))
            .await
            .unwrap();
        assert_eq!(result, "0.25");
    }

    #[tokio::test]
    async fn test_division_by_zero_is_a_tool_error() {
        let calc = CalculatorTool::new();
        let result = calc
            .execute(params(json!({"operation": "divide", "a": 10, "b": 0})))
            .await;
        assert!(matches!(
            result,
            Err(AgentError::ToolError { tool_name, .. }) if tool_name == "calculator"
        ));
    }

    #[tokio::test]
    async fn test_sqrt_and_negative_sqrt() {
        let calc = CalculatorTool::new();
        let result = calc
            .execute(params(json!({"operation": "sqrt", "a": 16})))
            .await
            .unwrap();
        assert_eq!(result, "4");

        let negative = calc
            .execute(params(json!({"operation": "sqrt", "a": -1})))
            .await;
        assert!(negative.is_err());
    }

    #[tokio::test]
    async fn test_missing_operand_is_reported() {
        let calc = CalculatorTool::new();
        let result = calc
            .execute(params(json!({"operation": "add", "a": 5})))
            .await;
        assert!(matches!(result, Err(AgentError::ToolError { .. })));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let calc = CalculatorTool::new();
        let result = calc
            .execute(params(json!({"operation": "modulo", "a": 5, "b": 2})))
            .await;
        assert!(result.is_err());
    }
}
