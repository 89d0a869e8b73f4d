use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use threadchat_core::tools::{Tool, ToolError, ToolResult};

#[derive(Debug, Deserialize)]
pub struct CalculatorArgs {
    pub first_num: f64,
    pub second_num: f64,
    pub operation: String,
}

/// Basic arithmetic on two numbers. Arithmetic failures are reported in the
/// result payload, never as an error.
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(first_num: f64, second_num: f64, operation: &str) -> ToolResult {
        let result = match operation {
            "add" => first_num + second_num,
            "sub" => first_num - second_num,
            "mul" => first_num * second_num,
            "div" => {
                if second_num == 0.0 {
                    return ToolResult::error("Division by zero is not allowed");
                }
                first_num / second_num
            }
            other => return ToolResult::error(format!("Unsupported operation '{other}'")),
        };

        ToolResult::ok(json!({
            "first_num": first_num,
            "second_num": second_num,
            "operation": operation,
            "result": result,
        }))
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform a basic arithmetic operation on two numbers. Supported operations: add, sub, mul, div"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "first_num": { "type": "number" },
                "second_num": { "type": "number" },
                "operation": {
                    "type": "string",
                    "enum": ["add", "sub", "mul", "div"]
                }
            },
            "required": ["first_num", "second_num", "operation"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: CalculatorArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        Ok(Self::calculate(args.first_num, args.second_num, &args.operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add() {
        let tool = CalculatorTool::new();
        let result = tool
            .execute(json!({"first_num": 2, "second_num": 3, "operation": "add"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.result["result"], 5.0);
        assert_eq!(result.result["operation"], "add");
        assert_eq!(result.result["first_num"], 2.0);
        assert_eq!(result.result["second_num"], 3.0);
    }

    #[test]
    fn test_sub_mul_div() {
        assert_eq!(CalculatorTool::calculate(7.0, 2.0, "sub").result["result"], 5.0);
        assert_eq!(CalculatorTool::calculate(7.0, 2.0, "mul").result["result"], 14.0);
        assert_eq!(CalculatorTool::calculate(7.0, 2.0, "div").result["result"], 3.5);
    }

    #[test]
    fn test_division_by_zero() {
        let result = CalculatorTool::calculate(1.0, 0.0, "div");
        assert!(!result.success);
        assert_eq!(
            result.result,
            json!({"error": "Division by zero is not allowed"})
        );
    }

    #[test]
    fn test_unsupported_operation() {
        let result = CalculatorTool::calculate(1.0, 2.0, "pow");
        assert_eq!(result.result, json!({"error": "Unsupported operation 'pow'"}));
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid() {
        let tool = CalculatorTool::new();
        let err = tool
            .execute(json!({"first_num": 1, "operation": "add"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
