// Tool abstractions for orchestration
//
// A tool pairs the spec advertised to the model with the handler that runs it.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use waypoint_abstraction::{ToolParameters, ToolSpec};

use crate::error::ToolError;

/// Arguments passed to tool handler
#[derive(Debug, Clone)]
pub struct ToolArguments {
    /// Parsed arguments as JSON value
    pub args: Value,
}

impl ToolArguments {
    /// Create new tool arguments
    pub fn new(args: Value) -> Self {
        Self { args }
    }

    /// Get argument as string
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key).map(ToString::to_string)
    }

    /// Get argument as borrowed string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.args.get(key)?.as_str()
    }

    /// Get argument as i64
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.args.get(key)?.as_i64()
    }

    /// Get a required string argument.
    ///
    /// # Errors
    /// Returns `InvalidArguments` if the key is missing, not a string, or blank.
    pub fn require_str(&self, key: &str) -> Result<&str, ToolError> {
        match self.args.get(key) {
            None | Some(Value::Null) => {
                Err(ToolError::InvalidArguments(format!("missing required argument '{key}'")))
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(ToolError::InvalidArguments(format!("argument '{key}' must not be empty")))
            }
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(ToolError::InvalidArguments(format!(
                "argument '{key}' must be a string, got {other}"
            ))),
        }
    }
}

/// Handler for tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with given arguments
    ///
    /// # Returns
    /// Serialized result payload (JSON text)
    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError>;
}

/// Tool definition for orchestration
#[derive(Clone)]
pub struct Tool {
    /// Spec advertised to the model
    pub spec: ToolSpec,
    /// Handler for executing the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Create a new tool
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self { spec: ToolSpec::new(name, description, parameters), handler }
    }

    /// Tool name (used in tool requests)
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Execute this tool with given arguments
    pub async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        self.handler.execute(args).await
    }
}

// Implement Debug manually since Arc<dyn ToolHandler> doesn't implement Debug
impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("spec", &self.spec).field("handler", &"<handler>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
            Ok(args.require_str("text")?.to_string())
        }
    }

    #[test]
    fn test_tool_arguments_getters() {
        let args = ToolArguments::new(json!({"origin": "WAW", "limit": 5}));

        assert_eq!(args.get_string("origin"), Some("WAW".to_string()));
        assert_eq!(args.get_i64("limit"), Some(5));
        assert_eq!(args.get_str("missing"), None);
    }

    #[test]
    fn test_require_str_rejects_bad_values() {
        let args = ToolArguments::new(json!({"blank": "  ", "number": 7, "null": null}));

        assert!(matches!(args.require_str("missing"), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(args.require_str("blank"), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(args.require_str("number"), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(args.require_str("null"), Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_tool_execute_delegates_to_handler() {
        let tool = Tool::new(
            "echo",
            "Echo text back",
            ToolParameters::new().add_property("text", "string", "Text to echo", true),
            Arc::new(EchoHandler),
        );

        assert_eq!(tool.name(), "echo");
        assert!(tool.spec.input_schema.is_required("text"));
        let out = tool.execute(&ToolArguments::new(json!({"text": "hi"}))).await.unwrap();
        assert_eq!(out, "hi");
    }
}
