//! Tool registry: the closed set of operations the loop may invoke

use crate::{Tool, ToolCall, ToolResult, schema};
use finagent_core::{Error, Result};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Published contract of one registered tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

/// Registry for managing tools
///
/// Tools are kept in name order so that catalogs handed to the reasoning
/// step are stable from run to run.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// Fails if a tool with the same name is already registered or if the
    /// tool's input schema is not an object schema.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(Error::Config(format!("tool '{name}' is already registered")));
        }
        if tool.input_schema().get("type").and_then(Value::as_str) != Some("object") {
            return Err(Error::Config(format!(
                "tool '{name}' must declare an object input schema"
            )));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names in order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Contracts of all registered tools, in name order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
                output_schema: tool.output_schema(),
            })
            .collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate and run one call
    ///
    /// Never fails: unknown names, invalid arguments, executor errors and
    /// executor panics all come back as error [`ToolResult`]s.
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "Unknown tool requested");
            return ToolResult::from_error(&Error::Validation(format!(
                "unknown tool '{}'; available tools: {}",
                call.name,
                self.names().join(", ")
            )));
        };

        let arguments = Value::Object(call.arguments.clone());
        if let Err(e) = schema::validate(&arguments, &tool.input_schema()) {
            warn!(tool = %call.name, error = %e, "Rejected tool arguments");
            return ToolResult::from_error(&e);
        }

        let start = Instant::now();
        let outcome = AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(payload)) => match schema::validate(&payload, &tool.output_schema()) {
                Ok(()) => ToolResult::success(payload),
                Err(e) => ToolResult::from_error(&Error::Internal(format!(
                    "tool '{}' produced an invalid payload: {e}",
                    call.name
                ))),
            },
            Ok(Err(e)) => ToolResult::from_error(&e),
            Err(panic) => ToolResult::from_error(&Error::Internal(format!(
                "tool '{}' failed unexpectedly: {}",
                call.name,
                panic_message(panic.as_ref())
            ))),
        };

        if result.is_success() {
            info!(tool = %call.name, duration_ms, "Tool succeeded");
        } else {
            warn!(
                tool = %call.name,
                duration_ms,
                error_kind = ?result.error_kind,
                error = result.error_message.as_deref().unwrap_or_default(),
                "Tool failed"
            );
        }

        result
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{bounded_integer, object, pattern_string};
    use crate::ToolStatus;
    use async_trait::async_trait;
    use finagent_core::ErrorKind;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        async fn execute(&self, params: Value) -> Result<Value> {
            Ok(json!({ "echo": params["symbol"] }))
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the symbol"
        }

        fn input_schema(&self) -> Value {
            object(
                json!({
                    "symbol": pattern_string("^[0-9]{6}$", None),
                    "days": bounded_integer(1, 3650, None),
                }),
                &["symbol"],
            )
        }

        fn output_schema(&self) -> Value {
            object(json!({ "echo": { "type": "string" } }), &["echo"])
        }
    }

    struct FailingTool {
        error: Error,
    }

    #[async_trait]
    impl Tool for FailingTool {
        async fn execute(&self, _params: Value) -> Result<Value> {
            Err(self.error.clone())
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn input_schema(&self) -> Value {
            object(json!({}), &[])
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        async fn execute(&self, _params: Value) -> Result<Value> {
            panic!("boom at src/panicking.rs:1:1\nstack backtrace:")
        }

        fn name(&self) -> &str {
            "panicking"
        }

        fn description(&self) -> &str {
            "Panics"
        }

        fn input_schema(&self) -> Value {
            object(json!({}), &[])
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        registry
            .register(Arc::new(FailingTool {
                error: Error::NotFound("no such artifact".to_string()),
            }))
            .unwrap();
        registry.register(Arc::new(PanickingTool)).unwrap();
        registry
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = registry();
        assert!(matches!(
            registry.register(Arc::new(EchoTool)),
            Err(Error::Config(_))
        ));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["echo", "failing", "panicking"]);
    }

    #[test]
    fn test_specs_are_ordered() {
        let specs = registry().specs();
        assert_eq!(specs[0].name, "echo");
        assert_eq!(specs[0].input_schema["required"][0], "symbol");
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let result = registry()
            .invoke(&ToolCall::new("echo", json!({"symbol": "600519"})))
            .await;
        assert_eq!(result.status, ToolStatus::Success);
        assert_eq!(result.payload["echo"], "600519");
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let result = registry().invoke(&ToolCall::new("plot", json!({}))).await;
        assert!(result.is_error());
        assert_eq!(result.error_kind, Some(ErrorKind::Validation));
        assert!(result.error_message.unwrap().contains("available tools: echo, failing, panicking"));
    }

    #[tokio::test]
    async fn test_invoke_invalid_arguments() {
        let registry = registry();

        let result = registry
            .invoke(&ToolCall::new("echo", json!({"symbol": "ABC"})))
            .await;
        assert_eq!(result.error_kind, Some(ErrorKind::Validation));

        let result = registry
            .invoke(&ToolCall::new("echo", json!({"symbol": "600519", "days": 5000})))
            .await;
        assert_eq!(result.error_kind, Some(ErrorKind::Validation));
        assert!(result.error_message.unwrap().contains("$.days"));
    }

    #[tokio::test]
    async fn test_executor_error_becomes_observation() {
        let result = registry().invoke(&ToolCall::new("failing", json!({}))).await;
        assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
        assert!(result.hint.is_some());
    }

    #[tokio::test]
    async fn test_panic_is_contained_and_sanitized() {
        let result = registry().invoke(&ToolCall::new("panicking", json!({}))).await;
        assert_eq!(result.error_kind, Some(ErrorKind::Internal));
        let message = result.error_message.unwrap();
        assert_eq!(message, "Internal error: tool 'panicking' failed unexpectedly: boom");
    }
}
