//! Tool trait definition

use async_trait::async_trait;
use finagent_core::Result;
use serde_json::{Value, json};

/// Trait for operations the orchestration loop can invoke
///
/// A tool bundles the full contract the registry needs: a unique name, a
/// description for the reasoning step, the input schema arguments are
/// validated against, the executor, and the shape of a successful payload.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with already-validated arguments
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as a JSON object matching `input_schema`
    ///
    /// # Returns
    ///
    /// Tool output as a JSON object matching `output_schema`
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description helps the reasoning step decide when to use this tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema subset, see [`crate::schema`])
    fn input_schema(&self) -> Value;

    /// Get the schema of a successful payload
    fn output_schema(&self) -> Value {
        json!({ "type": "object" })
    }
}
