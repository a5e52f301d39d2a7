//! Tool framework for finagent
//!
//! A [`Tool`] bundles a name, an input schema, an executor and an output
//! schema. The [`ToolRegistry`] is the closed dispatch table the
//! orchestration loop goes through: it validates every [`ToolCall`] and turns
//! every outcome, including executor panics, into a [`ToolResult`].

pub mod call;
pub mod registry;
pub mod schema;
pub mod tool;

pub use call::{ToolCall, ToolResult, ToolStatus, sanitize_message};
pub use registry::{ToolRegistry, ToolSpec};
pub use tool::Tool;
