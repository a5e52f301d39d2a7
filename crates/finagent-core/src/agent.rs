//! Core Agent trait definition

use crate::{Result, SessionContext};
use async_trait::async_trait;

/// Trait implemented by anything that answers a natural-language request
///
/// The input/output types are plain strings; richer outcomes are exposed by
/// the concrete implementations.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer a request within the given session
    async fn process(&self, input: String, context: &mut SessionContext) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;
}
