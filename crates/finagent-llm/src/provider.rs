//! The seam between the reasoning step and a hosted model

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A service that completes conversations
///
/// Errors are reported as [`LLMError`](crate::LLMError); transient ones
/// (rate limits, overload, transport) are retried by the caller.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short provider name for logs, e.g. `anthropic`
    fn name(&self) -> &str;
}
