//! Language-model access for the finagent reasoning step
//!
//! [`LLMProvider`] completes a [`CompletionRequest`] (system prompt plus
//! alternating user/assistant turns) into a [`CompletionResponse`]. The
//! Anthropic Messages API client lives in [`providers`] behind the
//! `anthropic` feature.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

#[cfg(feature = "anthropic")]
pub mod providers;

pub use completion::{CompletionRequest, CompletionRequestBuilder, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
