//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Provider is temporarily overloaded
    #[error("Provider overloaded: {0}")]
    Overloaded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "anthropic")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::RateLimitExceeded(_) | Self::Overloaded(_) => true,
            #[cfg(feature = "anthropic")]
            Self::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

impl From<LLMError> for finagent_core::Error {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::ConfigurationError(msg) => Self::Config(msg),
            other if other.is_transient() => Self::Network(other.to_string()),
            other => Self::Reasoning(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finagent_core::ErrorKind;

    #[test]
    fn test_core_mapping() {
        let err: finagent_core::Error = LLMError::RateLimitExceeded("slow down".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.is_retryable());

        let err: finagent_core::Error = LLMError::AuthenticationFailed.into();
        assert_eq!(err.kind(), ErrorKind::Reasoning);
        assert!(!err.is_retryable());

        let err: finagent_core::Error = LLMError::ConfigurationError("no key".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
