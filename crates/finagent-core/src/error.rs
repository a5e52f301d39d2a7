//! Error taxonomy shared by every finagent crate
//!
//! Every failure below the orchestration loop is expressed as one of these
//! variants. The tool registry turns them into structured error observations
//! (see [`ErrorKind`]), so none of them ever terminates a session on its own.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for finagent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for finagent operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed tool arguments or data violating a series invariant
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Identifier or symbol unknown to the store or the data source
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identifier that existed in the store but has since been evicted
    #[error("Stale reference: artifact '{0}' was evicted from the store")]
    StaleReference(String),

    /// Transient upstream failure (transport, malformed upstream payload)
    #[error("Network error: {0}")]
    Network(String),

    /// A bounded wait elapsed
    #[error("{operation} timed out after {}ms", after.as_millis())]
    Timeout {
        /// Operation that was being awaited
        operation: String,
        /// Configured bound
        after: Duration,
    },

    /// A chart variant needs indicator columns the artifact does not carry
    #[error("Chart variant '{variant}' requires missing indicator columns: {}", missing.join(", "))]
    MissingIndicator {
        /// Requested chart variant
        variant: String,
        /// Column names that were absent
        missing: Vec<String>,
    },

    /// Chart renderer failure
    #[error("Render failed: {0}")]
    Render(String),

    /// The reasoning collaborator failed to produce a proposal
    #[error("Reasoning failed: {0}")]
    Reasoning(String),

    /// The loop hit its iteration bound without a final answer
    #[error("Loop exhausted after {0} iterations without a final answer")]
    LoopExhausted(usize),

    /// The session was cancelled from outside
    #[error("Session cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Broken internal state (poisoned lock, impossible branch)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable, serializable classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    StaleReference,
    Network,
    Timeout,
    MissingIndicator,
    Render,
    Reasoning,
    LoopExhausted,
    Cancelled,
    Config,
    Internal,
}

impl ErrorKind {
    /// Snake-case name, identical to the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::StaleReference => "stale_reference",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::MissingIndicator => "missing_indicator",
            Self::Render => "render",
            Self::Reasoning => "reasoning",
            Self::LoopExhausted => "loop_exhausted",
            Self::Cancelled => "cancelled",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::StaleReference(_) => ErrorKind::StaleReference,
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::MissingIndicator { .. } => ErrorKind::MissingIndicator,
            Self::Render(_) => ErrorKind::Render,
            Self::Reasoning(_) => ErrorKind::Reasoning,
            Self::LoopExhausted(_) => ErrorKind::LoopExhausted,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a retry with backoff may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }

    /// Recovery suggestion surfaced to the reasoning step next to the message
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Validation(_) => Some("Fix the arguments so they match the tool's input schema."),
            Self::NotFound(_) => Some(
                "Check the identifier or symbol; identifiers come from fetch_price_data results.",
            ),
            Self::StaleReference(_) => Some(
                "The data was evicted; call fetch_price_data again for the same symbol and range.",
            ),
            Self::Network(_) | Self::Timeout { .. } => {
                Some("The data source is unavailable; try again later or with a shorter range.")
            }
            Self::MissingIndicator { .. } => {
                Some("Call compute_indicators on the identifier first, then render the enriched identifier.")
            }
            _ => None,
        }
    }

    /// Shorthand for a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(err.to_string())
    }
}
