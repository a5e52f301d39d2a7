//! Tool invocations and their observations

use finagent_core::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request to run one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Build a call from a name and a JSON object of arguments
    ///
    /// A non-object `arguments` value yields an empty argument map.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Observation produced by one tool invocation
///
/// Errors are data: an error result carries the taxonomy kind and a recovery
/// hint so the next reasoning step can correct course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ToolResult {
    /// Successful result; a non-object payload is wrapped under `"value"`
    pub fn success(payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            status: ToolStatus::Success,
            payload,
            error_message: None,
            error_kind: None,
            hint: None,
        }
    }

    /// Error result classified by the core taxonomy
    pub fn from_error(error: &Error) -> Self {
        Self {
            status: ToolStatus::Error,
            payload: Map::new(),
            error_message: Some(sanitize_message(&error.to_string())),
            error_kind: Some(error.kind()),
            hint: error.hint().map(str::to_string),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }

    /// String field of a successful payload
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

const MAX_MESSAGE_CHARS: usize = 400;

/// Reduce an error message to a single bounded line
///
/// Backtraces, multi-line dumps and panic locations never reach the
/// reasoning step.
pub fn sanitize_message(raw: &str) -> String {
    let first_line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown error");

    let cleaned = first_line
        .split(" at src/")
        .next()
        .unwrap_or(first_line)
        .trim();

    if cleaned.chars().count() > MAX_MESSAGE_CHARS {
        let truncated: String = cleaned.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{truncated}...")
    } else {
        cleaned.to_string()
    }
}
