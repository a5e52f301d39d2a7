//! The reasoning collaborator consulted at every THINKING step

use crate::step::Step;
use async_trait::async_trait;
use finagent_core::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// What the reasoning step wants to happen next
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Proposal {
    /// Run exactly one tool
    Action {
        thought: Option<String>,
        name: String,
        arguments: Map<String, Value>,
    },
    /// Stop with an answer
    Final { text: String },
    /// The reply looked like an action but could not be read as one
    Malformed { raw: String, reason: String },
}

impl Proposal {
    pub fn action(name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::Action {
            thought: None,
            name: name.into(),
            arguments,
        }
    }

    pub fn final_answer(text: impl Into<String>) -> Self {
        Self::Final { text: text.into() }
    }
}

/// Maps the user request and the history so far to the next proposal
///
/// This is the only non-deterministic part of a session. Transient failures
/// (`Network`, `Timeout`) are retried by the loop.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn propose_next(&self, request: &str, history: &[Step]) -> Result<Proposal>;
}
