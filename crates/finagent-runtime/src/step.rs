//! Session history and outcome

use finagent_core::{Error, ErrorKind};
use finagent_tools::{ToolCall, ToolResult};
use serde::Serialize;

/// Pseudo tool name recorded when the reasoning call itself fails
pub const REASONING_STEP: &str = "reasoning";

/// Pseudo tool name recorded when a proposal cannot be parsed
pub const INVALID_ACTION_STEP: &str = "invalid_action";

/// States of the think-act-observe loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    Thinking,
    Acting,
    Observing,
    Done,
    Failed,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Phase name as it appears in logs and serialized outcomes
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thinking => "THINKING",
            Self::Acting => "ACTING",
            Self::Observing => "OBSERVING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

/// One observed iteration: the reasoning text, the call and its result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub iteration: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub call: ToolCall,
    pub result: ToolResult,
}

impl Step {
    /// Whether this step ran a registered tool (as opposed to recording a
    /// reasoning or parse failure)
    pub fn is_tool_step(&self) -> bool {
        self.call.name != REASONING_STEP && self.call.name != INVALID_ACTION_STEP
    }

    /// Identifier or output path produced by a successful step
    pub fn artifact(&self) -> Option<&str> {
        if !self.result.is_success() {
            return None;
        }
        self.result
            .payload_str("path")
            .or_else(|| self.result.payload_str("identifier"))
    }
}

/// Why a session ended in `FAILED`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result of one orchestration session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub session_id: String,
    /// `DONE` or `FAILED`
    pub state: LoopState,
    /// Final answer, or the partial answer of a failed session
    pub answer: String,
    /// False when the answer is a best-effort partial one
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Number of reasoning calls made
    pub iterations: usize,
    pub steps: Vec<Step>,
}

impl SessionOutcome {
    pub(crate) fn done(session_id: &str, answer: String, iterations: usize, steps: Vec<Step>) -> Self {
        Self {
            session_id: session_id.to_string(),
            state: LoopState::Done,
            answer,
            complete: true,
            failure: None,
            iterations,
            steps,
        }
    }

    pub(crate) fn failed(session_id: &str, error: &Error, iterations: usize, steps: Vec<Step>) -> Self {
        Self {
            session_id: session_id.to_string(),
            state: LoopState::Failed,
            answer: partial_answer(error, &steps),
            complete: false,
            failure: Some(Failure::from(error)),
            iterations,
            steps,
        }
    }

    /// Artifacts produced by successful tool steps, in call order
    pub fn artifacts(&self) -> Vec<(&str, &str)> {
        self.steps
            .iter()
            .filter_map(|s| s.artifact().map(|a| (s.call.name.as_str(), a)))
            .collect()
    }

    /// Names of the tools invoked, in order
    pub fn tool_sequence(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.is_tool_step())
            .map(|s| s.call.name.as_str())
            .collect()
    }
}

fn partial_answer(error: &Error, steps: &[Step]) -> String {
    let mut answer = format!("INCOMPLETE: {error}.");
    let produced: Vec<String> = steps
        .iter()
        .filter_map(|s| s.artifact().map(|a| format!("- {}: {a}", s.call.name)))
        .collect();

    if produced.is_empty() {
        answer.push_str(" No artifacts were produced.");
    } else {
        answer.push_str(" Artifacts produced so far:\n");
        answer.push_str(&produced.join("\n"));
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(name: &str, result: ToolResult) -> Step {
        Step {
            iteration: 1,
            thought: None,
            call: ToolCall::new(name, json!({})),
            result,
        }
    }

    #[test]
    fn test_partial_answer_lists_artifacts() {
        let steps = vec![
            step(
                "fetch_price_data",
                ToolResult::success(json!({"identifier": "600519:20240101:20240301"})),
            ),
            step(REASONING_STEP, ToolResult::from_error(&Error::Reasoning("boom".to_string()))),
            step("render_chart", ToolResult::success(json!({"path": "outputs/basic.json"}))),
        ];
        let outcome = SessionOutcome::failed("s", &Error::LoopExhausted(3), 3, steps);

        assert_eq!(outcome.state, LoopState::Failed);
        assert!(!outcome.complete);
        assert!(outcome.answer.starts_with("INCOMPLETE"));
        assert!(outcome.answer.contains("- fetch_price_data: 600519:20240101:20240301"));
        assert!(outcome.answer.contains("- render_chart: outputs/basic.json"));
        assert_eq!(outcome.tool_sequence(), vec!["fetch_price_data", "render_chart"]);
        assert_eq!(outcome.failure.unwrap().kind, ErrorKind::LoopExhausted);
    }

    #[test]
    fn test_partial_answer_without_artifacts() {
        let outcome = SessionOutcome::failed("s", &Error::Cancelled, 0, Vec::new());
        assert!(outcome.answer.contains("No artifacts were produced"));
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(serde_json::to_value(LoopState::Failed).unwrap(), json!("FAILED"));
        assert!(LoopState::Done.is_terminal());
        assert!(!LoopState::Observing.is_terminal());

        for state in [
            LoopState::Thinking,
            LoopState::Acting,
            LoopState::Observing,
            LoopState::Done,
            LoopState::Failed,
        ] {
            assert_eq!(serde_json::to_value(state).unwrap(), json!(state.as_str()));
        }
    }
}
