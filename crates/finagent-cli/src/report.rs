//! Terminal output: live progress and the final session report

use async_trait::async_trait;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use finagent_runtime::{ExecutorEventHandler, SessionOutcome, Step};
use finagent_tools::ToolCall;

const DETAIL_CHARS: usize = 80;

/// Prints one line per tool step to stderr
pub struct ProgressPrinter;

#[async_trait]
impl ExecutorEventHandler for ProgressPrinter {
    async fn on_tool_start(&self, iteration: usize, call: &ToolCall) {
        eprintln!("[{iteration}] {} ...", call.name);
    }

    async fn on_observation(&self, step: &Step, duration_ms: u64) {
        eprintln!("[{}] {} {} ({duration_ms} ms)", step.iteration, step.call.name, status(step));
    }
}

/// Answer followed by a table of the steps taken
///
/// A failed session's answer already carries its INCOMPLETE label.
pub fn render(outcome: &SessionOutcome) -> String {
    let mut out = outcome.answer.clone();

    if outcome.steps.is_empty() {
        return out;
    }
    out.push_str("\n\n");
    out.push_str(&steps_table(&outcome.steps).to_string());
    out
}

fn steps_table(steps: &[Step]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Tool", "Status", "Detail"]);

    for step in steps {
        table.add_row(vec![
            step.iteration.to_string(),
            step.call.name.clone(),
            status(step).to_string(),
            detail(step),
        ]);
    }
    table
}

fn status(step: &Step) -> &'static str {
    if step.result.is_success() { "ok" } else { "error" }
}

/// Artifact for successes, error kind and message otherwise
fn detail(step: &Step) -> String {
    if let Some(artifact) = step.artifact() {
        return artifact.to_string();
    }
    let kind = step.result.error_kind.map(|k| k.as_str()).unwrap_or_default();
    let message = step.result.error_message.as_deref().unwrap_or_default();
    let text = format!("{kind}: {message}");
    if text.chars().count() > DETAIL_CHARS {
        let cut: String = text.chars().take(DETAIL_CHARS).collect();
        format!("{cut}...")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finagent_core::Error;
    use finagent_tools::ToolResult;
    use serde_json::json;

    fn step(iteration: usize, name: &str, result: ToolResult) -> Step {
        Step {
            iteration,
            thought: None,
            call: ToolCall::new(name, json!({})),
            result,
        }
    }

    #[test]
    fn test_detail_shows_artifact_or_error() {
        let ok = step(
            1,
            "fetch_price_data",
            ToolResult::success(json!({"identifier": "600519:20240101:20240301"})),
        );
        assert_eq!(detail(&ok), "600519:20240101:20240301");

        let failed = step(
            2,
            "render_chart",
            ToolResult::from_error(&Error::StaleReference("600519:20240101:20240301".to_string())),
        );
        assert!(detail(&failed).starts_with("stale_reference: "));
        assert_eq!(status(&failed), "error");
    }

    #[test]
    fn test_long_error_is_shortened() {
        let failed = step(1, "fetch_price_data", ToolResult::from_error(&Error::Network("x".repeat(300))));
        let text = detail(&failed);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), DETAIL_CHARS + 3);
    }

    #[test]
    fn test_table_has_a_row_per_step() {
        let steps = vec![
            step(1, "fetch_price_data", ToolResult::success(json!({"identifier": "a"}))),
            step(2, "compute_indicators", ToolResult::success(json!({"identifier": "a:e"}))),
        ];
        let table = steps_table(&steps);
        assert_eq!(table.row_iter().count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("compute_indicators"));
        assert!(rendered.contains("a:e"));
    }
}
