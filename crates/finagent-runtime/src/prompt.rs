//! System prompt and history rendering for the language-model reasoner

use crate::step::Step;
use chrono::NaiveDate;
use finagent_core::{Error, Result};
use finagent_llm::Message;
use finagent_tools::ToolSpec;
use minijinja::{Environment, context};
use serde_json::json;

const SYSTEM_TEMPLATE: &str = r#"You are a technical analyst for Chinese A-share stocks and ETFs. Today is {{ today }}.

Answer the user's request by calling tools one at a time. Each reply must be a single JSON object, either

{"thought": "<what you will do and why>", "action": {"name": "<tool name>", "arguments": { ... }}}

or, once you can answer,

{"thought": "<summary of the evidence>", "final_answer": "<answer for the user>"}

Tools:
{% for tool in tools %}
## {{ tool.name }}
{{ tool.description }}
Input schema: {{ tool.input_schema | tojson }}
{% endfor %}
Rules:
- Fetch data before computing indicators, and compute indicators before rendering any chart other than "basic".
- Pass identifiers exactly as returned by earlier tools.
- Tool errors include a kind and a hint; follow the hint instead of repeating the same call.
- Base the final answer only on tool results, and mention the chart path when one was rendered.
{%- if extra %}

{{ extra }}
{%- endif %}"#;

/// Render the system prompt for `tools` as of `today`
///
/// `extra` is appended verbatim as additional instructions.
pub fn render_system_prompt(today: NaiveDate, tools: &[ToolSpec], extra: Option<&str>) -> Result<String> {
    let env = Environment::new();
    env.render_str(
        SYSTEM_TEMPLATE,
        context! {
            today => today.format("%Y-%m-%d").to_string(),
            tools => tools,
            extra => extra,
        },
    )
    .map_err(|e| Error::Config(format!("failed to render system prompt: {e}")))
}

/// Conversation replaying `history` after the user request
///
/// Each step becomes an assistant turn holding the thought and action, then a
/// user turn holding the observation.
pub fn conversation(request: &str, history: &[Step]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(1 + history.len() * 2);
    messages.push(Message::user(request));

    for step in history {
        let mut proposal = json!({
            "action": {"name": step.call.name, "arguments": step.call.arguments},
        });
        if let Some(thought) = &step.thought {
            proposal["thought"] = json!(thought);
        }
        messages.push(Message::assistant(proposal.to_string()));

        let observation = json!({ "observation": step.result });
        messages.push(Message::user(observation.to_string()));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use finagent_llm::Role;
    use finagent_tools::{ToolCall, ToolResult};

    fn spec(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            description: format!("{name} description"),
            input_schema: json!({"type": "object", "properties": {"identifier": {"type": "string"}}}),
            output_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let prompt = render_system_prompt(
            today,
            &[spec("compute_indicators"), spec("render_chart")],
            Some("Answer in Chinese."),
        )
        .unwrap();

        assert!(prompt.contains("Today is 2024-03-01."));
        assert!(prompt.contains("## compute_indicators"));
        assert!(prompt.contains("## render_chart"));
        assert!(prompt.contains(r#""identifier":{"type":"string"}"#));
        assert!(prompt.ends_with("Answer in Chinese."));
    }

    #[test]
    fn test_conversation_alternates_roles() {
        let history = vec![Step {
            iteration: 1,
            thought: Some("need data".to_string()),
            call: ToolCall::new("fetch_price_data", json!({"symbol": "600519"})),
            result: ToolResult::success(json!({"identifier": "600519:20240101:20240301"})),
        }];

        let messages = conversation("analyse 600519", &history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[2].role, Role::User);

        let proposal: serde_json::Value = serde_json::from_str(&messages[1].text()).unwrap();
        assert_eq!(proposal["thought"], "need data");
        assert_eq!(proposal["action"]["arguments"]["symbol"], "600519");

        let observation: serde_json::Value = serde_json::from_str(&messages[2].text()).unwrap();
        assert_eq!(observation["observation"]["status"], "success");
    }
}
