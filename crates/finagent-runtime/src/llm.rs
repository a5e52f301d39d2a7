//! Reasoner backed by a language-model provider

use crate::executor::ExecutorConfig;
use crate::parsing::ReplyParser;
use crate::prompt::{conversation, render_system_prompt};
use crate::reasoner::{Proposal, Reasoner};
use crate::step::Step;
use async_trait::async_trait;
use chrono::Local;
use finagent_core::Result;
use finagent_llm::{CompletionRequest, LLMProvider};
use finagent_tools::ToolSpec;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 300;

/// Asks an [`LLMProvider`] for the next step and parses its reply
pub struct LlmReasoner {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
    parser: ReplyParser,
}

impl LlmReasoner {
    /// Create a reasoner for a session over the tools in `specs`
    ///
    /// The system prompt is rendered once, with today's date.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExecutorConfig, specs: &[ToolSpec]) -> Result<Self> {
        let today = Local::now().date_naive();
        let system_prompt = match &config.system_prompt {
            Some(custom) => custom.clone(),
            None => render_system_prompt(today, specs, config.extra_instructions.as_deref())?,
        };

        Ok(Self {
            provider,
            system_prompt,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            parser: ReplyParser::new()?,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    async fn propose_next(&self, request: &str, history: &[Step]) -> Result<Proposal> {
        let completion = CompletionRequest::builder(&self.model)
            .system(self.system_prompt.clone())
            .messages(conversation(request, history))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        info!(
            provider = self.provider.name(),
            model = %self.model,
            history = history.len(),
            "Sending request to LLM"
        );
        let response = self.provider.complete(completion).await?;

        info!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            "LLM response received"
        );
        if response.is_truncated() {
            warn!("LLM reply hit the token limit and may be truncated");
        }

        let text = response.text();
        let preview: String = text.chars().take(PREVIEW_CHARS).collect();
        debug!(response_preview = %preview, "LLM response content preview");

        Ok(self.parser.parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finagent_llm::{CompletionResponse, LLMError, Message, StopReason, TokenUsage};
    use finagent_tools::{ToolCall, ToolResult};
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider replaying canned replies and recording requests
    struct CannedProvider {
        reply: std::result::Result<String, String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl CannedProvider {
        fn new(reply: std::result::Result<&str, &str>) -> Self {
            Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn complete(&self, request: CompletionRequest) -> finagent_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    message: Message::assistant(text.clone()),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                }),
                Err(e) => Err(LLMError::RateLimitExceeded(e.clone())),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn specs() -> Vec<ToolSpec> {
        vec![ToolSpec {
            name: "fetch_price_data".to_string(),
            description: "fetch".to_string(),
            input_schema: json!({"type": "object"}),
            output_schema: json!({"type": "object"}),
        }]
    }

    #[tokio::test]
    async fn test_proposes_action_from_reply() {
        let provider = Arc::new(CannedProvider::new(Ok(
            r#"{"thought": "need data", "action": {"name": "fetch_price_data", "arguments": {"symbol": "600519"}}}"#,
        )));
        let reasoner = LlmReasoner::new(provider.clone(), &ExecutorConfig::default(), &specs()).unwrap();

        let history = vec![Step {
            iteration: 1,
            thought: None,
            call: ToolCall::new("fetch_price_data", json!({"symbol": "000001"})),
            result: ToolResult::success(json!({"identifier": "a"})),
        }];
        let proposal = reasoner.propose_next("analyse 600519", &history).await.unwrap();
        assert!(matches!(proposal, Proposal::Action { ref name, .. } if name == "fetch_price_data"));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 3);
        assert!(requests[0].system.as_deref().unwrap().contains("## fetch_price_data"));
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_taxonomy() {
        let provider = Arc::new(CannedProvider::new(Err("slow down")));
        let reasoner = LlmReasoner::new(provider, &ExecutorConfig::default(), &specs()).unwrap();

        let err = reasoner.propose_next("analyse", &[]).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_system_prompt_override() {
        let provider = Arc::new(CannedProvider::new(Ok("done")));
        let config = ExecutorConfig::builder().system_prompt("custom").build().unwrap();
        let reasoner = LlmReasoner::new(provider, &config, &specs()).unwrap();
        assert_eq!(reasoner.system_prompt(), "custom");
    }
}
