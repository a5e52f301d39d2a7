//! Orchestrator for running the think-act-observe loop
//!
//! Each iteration:
//! 1. THINKING: check cancellation, ask the reasoner for the next proposal
//! 2. ACTING: invoke the proposed tool through the registry
//! 3. OBSERVING: append the result to history, success or error alike
//!
//! A final answer moves the loop to DONE. Running out of iterations or an
//! external cancellation moves it to FAILED with a partial answer.

use crate::reasoner::{Proposal, Reasoner};
use crate::step::{INVALID_ACTION_STEP, LoopState, REASONING_STEP, SessionOutcome, Step};
use async_trait::async_trait;
use finagent_core::{Error, Result, RetryPolicy, SessionContext};
use finagent_tools::{ToolCall, ToolRegistry, ToolResult};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Event handler for orchestration events
///
/// Implement this trait to receive callbacks during a session, e.g. to
/// print progress while the loop runs.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when an iteration enters THINKING
    async fn on_thinking(&self, _iteration: usize) {}

    /// Called before a proposed tool is invoked
    async fn on_tool_start(&self, _iteration: usize, _call: &ToolCall) {}

    /// Called after an observation was appended
    async fn on_observation(&self, _step: &Step, _duration_ms: u64) {}

    /// Called once the session reached DONE or FAILED
    async fn on_complete(&self, _outcome: &SessionOutcome) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for the orchestration loop
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Maximum number of reasoning calls per session
    pub max_iterations: usize,

    /// Bounded wait for one reasoning call
    pub reasoning_timeout: Duration,

    /// Retry budget for transient reasoning failures
    pub reasoning_retry: RetryPolicy,

    /// Model to use
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,

    /// Replaces the rendered system prompt entirely
    pub system_prompt: Option<String>,

    /// Appended to the rendered system prompt
    pub extra_instructions: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            reasoning_timeout: Duration::from_secs(120),
            reasoning_retry: RetryPolicy::default(),
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 4096,
            temperature: Some(0.2),
            system_prompt: None,
            extra_instructions: None,
        }
    }
}

impl ExecutorConfig {
    /// Create a new configuration builder
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }

    /// Apply `FINAGENT_MAX_ITERATIONS` and `FINAGENT_MODEL` if set
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var("FINAGENT_MAX_ITERATIONS") {
            self.max_iterations = raw
                .parse()
                .map_err(|_| Error::Config(format!("FINAGENT_MAX_ITERATIONS is not a number: {raw}")))?;
        }
        if let Ok(model) = std::env::var("FINAGENT_MODEL") {
            self.model = model;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".to_string()));
        }
        if self.reasoning_timeout.is_zero() {
            return Err(Error::Config("reasoning_timeout must be positive".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".to_string()));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(Error::Config(format!("temperature {t} outside [0, 1]")));
            }
        }
        Ok(())
    }

    fn reasoning_policy(&self) -> RetryPolicy {
        self.reasoning_retry.clone().with_attempt_timeout(self.reasoning_timeout)
    }
}

/// Builder for [`ExecutorConfig`]
#[derive(Debug, Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn reasoning_timeout(mut self, timeout: Duration) -> Self {
        self.config.reasoning_timeout = timeout;
        self
    }

    pub fn reasoning_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.reasoning_retry = policy;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn extra_instructions(mut self, text: impl Into<String>) -> Self {
        self.config.extra_instructions = Some(text.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ExecutorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Runs sessions of the think-act-observe loop
///
/// The loop is sequential: one reasoning call or tool invocation is in
/// flight at a time, and every reasoning call sees every prior observation.
/// Given the same reasoner replies, a session issues the same tool calls.
pub struct Orchestrator {
    reasoner: Arc<dyn Reasoner>,
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Arc<dyn ExecutorEventHandler>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(reasoner: Arc<dyn Reasoner>, registry: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self {
            reasoner,
            registry,
            config,
            event_handler: Arc::new(NoOpEventHandler),
        }
    }

    /// Create a new orchestrator builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Set the event handler for receiving orchestration events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run one session for `request`
    ///
    /// Never fails: every error below the loop becomes an observation or a
    /// FAILED outcome carrying a partial answer.
    pub async fn run(&self, request: &str, context: &SessionContext) -> SessionOutcome {
        let session_id = context.session_id();
        let max_iterations = self.config.max_iterations.max(1);
        let policy = self.config.reasoning_policy();
        let mut steps: Vec<Step> = Vec::new();

        info!(session_id, max_iterations, "Session started");

        for iteration in 1..=max_iterations {
            if context.cancellation().is_cancelled() {
                warn!(session_id, iteration, "Session cancelled");
                return self
                    .finish(SessionOutcome::failed(session_id, &Error::Cancelled, iteration - 1, steps))
                    .await;
            }

            info!(
                session_id,
                iteration,
                max_iterations,
                phase = LoopState::Thinking.as_str(),
                "Agent iteration started"
            );
            self.event_handler.on_thinking(iteration).await;

            let proposal = policy
                .execute("reasoning", || self.reasoner.propose_next(request, &steps))
                .await;

            let (thought, call) = match proposal {
                Ok(Proposal::Final { text }) => {
                    info!(session_id, iteration, answer_length = text.len(), "Agent completed");
                    return self
                        .finish(SessionOutcome::done(session_id, text, iteration, steps))
                        .await;
                }
                Ok(Proposal::Action {
                    thought,
                    name,
                    arguments,
                }) => (thought, ToolCall { name, arguments }),
                Ok(Proposal::Malformed { raw, reason }) => {
                    warn!(session_id, iteration, %reason, "Unparseable proposal");
                    let error = Error::Validation(format!(
                        "could not read the proposed action ({reason}); reply with one JSON object holding 'action' or 'final_answer'"
                    ));
                    let call = ToolCall::new(INVALID_ACTION_STEP, json!({ "raw": raw }));
                    self.observe(&mut steps, iteration, None, call, ToolResult::from_error(&error), 0)
                        .await;
                    continue;
                }
                Err(error) => {
                    warn!(session_id, iteration, %error, "Reasoning failed");
                    let call = ToolCall::new(REASONING_STEP, json!({}));
                    self.observe(&mut steps, iteration, None, call, ToolResult::from_error(&error), 0)
                        .await;
                    continue;
                }
            };

            debug!(session_id, iteration, phase = LoopState::Acting.as_str(), tool = %call.name, "Dispatching tool");
            if let Some(thought) = &thought {
                let preview: String = thought.chars().take(300).collect();
                debug!(thought = %preview, "Reasoning");
            }
            self.event_handler.on_tool_start(iteration, &call).await;

            let started = Instant::now();
            let result = self.registry.invoke(&call).await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            self.observe(&mut steps, iteration, thought, call, result, duration_ms)
                .await;
        }

        warn!(session_id, max_iterations, "Max iterations reached without a final answer");
        self.finish(SessionOutcome::failed(
            session_id,
            &Error::LoopExhausted(max_iterations),
            max_iterations,
            steps,
        ))
        .await
    }

    /// OBSERVING: append the step and notify
    async fn observe(
        &self,
        steps: &mut Vec<Step>,
        iteration: usize,
        thought: Option<String>,
        call: ToolCall,
        result: ToolResult,
        duration_ms: u64,
    ) {
        debug!(iteration, phase = LoopState::Observing.as_str(), tool = %call.name, status = ?result.status, "Observation recorded");
        let step = Step {
            iteration,
            thought,
            call,
            result,
        };
        self.event_handler.on_observation(&step, duration_ms).await;
        steps.push(step);
    }

    async fn finish(&self, outcome: SessionOutcome) -> SessionOutcome {
        info!(
            session_id = %outcome.session_id,
            phase = outcome.state.as_str(),
            iterations = outcome.iterations,
            steps = outcome.steps.len(),
            "Session finished"
        );
        self.event_handler.on_complete(&outcome).await;
        outcome
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    reasoner: Option<Arc<dyn Reasoner>>,
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl OrchestratorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            reasoner: None,
            registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Set the reasoner
    pub fn reasoner(mut self, reasoner: Arc<dyn Reasoner>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    /// Set the tool registry
    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<Orchestrator> {
        let reasoner = self
            .reasoner
            .ok_or_else(|| Error::Config("Reasoner not set".to_string()))?;
        self.config.validate()?;

        let orchestrator = Orchestrator::new(reasoner, self.registry, self.config);
        Ok(match self.event_handler {
            Some(handler) => orchestrator.with_event_handler(handler),
            None => orchestrator,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
