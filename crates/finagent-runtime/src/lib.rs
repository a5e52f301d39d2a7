//! Orchestration runtime for finagent
//!
//! This crate drives the think-act-observe loop: a [`Reasoner`] proposes one
//! tool call at a time, the [`Orchestrator`] runs it through the tool
//! registry and feeds the observation back, until a final answer or the
//! iteration bound. [`LlmReasoner`] is the language-model backed reasoner;
//! tests and batch jobs can plug in their own.

pub mod agent;
pub mod executor;
pub mod llm;
pub mod parsing;
pub mod prompt;
pub mod reasoner;
pub mod step;

// Re-export key types
pub use agent::{AnalysisAgent, OUTCOME_KEY};
pub use executor::{
    ExecutorConfig, ExecutorConfigBuilder, ExecutorEventHandler, NoOpEventHandler, Orchestrator,
    OrchestratorBuilder,
};
pub use llm::LlmReasoner;
pub use parsing::ReplyParser;
pub use reasoner::{Proposal, Reasoner};
pub use step::{Failure, INVALID_ACTION_STEP, LoopState, REASONING_STEP, SessionOutcome, Step};
