//! Analysis agent: the orchestration loop behind the [`Agent`] trait

use crate::executor::Orchestrator;
use crate::step::SessionOutcome;
use async_trait::async_trait;
use finagent_core::{Agent, Result, SessionContext};

/// Context key under which the last [`SessionOutcome`] is stored
pub const OUTCOME_KEY: &str = "analysis_outcome";

/// An agent answering price-analysis requests with the tool loop
///
/// `process` returns the final answer, or the partial answer of a failed
/// session. The full outcome, steps included, is written to the context
/// under [`OUTCOME_KEY`].
pub struct AnalysisAgent {
    orchestrator: Orchestrator,
    name: String,
}

impl AnalysisAgent {
    /// Create a new analysis agent
    pub fn new(orchestrator: Orchestrator, name: impl Into<String>) -> Self {
        Self {
            orchestrator,
            name: name.into(),
        }
    }

    /// Get a reference to the underlying orchestrator
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Run a session and return the full outcome
    pub async fn analyze(&self, request: &str, context: &SessionContext) -> SessionOutcome {
        self.orchestrator.run(request, context).await
    }
}

#[async_trait]
impl Agent for AnalysisAgent {
    async fn process(&self, input: String, context: &mut SessionContext) -> Result<String> {
        let outcome = self.analyze(&input, context).await;
        context.insert_typed(OUTCOME_KEY, &outcome)?;
        Ok(outcome.answer)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::{Proposal, Reasoner};
    use crate::step::Step;
    use finagent_tools::ToolRegistry;
    use std::sync::Arc;

    struct Immediate;

    #[async_trait]
    impl Reasoner for Immediate {
        async fn propose_next(&self, request: &str, _history: &[Step]) -> Result<Proposal> {
            Ok(Proposal::final_answer(format!("nothing to do for {request}")))
        }
    }

    #[tokio::test]
    async fn test_process_records_outcome() {
        let orchestrator = Orchestrator::builder()
            .reasoner(Arc::new(Immediate))
            .registry(Arc::new(ToolRegistry::new()))
            .build()
            .unwrap();
        let agent = AnalysisAgent::new(orchestrator, "analyst");
        let mut context = SessionContext::with_session_id("s-1");

        let answer = agent.process("600519".to_string(), &mut context).await.unwrap();
        assert_eq!(answer, "nothing to do for 600519");
        assert_eq!(agent.name(), "analyst");

        let stored = context.get(OUTCOME_KEY).unwrap();
        assert_eq!(stored["state"], "DONE");
        assert_eq!(stored["session_id"], "s-1");
        assert_eq!(stored["complete"], true);
    }
}
