//! Command-line interface for finagent
//!
//! ```text
//! finagent "How has 600519 traded over the last 90 days?"
//! finagent --json --max-iterations 6 "Show the MACD of 510300"
//! ```

mod report;

use anyhow::Context;
use clap::Parser;
use finagent_core::{CancellationSignal, SessionContext};
use finagent_llm::providers::AnthropicProvider;
use finagent_market::{MarketConfig, MarketServices, default_registry};
use finagent_runtime::{AnalysisAgent, ExecutorConfig, LlmReasoner, Orchestrator};
use finagent_utils::{AppConfig, LogFormat, init_tracing_with};
use report::ProgressPrinter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "finagent")]
#[command(version, about = "Technical analysis of A-share stocks and ETFs through a tool-using agent", long_about = None)]
struct Args {
    /// Natural-language request
    request: String,

    /// Maximum reasoning iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Number of datasets kept in the in-memory store
    #[arg(long)]
    store_capacity: Option<usize>,

    /// Directory for rendered charts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// Print the session outcome as JSON
    #[arg(long)]
    json: bool,

    /// Log output format (fmt or json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let app = AppConfig::from_env()?;
    init_tracing_with(args.log_format.unwrap_or(app.log_format))?;
    info!(app = %app.app_name, environment = %app.environment, "Starting finagent");

    let mut market = MarketConfig::default().with_env_overrides()?;
    if let Some(capacity) = args.store_capacity {
        market.store_capacity = capacity;
    }
    if let Some(dir) = args.output_dir {
        market.output_dir = dir;
    }
    market.validate()?;

    let mut executor = ExecutorConfig::default().with_env_overrides()?;
    if let Some(max) = args.max_iterations {
        executor.max_iterations = max;
    }
    if let Some(model) = args.model {
        executor.model = model;
    }
    executor.validate()?;

    let services = MarketServices::live(market)?;
    let registry = Arc::new(default_registry(&services)?);
    let provider = Arc::new(AnthropicProvider::from_env().context("set ANTHROPIC_API_KEY to reach the model")?);
    let reasoner = Arc::new(LlmReasoner::new(provider, &executor, &registry.specs())?);

    let orchestrator = Orchestrator::builder()
        .reasoner(reasoner)
        .registry(registry)
        .config(executor)
        .event_handler(Arc::new(ProgressPrinter))
        .build()?;
    let agent = AnalysisAgent::new(orchestrator, "finagent");

    let signal = CancellationSignal::new();
    let context = SessionContext::new().with_cancellation(signal.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step");
            signal.cancel();
        }
    });

    let outcome = agent.analyze(&args.request, &context).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", report::render(&outcome));
    }

    Ok(())
}
