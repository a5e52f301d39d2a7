//! Shared fixtures for the orchestration integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use finagent_core::{Error, Result, RetryPolicy};
use finagent_indicators::Bar;
use finagent_market::{
    DataSource, FixedClock, JsonChartRenderer, MarketConfig, MarketServices, default_registry,
};
use finagent_runtime::{ExecutorConfig, Orchestrator, Proposal, Reasoner, Step};
use finagent_tools::ToolRegistry;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// Deterministic weekday bars; `999999` is an unknown code
#[derive(Default)]
pub struct FakeSource {
    pub fetches: AtomicUsize,
}

impl FakeSource {
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if symbol == "999999" {
            return Err(Error::NotFound(format!("unknown symbol {symbol}")));
        }

        let base = if symbol == "600519" { 1700.0 } else { 10.0 };
        let bars = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .enumerate()
            .map(|(i, date)| {
                let x = i as f64;
                let close = base * (1.0 + 0.02 * (x * 0.35).sin()) + x * 0.1;
                let open = close - 0.5;
                Bar::new(date, open, close + 1.0, open - 1.0, close, 10_000.0 + 50.0 * x)
            })
            .collect();
        Ok(bars)
    }

    async fn display_name(&self, symbol: &str) -> Result<Option<String>> {
        Ok((symbol == "600519").then(|| "贵州茅台".to_string()))
    }
}

/// Market services over the fake source, pinned to [`today`]
pub fn services(source: Arc<FakeSource>, capacity: usize, output_dir: &Path) -> MarketServices {
    let config = MarketConfig::builder()
        .store_capacity(capacity)
        .output_dir(output_dir)
        .retry_backoff_base(Duration::from_millis(1))
        .retry_backoff_max(Duration::from_millis(2))
        .build()
        .unwrap();
    let renderer = Arc::new(JsonChartRenderer::new(output_dir));
    MarketServices::new(config, source, renderer)
        .with_clock(Arc::new(FixedClock(today())))
}

pub fn registry(services: &MarketServices) -> Arc<ToolRegistry> {
    Arc::new(default_registry(services).unwrap())
}

type Script = dyn Fn(&str, &[Step]) -> Result<Proposal> + Send + Sync;

/// Reasoner deciding from the history alone
pub struct ScriptedReasoner {
    script: Box<Script>,
    calls: AtomicUsize,
}

impl ScriptedReasoner {
    pub fn new(script: impl Fn(&str, &[Step]) -> Result<Proposal> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn propose_next(&self, request: &str, history: &[Step]) -> Result<Proposal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(request, history)
    }
}

pub fn orchestrator(reasoner: Arc<dyn Reasoner>, registry: Arc<ToolRegistry>, max_iterations: usize) -> Orchestrator {
    let config = ExecutorConfig::builder()
        .max_iterations(max_iterations)
        .reasoning_retry(RetryPolicy::fast())
        .build()
        .unwrap();
    Orchestrator::new(reasoner, registry, config)
}

/// Identifier returned by the most recent successful step
pub fn last_identifier(history: &[Step]) -> Option<String> {
    history
        .iter()
        .rev()
        .filter(|s| s.result.is_success())
        .find_map(|s| s.result.payload_str("identifier"))
        .map(str::to_string)
}
