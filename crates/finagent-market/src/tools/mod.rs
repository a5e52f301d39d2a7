//! Market tools exposed to the orchestration loop

pub mod chart;
pub mod fetch;
pub mod indicators;

pub use chart::RenderChartTool;
pub use fetch::FetchPriceDataTool;
pub use indicators::ComputeIndicatorsTool;

use crate::cache::NameCache;
use crate::chart::{ChartRenderer, JsonChartRenderer};
use crate::config::MarketConfig;
use crate::error::Result;
use crate::source::{Clock, DataSource, EastMoneyClient, SystemClock};
use crate::store::ArtifactStore;
use finagent_tools::ToolRegistry;
use std::sync::Arc;

/// Collaborators shared by the market tools of one session
#[derive(Clone)]
pub struct MarketServices {
    pub config: Arc<MarketConfig>,
    pub store: Arc<ArtifactStore>,
    pub source: Arc<dyn DataSource>,
    pub renderer: Arc<dyn ChartRenderer>,
    pub clock: Arc<dyn Clock>,
    pub names: NameCache,
}

impl MarketServices {
    /// Services over the given collaborators, with a fresh store sized by
    /// `config` and the system clock
    pub fn new(config: MarketConfig, source: Arc<dyn DataSource>, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            store: Arc::new(ArtifactStore::new(config.store_capacity)),
            names: NameCache::new(config.name_cache_ttl),
            config: Arc::new(config),
            source,
            renderer,
            clock: Arc::new(SystemClock),
        }
    }

    /// Services backed by the East Money client and the JSON chart renderer
    pub fn live(config: MarketConfig) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(EastMoneyClient::new(&config)?);
        let renderer = Arc::new(JsonChartRenderer::new(config.output_dir.clone()));
        Ok(Self::new(config, source, renderer))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: Arc<ArtifactStore>) -> Self {
        self.store = store;
        self
    }
}

/// Registry holding `fetch_price_data`, `compute_indicators` and `render_chart`
pub fn default_registry(services: &MarketServices) -> finagent_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FetchPriceDataTool::new(services.clone())))?;
    registry.register(Arc::new(ComputeIndicatorsTool::new(services.clone())))?;
    registry.register(Arc::new(RenderChartTool::new(services.clone())))?;
    Ok(registry)
}

/// Round for presentation to the reasoning step
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockDataSource;

    #[test]
    fn test_default_registry() {
        let services = test_support::services(
            MockDataSource::new(),
            Arc::new(JsonChartRenderer::new("outputs")),
            4,
        );
        let registry = default_registry(&services).unwrap();
        assert_eq!(
            registry.names(),
            vec!["compute_indicators", "fetch_price_data", "render_chart"]
        );
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-0.000_049, 4), -0.0);
    }
}
