//! Tool for rendering charts of stored artifacts

use super::MarketServices;
use crate::chart::{ChartVariant, plan_chart};
use async_trait::async_trait;
use finagent_core::{Error, Result};
use finagent_tools::Tool;
use finagent_tools::schema::{enum_string, object, string};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Tool for rendering a chart
pub struct RenderChartTool {
    services: MarketServices,
}

#[derive(Debug, Deserialize)]
struct ChartParams {
    identifier: String,
    #[serde(default = "default_variant")]
    variant: ChartVariant,
}

fn default_variant() -> ChartVariant {
    ChartVariant::Auto
}

impl RenderChartTool {
    /// Create a new chart tool
    pub fn new(services: MarketServices) -> Self {
        Self { services }
    }

    async fn render(&self, params: ChartParams) -> Result<Value> {
        let artifact = self.services.store.get(&params.identifier).await?;
        let plan = plan_chart(&artifact, params.variant, self.services.config.chart_style)?;
        let path = self.services.renderer.render(&artifact, &plan).await?;

        info!(
            identifier = %params.identifier,
            variant = %plan.variant,
            path = %path.display(),
            "Rendered chart"
        );

        Ok(json!({
            "path": path.display().to_string(),
            "identifier": params.identifier,
            "variant": plan.variant,
            "requested_variant": params.variant,
            "title": plan.title,
            "panels": plan.panels,
        }))
    }
}

#[async_trait]
impl Tool for RenderChartTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: ChartParams = serde_json::from_value(params)
            .map_err(|e| Error::Validation(format!("Invalid parameters: {e}")))?;
        self.render(params).await
    }

    fn name(&self) -> &str {
        "render_chart"
    }

    fn description(&self) -> &str {
        "Render a chart of stored price data and return the output file path. \
         Variants: basic (candles and volume), moving_averages, macd, comprehensive \
         (averages, Bollinger bands, volume, MACD and RSI) or auto (richest available). \
         Every variant except basic needs an enriched identifier from compute_indicators."
    }

    fn input_schema(&self) -> Value {
        let variants: Vec<&str> = ChartVariant::ALL.iter().map(|v| v.as_str()).collect();
        object(
            json!({
                "identifier": string(Some("Identifier from fetch_price_data or compute_indicators")),
                "variant": enum_string(&variants, Some("Chart composition (default auto)")),
            }),
            &["identifier"],
        )
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "variant": { "type": "string" },
                "panels": { "type": "array" },
            },
            "required": ["path", "variant", "panels"],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartRenderer, JsonChartRenderer, MockChartRenderer};
    use crate::source::MockDataSource;
    use crate::tools::test_support::{bars, services};
    use crate::tools::{ComputeIndicatorsTool, FetchPriceDataTool};
    use std::path::PathBuf;
    use std::sync::Arc;

    async fn fetched(renderer: Arc<dyn ChartRenderer>) -> (MarketServices, String) {
        let mut source = MockDataSource::new();
        source.expect_fetch().returning(|_, _, end| Ok(bars(end, 80)));
        source
            .expect_display_name()
            .returning(|_| Ok(Some("贵州茅台".to_string())));
        let services = services(source, renderer, 8);

        let payload = FetchPriceDataTool::new(services.clone())
            .execute(json!({"symbol": "600519", "days": 120}))
            .await
            .unwrap();
        (services, payload["identifier"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_comprehensive_needs_enrichment() {
        let mut renderer = MockChartRenderer::new();
        renderer.expect_render().never();
        let (services, raw) = fetched(Arc::new(renderer)).await;

        let err = RenderChartTool::new(services)
            .execute(json!({"identifier": raw, "variant": "comprehensive"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), finagent_core::ErrorKind::MissingIndicator);
        assert!(err.hint().unwrap().contains("compute_indicators"));
    }

    #[tokio::test]
    async fn test_renders_enriched_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let (services, raw) = fetched(Arc::new(JsonChartRenderer::new(dir.path()))).await;
        let enriched = ComputeIndicatorsTool::new(services.clone())
            .execute(json!({"identifier": raw}))
            .await
            .unwrap()["identifier"]
            .as_str()
            .unwrap()
            .to_string();

        let payload = RenderChartTool::new(services)
            .execute(json!({"identifier": enriched, "variant": "comprehensive"}))
            .await
            .unwrap();

        assert_eq!(payload["variant"], "comprehensive");
        assert_eq!(payload["title"], "贵州茅台(600519) technical analysis");
        assert_eq!(payload["panels"].as_array().unwrap().len(), 4);
        let path = PathBuf::from(payload["path"].as_str().unwrap());
        assert!(path.starts_with(dir.path()));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_auto_on_raw_falls_back_to_basic() {
        let mut renderer = MockChartRenderer::new();
        renderer
            .expect_render()
            .withf(|_, plan| plan.variant == ChartVariant::Basic)
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("outputs/basic.json")));
        let (services, raw) = fetched(Arc::new(renderer)).await;

        let payload = RenderChartTool::new(services)
            .execute(json!({"identifier": raw}))
            .await
            .unwrap();
        assert_eq!(payload["variant"], "basic");
        assert_eq!(payload["requested_variant"], "auto");
        assert_eq!(payload["path"], "outputs/basic.json");
    }

    #[tokio::test]
    async fn test_renderer_failure_propagates() {
        let mut renderer = MockChartRenderer::new();
        renderer
            .expect_render()
            .returning(|_, _| Err(Error::Render("disk full".to_string())));
        let (services, raw) = fetched(Arc::new(renderer)).await;

        let err = RenderChartTool::new(services)
            .execute(json!({"identifier": raw, "variant": "basic"}))
            .await
            .unwrap_err();
        assert_eq!(err, Error::Render("disk full".to_string()));
    }

    #[test]
    fn test_schema_lists_variants() {
        let services = services(
            MockDataSource::new(),
            Arc::new(JsonChartRenderer::new("outputs")),
            2,
        );
        let schema = RenderChartTool::new(services).input_schema();
        assert_eq!(schema["properties"]["variant"]["enum"].as_array().unwrap().len(), 5);
    }
}
