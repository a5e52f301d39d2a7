//! Chart renderer collaborator and the JSON chart-document renderer

use super::ChartPlan;
use crate::artifact::StoredArtifact;
use crate::error::MarketError;
use async_trait::async_trait;
use finagent_core::Result;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Turns a chart plan over an artifact into an output file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Render and return the path of the produced file
    async fn render(&self, artifact: &StoredArtifact, plan: &ChartPlan) -> Result<PathBuf>;
}

/// Writes the plan and the decorated table as a JSON chart document
///
/// Output goes to `<output_dir>/<variant>_<identifier>.json` with `:` in the
/// identifier replaced by `_`. Any charting front end can draw the document.
#[derive(Debug, Clone)]
pub struct JsonChartRenderer {
    output_dir: PathBuf,
}

impl JsonChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn file_name(artifact: &StoredArtifact, plan: &ChartPlan) -> String {
        format!("{}_{}.json", plan.variant, artifact.identifier.replace(':', "_"))
    }

    /// One row per bar: date, OHLCV and every column the plan draws
    fn table(artifact: &StoredArtifact, plan: &ChartPlan) -> Vec<Value> {
        let columns = plan.columns();
        artifact
            .series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut row = Map::new();
                row.insert("date".to_string(), json!(bar.date));
                row.insert("open".to_string(), json!(bar.open));
                row.insert("high".to_string(), json!(bar.high));
                row.insert("low".to_string(), json!(bar.low));
                row.insert("close".to_string(), json!(bar.close));
                row.insert("volume".to_string(), json!(bar.volume));
                for name in &columns {
                    let value = artifact
                        .indicators
                        .as_ref()
                        .and_then(|set| set.get(name))
                        .and_then(|column| column[i]);
                    row.insert((*name).to_string(), json!(value));
                }
                Value::Object(row)
            })
            .collect()
    }
}

#[async_trait]
impl ChartRenderer for JsonChartRenderer {
    async fn render(&self, artifact: &StoredArtifact, plan: &ChartPlan) -> Result<PathBuf> {
        let document = json!({
            "identifier": artifact.identifier,
            "plan": plan,
            "rows": Self::table(artifact, plan),
        });
        let body = serde_json::to_vec_pretty(&document)
            .map_err(|e| finagent_core::Error::Render(e.to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(MarketError::from)?;
        let path = self.output_dir.join(Self::file_name(artifact, plan));
        tokio::fs::write(&path, body).await.map_err(MarketError::from)?;

        debug!(path = %path.display(), rows = artifact.series.len(), "Wrote chart document");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactSummary, DateRange};
    use crate::chart::{ChartVariant, plan_chart};
    use crate::config::ChartStyle;
    use chrono::{Days, NaiveDate};
    use finagent_indicators::{Bar, PriceSeries, add_all_indicators};

    fn enriched(len: u32) -> StoredArtifact {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..len)
            .map(|i| {
                let close = 50.0 + f64::from(i % 4);
                Bar::new(start + Days::new(u64::from(i)), close, close + 0.5, close - 0.5, close, 10.0)
            })
            .collect();
        let series = PriceSeries::new(bars).unwrap();
        let range = DateRange::new(start, start + Days::new(60));
        let raw = StoredArtifact::raw(ArtifactSummary::new("510300", "沪深300ETF", range, &series), series);
        let set = add_all_indicators(&raw.series);
        raw.enriched(set)
    }

    #[tokio::test]
    async fn test_writes_chart_document() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = JsonChartRenderer::new(dir.path().join("charts"));
        let artifact = enriched(40);
        let plan = plan_chart(&artifact, ChartVariant::Macd, ChartStyle::Dark).unwrap();

        let path = renderer.render(&artifact, &plan).await.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "macd_510300_20240101_20240301_e.json"
        );

        let document: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(document["plan"]["variant"], "macd");
        let rows = document["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 40);
        assert!(rows[0]["macd"].is_null());
        assert!(rows[39]["macd"].is_number());
        assert_eq!(rows[0]["close"], 50.0);
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let renderer = JsonChartRenderer::new(blocker.join("charts"));
        let artifact = enriched(5);
        let plan = plan_chart(&artifact, ChartVariant::Basic, ChartStyle::Dark).unwrap();

        let err = renderer.render(&artifact, &plan).await.unwrap_err();
        assert_eq!(err.kind(), finagent_core::ErrorKind::Render);
    }
}
