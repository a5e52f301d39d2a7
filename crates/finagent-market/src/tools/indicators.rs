//! Tool for enriching a stored series with technical indicators

use super::{MarketServices, round_to};
use async_trait::async_trait;
use finagent_core::{Error, Result};
use finagent_indicators::{IndicatorParams, IndicatorSet, Signals, add_indicators};
use finagent_tools::Tool;
use finagent_tools::schema::{array, bounded_integer, object, string};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

/// Columns reported in the latest-bar snapshot
const SNAPSHOT_COLUMNS: [&str; 10] = [
    "ma_5",
    "ma_20",
    "ma_60",
    "macd",
    "macd_signal",
    "macd_hist",
    "rsi_14",
    "bb_upper",
    "bb_middle",
    "bb_lower",
];

/// Tool for computing indicators over a stored artifact
pub struct ComputeIndicatorsTool {
    services: MarketServices,
}

#[derive(Debug, Deserialize)]
struct IndicatorRequest {
    identifier: String,
    #[serde(default)]
    ma_windows: Vec<usize>,
}

impl ComputeIndicatorsTool {
    /// Create a new indicators tool
    pub fn new(services: MarketServices) -> Self {
        Self { services }
    }

    async fn compute(&self, request: IndicatorRequest) -> Result<Value> {
        let store = &self.services.store;
        let source = store.get(&request.identifier).await?;

        let params = IndicatorParams::with_extra_ma_windows(&request.ma_windows);
        let set = add_indicators(&source.series, &params)
            .map_err(|e| Error::internal(format!("indicator columns misaligned: {e}")))?;

        let snapshot = snapshot(source.series.last().map(|b| b.close), &set);
        let signals = Signals::latest(&source.series, &set);
        let columns: Vec<String> = set.names().map(str::to_string).collect();

        let enriched = store.attach_indicators(&request.identifier, set).await?;
        info!(
            source = %request.identifier,
            identifier = %enriched,
            columns = columns.len(),
            "Computed indicators"
        );

        Ok(json!({
            "identifier": enriched,
            "source_identifier": request.identifier,
            "row_count": source.series.len(),
            "columns": columns,
            "latest": snapshot,
            "signals": signals,
        }))
    }
}

/// Latest close and indicator values, null where undefined
fn snapshot(close: Option<f64>, set: &IndicatorSet) -> Value {
    let mut latest = Map::new();
    latest.insert("close".to_string(), json!(close));
    for name in SNAPSHOT_COLUMNS {
        let decimals = if name.starts_with("macd") { 4 } else { 2 };
        let value = set.latest(name).map(|v| round_to(v, decimals));
        latest.insert(name.to_string(), json!(value));
    }
    Value::Object(latest)
}

#[async_trait]
impl Tool for ComputeIndicatorsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let request: IndicatorRequest = serde_json::from_value(params)
            .map_err(|e| Error::Validation(format!("Invalid parameters: {e}")))?;
        self.compute(request).await
    }

    fn name(&self) -> &str {
        "compute_indicators"
    }

    fn description(&self) -> &str {
        "Compute technical indicators over stored price data: moving averages 5/10/20/60, \
         MACD 12/26/9, RSI 14, Bollinger bands 20/2 and volume averages. Takes the identifier \
         returned by fetch_price_data and returns a new identifier (ending in ':e') for the \
         enriched data, the latest indicator values and MACD/RSI/MA signals. \
         Leading values that need more history than available are null."
    }

    fn input_schema(&self) -> Value {
        object(
            json!({
                "identifier": string(Some("Identifier returned by fetch_price_data")),
                "ma_windows": array(
                    bounded_integer(1, 250, None),
                    Some("Extra moving-average windows beyond 5/10/20/60"),
                ),
            }),
            &["identifier"],
        )
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "identifier": { "type": "string" },
                "source_identifier": { "type": "string" },
                "columns": { "type": "array", "items": { "type": "string" } },
                "latest": { "type": "object" },
                "signals": { "type": "object" },
            },
            "required": ["identifier", "source_identifier", "columns", "latest", "signals"],
        })
    }
}
