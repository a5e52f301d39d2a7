//! Tool for fetching daily price history into the artifact store

use super::MarketServices;
use crate::artifact::{ArtifactSummary, DateRange, StoredArtifact, raw_identifier};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use finagent_core::{Error, Result};
use finagent_indicators::PriceSeries;
use finagent_tools::Tool;
use finagent_tools::schema::{bounded_integer, object, pattern_string};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

const DEFAULT_DAYS: u64 = 60;
const DATE_PATTERN: &str = r"^\d{4}-?\d{2}-?\d{2}$";

/// Tool for fetching price history
pub struct FetchPriceDataTool {
    services: MarketServices,
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    symbol: String,
    #[serde(default)]
    days: Option<u64>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| Error::Validation(format!("'{raw}' is not a valid date (YYYYMMDD or YYYY-MM-DD)")))
}

impl FetchParams {
    /// Calendar range to request; `days` wins over explicit dates
    fn resolve_range(&self, today: NaiveDate) -> Result<DateRange> {
        let explicit = (self.start_date.as_deref(), self.end_date.as_deref());
        if self.days.is_none() && explicit != (None, None) {
            let (Some(start), Some(end)) = explicit else {
                return Err(Error::Validation(
                    "start_date and end_date must be given together".to_string(),
                ));
            };
            let (start, end) = (parse_date(start)?, parse_date(end)?);
            if start > end {
                return Err(Error::Validation(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
            return Ok(DateRange::new(start, end));
        }

        let days = self.days.unwrap_or(DEFAULT_DAYS);
        let start = today
            .checked_sub_days(Days::new(days))
            .ok_or_else(|| Error::Validation(format!("{days} days reaches before the calendar start")))?;
        Ok(DateRange::new(start, today))
    }
}

impl FetchPriceDataTool {
    /// Create a new fetch tool
    pub fn new(services: MarketServices) -> Self {
        Self { services }
    }

    async fn fetch(&self, params: FetchParams) -> Result<Value> {
        let services = &self.services;
        let range = params.resolve_range(services.clock.today())?;
        let symbol = params.symbol.as_str();
        let identifier = raw_identifier(symbol, range);

        if services.store.contains(&identifier).await {
            if let Ok(existing) = services.store.get(&identifier).await {
                info!(identifier = %identifier, "Reusing stored price data");
                return Ok(with_flags(existing.summary_json(), existing.series.is_empty(), true));
            }
        }

        let policy = services.config.retry_policy();
        let bars = policy
            .execute("fetch_price_data", || {
                services.source.fetch(symbol, range.start, range.end)
            })
            .await?;

        let series = PriceSeries::new(bars)
            .map_err(|e| Error::Validation(format!("data source returned invalid bars for {symbol}: {e}")))?;
        let display_name = services.names.resolve(services.source.as_ref(), symbol).await;

        let artifact = StoredArtifact::raw(ArtifactSummary::new(symbol, &display_name, range, &series), series);
        let payload = artifact.summary_json();
        let empty = artifact.series.is_empty();
        let outcome = services.store.put(artifact).await;

        info!(
            identifier = %outcome.identifier,
            rows = payload["row_count"].as_u64().unwrap_or_default(),
            "Stored price data"
        );

        Ok(with_flags(payload, empty, outcome.existing))
    }
}

fn with_flags(mut payload: Value, empty: bool, cached: bool) -> Value {
    payload["cached"] = json!(cached);
    if empty {
        payload["empty"] = json!(true);
        payload["note"] = json!(
            "No bars in this range: it may contain no trading days, or the security may be suspended or delisted. Try a wider range."
        );
    }
    payload
}

#[async_trait]
impl Tool for FetchPriceDataTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: FetchParams = serde_json::from_value(params)
            .map_err(|e| Error::Validation(format!("Invalid parameters: {e}")))?;
        self.fetch(params).await
    }

    fn name(&self) -> &str {
        "fetch_price_data"
    }

    fn description(&self) -> &str {
        "Fetch daily OHLCV price history for a six-digit A-share or ETF code and store it. \
         Returns an identifier to pass to compute_indicators or render_chart, plus a summary \
         (row count, date range, latest close, period change, price range). \
         Use `days` for a look-back window, or both `start_date` and `end_date`."
    }

    fn input_schema(&self) -> Value {
        object(
            json!({
                "symbol": pattern_string("^[0-9]{6}$", Some("Six-digit security code, e.g. 600519")),
                "days": bounded_integer(1, 3650, Some("Calendar days to look back from today (default 60)")),
                "start_date": pattern_string(DATE_PATTERN, Some("Range start, YYYYMMDD or YYYY-MM-DD")),
                "end_date": pattern_string(DATE_PATTERN, Some("Range end, YYYYMMDD or YYYY-MM-DD")),
            }),
            &["symbol"],
        )
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "identifier": { "type": "string" },
                "symbol": { "type": "string" },
                "row_count": { "type": "integer", "minimum": 0 },
                "cached": { "type": "boolean" },
            },
            "required": ["identifier", "symbol", "row_count", "cached"],
        })
    }
}
