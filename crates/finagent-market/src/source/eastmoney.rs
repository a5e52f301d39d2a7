//! East Money daily k-line client

use super::DataSource;
use crate::config::{MarketConfig, PriceAdjustment};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use finagent_indicators::Bar;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const KLINE_PATH: &str = "/api/qt/stock/kline/get";
const DAILY: &str = "101";

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    klines: Vec<String>,
}

/// East Money quote API client
#[derive(Clone)]
pub struct EastMoneyClient {
    client: Client,
    base_url: String,
    adjustment: PriceAdjustment,
    rate_limiter: SharedRateLimiter,
}

impl EastMoneyClient {
    /// Create a client from the market configuration
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let rps = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            MarketError::Config("requests_per_second must be greater than 0".to_string())
        })?;
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent("Mozilla/5.0 (finagent)")
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            adjustment: config.adjustment,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        })
    }

    /// Market-qualified security id: `1.` for Shanghai, `0.` for Shenzhen
    pub fn secid(symbol: &str) -> String {
        let market = if symbol.starts_with(['6', '5', '9']) { 1 } else { 0 };
        format!("{market}.{symbol}")
    }

    async fn request(&self, symbol: &str, begin: &str, end: &str, limit: Option<u32>) -> Result<KlineData> {
        self.rate_limiter.until_ready().await;

        let mut query = vec![
            ("secid", Self::secid(symbol)),
            ("fields1", "f1,f2,f3,f4,f5,f6".to_string()),
            ("fields2", "f51,f52,f53,f54,f55,f56,f57".to_string()),
            ("klt", DAILY.to_string()),
            ("fqt", self.adjustment.fqt().to_string()),
            ("beg", begin.to_string()),
            ("end", end.to_string()),
        ];
        if let Some(lmt) = limit {
            query.push(("lmt", lmt.to_string()));
        }

        let url = format!("{}{KLINE_PATH}", self.base_url);
        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(MarketError::Upstream {
                status: status.as_u16(),
                message: format!("k-line request for {symbol} failed"),
            });
        }

        let text = response.text().await?;
        decode_kline_body(symbol, &text)
    }
}

/// Decode a k-line response body; a body without `data` means the symbol is unknown
fn decode_kline_body(symbol: &str, text: &str) -> Result<KlineData> {
    let body: KlineResponse = serde_json::from_str(text)?;
    body.data
        .ok_or_else(|| MarketError::SymbolNotFound(symbol.to_string()))
}

/// Parse one `date,open,close,high,low,volume,...` k-line row
pub fn parse_kline_row(row: &str) -> Result<Bar> {
    let malformed = |reason: &str| MarketError::MalformedRow {
        row: row.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() < 6 {
        return Err(malformed("expected at least 6 fields"));
    }

    let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d").map_err(|_| malformed("invalid date"))?;
    let number = |i: usize, name: &str| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .map_err(|_| malformed(&format!("invalid {name}")))
    };

    Ok(Bar::new(
        date,
        number(1, "open")?,
        number(3, "high")?,
        number(4, "low")?,
        number(2, "close")?,
        number(5, "volume")?,
    ))
}

#[async_trait]
impl DataSource for EastMoneyClient {
    #[instrument(skip(self), fields(source = "eastmoney"))]
    async fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> finagent_core::Result<Vec<Bar>> {
        let data = self
            .request(
                symbol,
                &start.format("%Y%m%d").to_string(),
                &end.format("%Y%m%d").to_string(),
                None,
            )
            .await?;

        let bars = data
            .klines
            .iter()
            .map(|row| parse_kline_row(row))
            .collect::<Result<Vec<_>>>()?;

        debug!(symbol, rows = bars.len(), "Fetched k-lines");
        Ok(bars)
    }

    #[instrument(skip(self), fields(source = "eastmoney"))]
    async fn display_name(&self, symbol: &str) -> finagent_core::Result<Option<String>> {
        let data = self.request(symbol, "0", "20500101", Some(1)).await?;
        Ok(data.name.filter(|n| !n.trim().is_empty()))
    }
}
