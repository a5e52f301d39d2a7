//! Configuration for market data, the artifact store and chart output

use crate::error::{MarketError, Result};
use finagent_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default East Money quote endpoint
pub const EASTMONEY_BASE_URL: &str = "https://push2his.eastmoney.com";

/// Price adjustment applied by the data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceAdjustment {
    /// Raw prices
    None,
    /// Forward adjusted (qfq)
    #[default]
    Qfq,
    /// Backward adjusted (hfq)
    Hfq,
}

impl PriceAdjustment {
    /// Value of the upstream `fqt` query parameter
    pub fn fqt(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Qfq => 1,
            Self::Hfq => 2,
        }
    }
}

impl std::str::FromStr for PriceAdjustment {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "qfq" => Ok(Self::Qfq),
            "hfq" => Ok(Self::Hfq),
            other => Err(MarketError::Config(format!("unknown price adjustment '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    #[default]
    Dark,
    Light,
}

impl ChartStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Configuration for market operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Maximum number of artifacts held by the store
    pub store_capacity: usize,

    /// Bound on a single data-source request
    pub fetch_timeout: Duration,

    /// Attempts per data-source request, including the first
    pub max_attempts: u32,

    /// Backoff before the first retry
    pub retry_backoff_base: Duration,

    /// Upper bound for any retry backoff
    pub retry_backoff_max: Duration,

    /// Data-source requests allowed per second
    pub requests_per_second: u32,

    /// Directory chart documents are written to
    pub output_dir: PathBuf,

    /// Price adjustment requested from the data source
    pub adjustment: PriceAdjustment,

    /// Lifetime of cached display names
    pub name_cache_ttl: Duration,

    pub chart_style: ChartStyle,

    /// Data-source base URL
    pub base_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            store_capacity: 32,
            fetch_timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_backoff_base: Duration::from_millis(500),
            retry_backoff_max: Duration::from_secs(8),
            requests_per_second: 5,
            output_dir: PathBuf::from("outputs"),
            adjustment: PriceAdjustment::Qfq,
            name_cache_ttl: Duration::from_secs(3600),
            chart_style: ChartStyle::Dark,
            base_url: EASTMONEY_BASE_URL.to_string(),
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Apply `FINAGENT_STORE_CAPACITY` and `FINAGENT_OUTPUT_DIR` if set
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var("FINAGENT_STORE_CAPACITY") {
            self.store_capacity = raw.trim().parse().map_err(|_| {
                MarketError::Config(format!("FINAGENT_STORE_CAPACITY must be a positive integer, got '{raw}'"))
            })?;
        }
        if let Ok(dir) = std::env::var("FINAGENT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.store_capacity == 0 {
            return Err(MarketError::Config(
                "store_capacity must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(MarketError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.requests_per_second == 0 {
            return Err(MarketError::Config(
                "requests_per_second must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout.is_zero() {
            return Err(MarketError::Config(
                "fetch_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Retry policy for data-source requests
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.retry_backoff_base,
            self.retry_backoff_max,
            2.0,
        )
        .with_attempt_timeout(self.fetch_timeout)
    }
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    store_capacity: Option<usize>,
    fetch_timeout: Option<Duration>,
    max_attempts: Option<u32>,
    retry_backoff_base: Option<Duration>,
    retry_backoff_max: Option<Duration>,
    requests_per_second: Option<u32>,
    output_dir: Option<PathBuf>,
    adjustment: Option<PriceAdjustment>,
    name_cache_ttl: Option<Duration>,
    chart_style: Option<ChartStyle>,
    base_url: Option<String>,
}

impl MarketConfigBuilder {
    pub fn store_capacity(mut self, capacity: usize) -> Self {
        self.store_capacity = Some(capacity);
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    pub fn retry_backoff_max(mut self, duration: Duration) -> Self {
        self.retry_backoff_max = Some(duration);
        self
    }

    pub fn requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = Some(rps);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn adjustment(mut self, adjustment: PriceAdjustment) -> Self {
        self.adjustment = Some(adjustment);
        self
    }

    pub fn name_cache_ttl(mut self, ttl: Duration) -> Self {
        self.name_cache_ttl = Some(ttl);
        self
    }

    pub fn chart_style(mut self, style: ChartStyle) -> Self {
        self.chart_style = Some(style);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            store_capacity: self.store_capacity.unwrap_or(defaults.store_capacity),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            retry_backoff_base: self.retry_backoff_base.unwrap_or(defaults.retry_backoff_base),
            retry_backoff_max: self.retry_backoff_max.unwrap_or(defaults.retry_backoff_max),
            requests_per_second: self.requests_per_second.unwrap_or(defaults.requests_per_second),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            adjustment: self.adjustment.unwrap_or(defaults.adjustment),
            name_cache_ttl: self.name_cache_ttl.unwrap_or(defaults.name_cache_ttl),
            chart_style: self.chart_style.unwrap_or(defaults.chart_style),
            base_url: self.base_url.unwrap_or(defaults.base_url),
        };

        config.validate()?;
        Ok(config)
    }
}
