//! Market data tools for the analysis agent
//!
//! This crate turns daily price history into artifacts the orchestration loop
//! can reference by identifier:
//!
//! - `fetch_price_data` downloads OHLCV bars from East Money and stores them
//! - `compute_indicators` attaches moving averages, MACD, RSI and Bollinger
//!   bands, producing an enriched artifact
//! - `render_chart` draws a stored artifact in one of the chart variants
//!
//! Artifacts live in a capacity-bounded [`ArtifactStore`]; evicted
//! identifiers fail with a stale-reference error instead of not-found.
//!
//! # Example
//!
//! ```rust,ignore
//! use finagent_market::{MarketConfig, MarketServices, default_registry};
//!
//! let services = MarketServices::live(MarketConfig::default())?;
//! let registry = default_registry(&services)?;
//! ```

pub mod artifact;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod source;
pub mod store;
pub mod tools;

pub use artifact::{ArtifactKind, ArtifactSummary, DateRange, StoredArtifact};
pub use chart::{ChartPlan, ChartRenderer, ChartVariant, JsonChartRenderer, plan_chart};
pub use config::{ChartStyle, MarketConfig, PriceAdjustment};
pub use error::{MarketError, Result};
pub use source::{Clock, DataSource, EastMoneyClient, FixedClock, InstrumentType, SystemClock};
pub use store::{ArtifactStore, PutOutcome};
pub use tools::{
    ComputeIndicatorsTool, FetchPriceDataTool, MarketServices, RenderChartTool, default_registry,
};
