//! Error types for market data operations

use finagent_indicators::SeriesError;
use thiserror::Error;

/// Market data specific errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// Transport failure talking to the data source
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the data source
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The data source does not know the symbol
    #[error("Unknown symbol: {0}")]
    SymbolNotFound(String),

    /// A row of the upstream payload could not be decoded
    #[error("Malformed row '{row}': {reason}")]
    MalformedRow { row: String, reason: String },

    /// JSON decoding error on an upstream payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bars violate the price-series invariants
    #[error("Invalid price series: {0}")]
    InvalidSeries(#[from] SeriesError),

    /// Chart output could not be written
    #[error("Chart output error: {0}")]
    Output(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for market operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<MarketError> for finagent_core::Error {
    fn from(err: MarketError) -> Self {
        use finagent_core::Error;
        match err {
            MarketError::SymbolNotFound(symbol) => Error::NotFound(format!("unknown symbol {symbol}")),
            MarketError::Upstream { status: 404, message } => Error::NotFound(message),
            MarketError::InvalidSeries(e) => Error::Validation(e.to_string()),
            MarketError::Output(e) => Error::Render(e.to_string()),
            MarketError::Config(msg) => Error::Config(msg),
            other @ (MarketError::Http(_)
            | MarketError::Upstream { .. }
            | MarketError::MalformedRow { .. }
            | MarketError::Json(_)) => Error::Network(other.to_string()),
        }
    }
}
