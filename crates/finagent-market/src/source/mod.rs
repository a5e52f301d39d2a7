//! Data source collaborator and calendar clock

pub mod eastmoney;

pub use eastmoney::EastMoneyClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use finagent_core::Result;
use finagent_indicators::Bar;
use serde::{Deserialize, Serialize};

/// Provider of daily OHLCV bars
///
/// `fetch` returns rows sorted ascending by date. An empty vector for a
/// valid symbol with no trading activity in range is not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Daily bars for `symbol` between `start` and `end`, both inclusive
    async fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>>;

    /// Human-readable security name, if the source knows one
    async fn display_name(&self, symbol: &str) -> Result<Option<String>>;
}

/// Source of "today" for resolving relative date ranges
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Kind of listed security, inferred from its code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    Stock,
    Etf,
}

impl InstrumentType {
    /// Exchange-traded funds use codes starting with `5` (Shanghai) or `15` (Shenzhen)
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol.starts_with('5') || symbol.starts_with("15") {
            Self::Etf
        } else {
            Self::Stock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_type() {
        assert_eq!(InstrumentType::from_symbol("600519"), InstrumentType::Stock);
        assert_eq!(InstrumentType::from_symbol("000001"), InstrumentType::Stock);
        assert_eq!(InstrumentType::from_symbol("510300"), InstrumentType::Etf);
        assert_eq!(InstrumentType::from_symbol("159915"), InstrumentType::Etf);
        assert_eq!(InstrumentType::from_symbol("300750"), InstrumentType::Stock);
    }

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }
}
