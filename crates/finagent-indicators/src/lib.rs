//! Technical indicator engine
//!
//! Pure functions over a validated [`PriceSeries`]. Every derived column is
//! aligned index-for-index with its source series; positions without enough
//! history are `None` instead of being computed from a short window.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use finagent_indicators::{Bar, PriceSeries, add_all_indicators};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let bars = (0..30_u32)
//!     .map(|i| {
//!         let close = 100.0 + f64::from(i);
//!         Bar::new(start + chrono::Days::new(i.into()), close, close + 1.0, close - 1.0, close, 1_000.0)
//!     })
//!     .collect();
//! let series = PriceSeries::new(bars).unwrap();
//!
//! let set = add_all_indicators(&series);
//! assert_eq!(set.len(), 30);
//! assert_eq!(set.get("ma_5").unwrap()[3], None);
//! assert_eq!(set.get("ma_5").unwrap()[4], Some(102.0));
//! ```

pub mod all;
pub mod bollinger;
pub mod error;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod series;
pub mod set;
pub mod signals;

pub use all::{DEFAULT_COLUMNS, IndicatorParams, add_all_indicators, add_indicators};
pub use bollinger::{BollingerBands, bollinger_bands};
pub use error::{Result, SeriesError};
pub use macd::{Macd, ema, macd};
pub use moving_average::{moving_average, sma, volume_moving_average};
pub use rsi::rsi;
pub use series::{Bar, PriceSeries};
pub use set::{Column, IndicatorSet};
pub use signals::{CrossSignal, RsiZone, Signals};
