//! Price bars and the validated series they form

use crate::{Result, SeriesError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated OHLCV record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn check(&self) -> Result<()> {
        let fail = |reason: String| SeriesError::InconsistentBar {
            date: self.date,
            reason,
        };

        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(fail("non-finite value".to_string()));
        }
        if self.volume < 0.0 {
            return Err(fail(format!("negative volume {}", self.volume)));
        }
        if self.high < self.open.max(self.close) {
            return Err(fail(format!(
                "high {} below max(open, close) {}",
                self.high,
                self.open.max(self.close)
            )));
        }
        if self.low > self.open.min(self.close) {
            return Err(fail(format!(
                "low {} above min(open, close) {}",
                self.low,
                self.open.min(self.close)
            )));
        }
        Ok(())
    }
}

/// Ordered, validated sequence of bars
///
/// Dates are strictly increasing and every bar satisfies
/// `high >= max(open, close) >= min(open, close) >= low` with a
/// non-negative volume. The series is immutable once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Validate `bars` and build a series
    ///
    /// The first violation found, in date order, is returned.
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for bar in &bars {
            bar.check()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::UnorderedDates {
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Lowest low over the series
    pub fn min_low(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.low).reduce(f64::min)
    }

    /// Highest high over the series
    pub fn max_high(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.high).reduce(f64::max)
    }
}
