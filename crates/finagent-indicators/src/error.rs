//! Errors raised while building series and indicator sets

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeriesError>;

/// Violations of the price-series and alignment invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("bar dates must be strictly increasing: {current} follows {previous}")]
    UnorderedDates {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("inconsistent prices on {date}: {reason}")]
    InconsistentBar { date: NaiveDate, reason: String },

    #[error("column '{name}' has {actual} entries, expected {expected}")]
    Misaligned {
        name: String,
        expected: usize,
        actual: usize,
    },
}
