//! Bollinger Bands

use crate::moving_average::sma;
use crate::{Column, PriceSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Column,
    pub middle: Column,
    pub lower: Column,
}

/// Bands at `middle ± k * std` over a trailing `window`
///
/// `std` is the sample standard deviation (n - 1 denominator); a window of
/// one has deviation zero.
pub fn bollinger_bands(series: &PriceSeries, window: usize, k: f64) -> BollingerBands {
    let closes = series.closes();
    let middle = sma(&closes, window);
    bands_around(&closes, middle, window, k)
}

/// Bands around an already computed moving average of `closes`
pub(crate) fn bands_around(closes: &[f64], middle: Column, window: usize, k: f64) -> BollingerBands {
    let mut upper = vec![None; closes.len()];
    let mut lower = vec![None; closes.len()];

    for (i, mean) in middle.iter().enumerate() {
        let Some(mean) = *mean else { continue };
        let std = sample_std(&closes[i + 1 - window..=i], mean);
        upper[i] = Some(mean + k * std);
        lower[i] = Some(mean - k * std);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

fn sample_std(window: &[f64], mean: f64) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (window.len() - 1) as f64).sqrt()
}
