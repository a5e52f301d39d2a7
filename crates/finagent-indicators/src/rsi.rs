//! Relative Strength Index with Wilder smoothing

use crate::{Column, PriceSeries};

/// RSI over closing prices
///
/// The first average gain/loss is the plain mean of the first `period`
/// close-to-close changes, placed at index `period`. Later averages use
/// Wilder's smoothing `avg = (prev * (period - 1) + current) / period`.
/// When the average loss is zero the RSI is 100.
pub fn rsi(series: &PriceSeries, period: usize) -> Column {
    rsi_of(&series.closes(), period)
}

pub(crate) fn rsi_of(closes: &[f64], period: usize) -> Column {
    let n = closes.len();
    if period == 0 || n <= period {
        return vec![None; n];
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let p = period as f64;
    let mut avg_gain = changes[..period].iter().copied().map(gain).sum::<f64>() / p;
    let mut avg_loss = changes[..period].iter().copied().map(loss).sum::<f64>() / p;

    let mut out = vec![None; period];
    out.push(Some(index(avg_gain, avg_loss)));

    for &change in &changes[period..] {
        avg_gain = (avg_gain * (p - 1.0) + gain(change)) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss(change)) / p;
        out.push(Some(index(avg_gain, avg_loss)));
    }
    out
}

fn index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
