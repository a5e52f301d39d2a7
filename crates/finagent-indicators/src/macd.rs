//! Exponential moving averages and MACD

use crate::{Column, PriceSeries};

/// Exponential moving average with smoothing `k = 2 / (period + 1)`
///
/// Seeded by the simple average of the first `period` values at index
/// `period - 1`; earlier positions are `None`. The recurrence is evaluated as
/// `prev + k * (value - prev)`, which equals `value * k + prev * (1 - k)` and
/// keeps a constant input exactly constant.
pub fn ema(values: &[f64], period: usize) -> Column {
    if period == 0 || period > values.len() {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = vec![None; period - 1];
    out.push(Some(seed));

    let mut prev = seed;
    for &value in &values[period..] {
        prev += k * (value - prev);
        out.push(Some(prev));
    }
    out
}

/// EMA over the defined tail of a column
///
/// Leading `None`s are carried through; the EMA starts at the first defined
/// value. Any gap after that ends the defined run.
fn ema_of_column(column: &Column, period: usize) -> Column {
    let start = column.iter().position(Option::is_some).unwrap_or(column.len());
    let defined: Vec<f64> = column[start..].iter().map_while(|v| *v).collect();

    let mut out = vec![None; start];
    out.extend(ema(&defined, period));
    out.resize(column.len(), None);
    out
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Column,
    pub signal: Column,
    pub histogram: Column,
}

/// MACD over closing prices
///
/// `macd = ema(fast) - ema(slow)` is defined from index `slow - 1`, the
/// signal line from index `slow + signal - 2`.
pub fn macd(series: &PriceSeries, fast: usize, slow: usize, signal: usize) -> Macd {
    macd_of(&series.closes(), fast, slow, signal)
}

pub(crate) fn macd_of(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let line: Column = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal_line = ema_of_column(&line, signal);
    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    Macd {
        macd: line,
        signal: signal_line,
        histogram,
    }
}
