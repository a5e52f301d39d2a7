//! Simple moving averages

use crate::{Column, PriceSeries};

/// Trailing arithmetic mean over `window` values
///
/// The first `window - 1` positions are `None`; a window of zero or longer
/// than the input yields an all-`None` column. Every window is summed from
/// scratch so a position's value depends only on its own window.
pub fn sma(values: &[f64], window: usize) -> Column {
    if window == 0 || window > values.len() {
        return vec![None; values.len()];
    }

    let mut out = vec![None; window - 1];
    out.extend(
        values
            .windows(window)
            .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
    );
    out
}

/// Moving average of closing prices
pub fn moving_average(series: &PriceSeries, window: usize) -> Column {
    sma(&series.closes(), window)
}

/// Moving average of traded volume
pub fn volume_moving_average(series: &PriceSeries, window: usize) -> Column {
    sma(&series.volumes(), window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_prefix_is_window_minus_one() {
        let values: Vec<f64> = (1..=30).map(f64::from).collect();
        for window in [1, 5, 10, 20, 30] {
            let column = sma(&values, window);
            assert_eq!(column.len(), values.len());
            let undefined = column.iter().take_while(|v| v.is_none()).count();
            assert_eq!(undefined, window - 1, "window {window}");
            assert!(column[window - 1..].iter().all(Option::is_some));
        }
    }

    #[test]
    fn test_values() {
        let column = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(column, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_short_input_is_all_undefined() {
        assert_eq!(sma(&[1.0, 2.0], 5), vec![None, None]);
        assert_eq!(sma(&[1.0, 2.0], 0), vec![None, None]);
        assert!(sma(&[], 5).is_empty());
    }
}
