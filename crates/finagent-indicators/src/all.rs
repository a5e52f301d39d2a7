//! The default indicator set computed in one pass

use crate::bollinger::bands_around;
use crate::macd::macd_of;
use crate::moving_average::sma;
use crate::rsi::rsi_of;
use crate::{IndicatorSet, PriceSeries, Result};

/// Parameters of the indicator set
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    /// Close moving-average windows, emitted as `ma_<w>`
    pub ma_windows: Vec<usize>,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Emitted as `rsi_<period>`
    pub rsi_period: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    /// Volume moving-average windows, emitted as `vol_ma_<w>`
    pub volume_windows: Vec<usize>,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 10, 20, 60],
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            bollinger_window: 20,
            bollinger_k: 2.0,
            volume_windows: vec![5, 10],
        }
    }
}

impl IndicatorParams {
    /// Default parameters plus extra close moving-average windows
    pub fn with_extra_ma_windows(extra: &[usize]) -> Self {
        let mut params = Self::default();
        for &w in extra {
            if !params.ma_windows.contains(&w) {
                params.ma_windows.push(w);
            }
        }
        params.ma_windows.sort_unstable();
        params
    }
}

/// Compute the full default set: MA 5/10/20/60, MACD 12/26/9, RSI 14,
/// Bollinger 20/2 and volume MA 5/10
///
/// Output is identical to calling each indicator function on its own.
pub fn add_all_indicators(series: &PriceSeries) -> IndicatorSet {
    let params = IndicatorParams::default();
    // Columns are built from the series length, so alignment cannot fail.
    add_indicators(series, &params).unwrap_or_else(|_| IndicatorSet::new(series.len()))
}

/// Compute the indicator set described by `params`
///
/// Closing prices are extracted once; the Bollinger middle band reuses the
/// matching moving-average column when one was requested.
pub fn add_indicators(series: &PriceSeries, params: &IndicatorParams) -> Result<IndicatorSet> {
    let closes = series.closes();
    let volumes = series.volumes();
    let mut set = IndicatorSet::new(series.len());

    for &window in &params.ma_windows {
        set.insert(format!("ma_{window}"), sma(&closes, window))?;
    }

    let macd = macd_of(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
    set.insert("macd", macd.macd)?;
    set.insert("macd_signal", macd.signal)?;
    set.insert("macd_hist", macd.histogram)?;

    set.insert(format!("rsi_{}", params.rsi_period), rsi_of(&closes, params.rsi_period))?;

    let middle = set
        .get(&format!("ma_{}", params.bollinger_window))
        .cloned()
        .unwrap_or_else(|| sma(&closes, params.bollinger_window));
    let bands = bands_around(&closes, middle, params.bollinger_window, params.bollinger_k);
    set.insert("bb_upper", bands.upper)?;
    set.insert("bb_middle", bands.middle)?;
    set.insert("bb_lower", bands.lower)?;

    for &window in &params.volume_windows {
        set.insert(format!("vol_ma_{window}"), sma(&volumes, window))?;
    }

    Ok(set)
}

/// Column names produced by the default set
pub const DEFAULT_COLUMNS: [&str; 13] = [
    "ma_5",
    "ma_10",
    "ma_20",
    "ma_60",
    "macd",
    "macd_signal",
    "macd_hist",
    "rsi_14",
    "bb_upper",
    "bb_middle",
    "bb_lower",
    "vol_ma_5",
    "vol_ma_10",
];
