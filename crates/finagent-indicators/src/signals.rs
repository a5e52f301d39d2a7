//! Trading-signal interpretation of the latest bar

use crate::{IndicatorSet, PriceSeries};
use serde::Serialize;

/// Direction of a line crossing on the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossSignal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

/// Signals read off the last two bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Signals {
    /// MACD line crossing its signal line
    pub macd_cross: CrossSignal,
    /// RSI 14 above 70 or below 30
    pub rsi_signal: RsiZone,
    /// Close crossing the 20-day moving average
    pub ma_cross: CrossSignal,
}

impl Signals {
    /// Interpret `set` for `series`; undefined inputs give `Hold`/`Neutral`
    pub fn latest(series: &PriceSeries, set: &IndicatorSet) -> Self {
        let closes = series.closes();
        let close_now = closes.last().copied();
        let close_prev = closes.len().checked_sub(2).map(|i| closes[i]);

        let macd_cross = cross(
            (set.previous("macd"), set.previous("macd_signal")),
            (set.latest("macd"), set.latest("macd_signal")),
        );
        let ma_cross = cross(
            (close_prev, set.previous("ma_20")),
            (close_now, set.latest("ma_20")),
        );
        let rsi_signal = match set.latest("rsi_14") {
            Some(v) if v > 70.0 => RsiZone::Overbought,
            Some(v) if v < 30.0 => RsiZone::Oversold,
            _ => RsiZone::Neutral,
        };

        Self {
            macd_cross,
            rsi_signal,
            ma_cross,
        }
    }
}

type Pair = (Option<f64>, Option<f64>);

fn cross(previous: Pair, current: Pair) -> CrossSignal {
    let (Some(line_prev), Some(ref_prev)) = previous else {
        return CrossSignal::Hold;
    };
    let (Some(line), Some(reference)) = current else {
        return CrossSignal::Hold;
    };

    if line > reference && line_prev <= ref_prev {
        CrossSignal::Buy
    } else if line < reference && line_prev >= ref_prev {
        CrossSignal::Sell
    } else {
        CrossSignal::Hold
    }
}
