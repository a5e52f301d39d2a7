//! Chart dispatch: pick a chart composition and check its indicator needs
//!
//! Rendering itself is delegated to a [`ChartRenderer`].

pub mod renderer;

pub use renderer::{ChartRenderer, JsonChartRenderer};
#[cfg(test)]
pub use renderer::MockChartRenderer;

use crate::artifact::StoredArtifact;
use crate::config::ChartStyle;
use finagent_core::{Error, Result};
use finagent_indicators::IndicatorSet;
use serde::{Deserialize, Serialize};

/// Moving-average overlay candidates, in drawing order
const MA_OVERLAYS: [&str; 4] = ["ma_5", "ma_10", "ma_20", "ma_60"];
const MA_ANY_OF: [&str; 3] = ["ma_5", "ma_20", "ma_60"];
const MACD_COLUMNS: [&str; 3] = ["macd", "macd_signal", "macd_hist"];
const COMPREHENSIVE_COLUMNS: [&str; 6] = ["ma_5", "ma_20", "macd", "macd_signal", "macd_hist", "rsi_14"];
const BOLLINGER_COLUMNS: [&str; 3] = ["bb_upper", "bb_middle", "bb_lower"];

/// RSI overbought / oversold reference lines
pub const RSI_REFERENCE_LINES: [f64; 2] = [30.0, 70.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartVariant {
    Basic,
    MovingAverages,
    Macd,
    Comprehensive,
    /// Richest variant the artifact's indicators allow
    Auto,
}

impl ChartVariant {
    pub const ALL: [ChartVariant; 5] = [
        Self::Basic,
        Self::MovingAverages,
        Self::Macd,
        Self::Comprehensive,
        Self::Auto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::MovingAverages => "moving_averages",
            Self::Macd => "macd",
            Self::Comprehensive => "comprehensive",
            Self::Auto => "auto",
        }
    }

    /// Columns this variant is missing in `indicators`, empty when satisfied
    pub fn missing_columns(self, indicators: Option<&IndicatorSet>) -> Vec<String> {
        let has = |name: &str| indicators.is_some_and(|set| set.contains(name));
        let missing_of = |names: &[&str]| -> Vec<String> {
            names.iter().filter(|&&n| !has(n)).map(|&n| n.to_string()).collect()
        };

        match self {
            Self::Basic | Self::Auto => Vec::new(),
            Self::MovingAverages => {
                if MA_ANY_OF.iter().any(|&n| has(n)) {
                    Vec::new()
                } else {
                    missing_of(&MA_ANY_OF)
                }
            }
            Self::Macd => missing_of(&MACD_COLUMNS),
            Self::Comprehensive => missing_of(&COMPREHENSIVE_COLUMNS),
        }
    }

    /// Concrete variant to draw, failing with `MissingIndicator` when the
    /// requested variant needs columns the artifact lacks
    pub fn resolve(self, indicators: Option<&IndicatorSet>) -> Result<ChartVariant> {
        if self == Self::Auto {
            let resolved = [Self::Comprehensive, Self::Macd, Self::MovingAverages]
                .into_iter()
                .find(|v| v.missing_columns(indicators).is_empty())
                .unwrap_or(Self::Basic);
            return Ok(resolved);
        }

        let missing = self.missing_columns(indicators);
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(Error::MissingIndicator {
                variant: self.as_str().to_string(),
                missing,
            })
        }
    }
}

impl std::fmt::Display for ChartVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChartVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown chart variant '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// Candlesticks plus price overlays
    Price,
    Volume,
    Macd,
    Rsi,
}

/// One stacked panel of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    /// Indicator columns drawn in this panel
    pub series: Vec<String>,
    /// Horizontal reference lines
    pub reference_lines: Vec<f64>,
}

impl Panel {
    fn new(kind: PanelKind, series: Vec<String>) -> Self {
        Self {
            kind,
            series,
            reference_lines: Vec::new(),
        }
    }
}

/// Decorated chart description handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPlan {
    pub title: String,
    pub variant: ChartVariant,
    pub style: ChartStyle,
    pub panels: Vec<Panel>,
}

impl ChartPlan {
    /// Every indicator column referenced by some panel
    pub fn columns(&self) -> Vec<&str> {
        self.panels
            .iter()
            .flat_map(|p| p.series.iter().map(String::as_str))
            .collect()
    }
}

/// Build the chart plan for `artifact` in `requested` variant
///
/// Columns that exist but carry no defined value are left out of the
/// panels.
pub fn plan_chart(artifact: &StoredArtifact, requested: ChartVariant, style: ChartStyle) -> Result<ChartPlan> {
    let indicators = artifact.indicators.as_deref();
    let variant = requested.resolve(indicators)?;

    let drawable = |names: &[&str]| -> Vec<String> {
        names
            .iter()
            .filter(|&&n| indicators.is_some_and(|set| set.has_values(n)))
            .map(|&n| n.to_string())
            .collect()
    };

    let price = |with_bands: bool| {
        let mut overlays = drawable(&MA_OVERLAYS);
        if with_bands {
            overlays.extend(drawable(&BOLLINGER_COLUMNS));
        }
        Panel::new(PanelKind::Price, overlays)
    };

    let panels = match variant {
        ChartVariant::Basic | ChartVariant::Auto => vec![
            Panel::new(PanelKind::Price, Vec::new()),
            Panel::new(PanelKind::Volume, Vec::new()),
        ],
        ChartVariant::MovingAverages => vec![price(false), Panel::new(PanelKind::Volume, Vec::new())],
        ChartVariant::Macd => vec![price(false), Panel::new(PanelKind::Macd, drawable(&MACD_COLUMNS))],
        ChartVariant::Comprehensive => {
            let mut rsi = Panel::new(PanelKind::Rsi, drawable(&["rsi_14"]));
            rsi.reference_lines = RSI_REFERENCE_LINES.to_vec();
            vec![
                price(true),
                Panel::new(PanelKind::Volume, Vec::new()),
                Panel::new(PanelKind::Macd, drawable(&MACD_COLUMNS)),
                rsi,
            ]
        }
    };

    Ok(ChartPlan {
        title: format!(
            "{}({}) technical analysis",
            artifact.summary.display_name, artifact.summary.symbol
        ),
        variant,
        style,
        panels,
    })
}
