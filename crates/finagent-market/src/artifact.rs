//! Stored artifacts and their deterministic identifiers

use crate::source::InstrumentType;
use crate::tools::round_to;
use chrono::NaiveDate;
use finagent_indicators::{IndicatorSet, PriceSeries};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Suffix marking an enriched identifier
pub const ENRICHED_SUFFIX: &str = ":e";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Raw,
    Enriched,
}

/// Inclusive calendar range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Identifier of the raw artifact for a symbol and resolved range
pub fn raw_identifier(symbol: &str, range: DateRange) -> String {
    format!(
        "{symbol}:{}:{}",
        range.start.format("%Y%m%d"),
        range.end.format("%Y%m%d")
    )
}

/// Identifier of the enriched view of a raw artifact
pub fn enriched_identifier(raw: &str) -> String {
    format!("{raw}{ENRICHED_SUFFIX}")
}

/// Identifier for `(symbol, range, kind)`
pub fn identifier_for(symbol: &str, range: DateRange, kind: ArtifactKind) -> String {
    let raw = raw_identifier(symbol, range);
    match kind {
        ArtifactKind::Raw => raw,
        ArtifactKind::Enriched => enriched_identifier(&raw),
    }
}

/// Metadata kept next to a stored series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSummary {
    pub symbol: String,
    pub display_name: String,
    pub instrument: InstrumentType,
    /// Resolved request range the identifier is derived from
    pub requested: DateRange,
    pub row_count: usize,
    /// First and last bar dates, absent for an empty series
    pub date_range: Option<DateRange>,
    pub latest_close: Option<f64>,
}

impl ArtifactSummary {
    pub fn new(symbol: &str, display_name: &str, requested: DateRange, series: &PriceSeries) -> Self {
        let date_range = series
            .first()
            .zip(series.last())
            .map(|(first, last)| DateRange::new(first.date, last.date));
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            instrument: InstrumentType::from_symbol(symbol),
            requested,
            row_count: series.len(),
            date_range,
            latest_close: series.last().map(|b| b.close),
        }
    }
}

/// One entry of the artifact store
///
/// The series is shared between a raw artifact and its enriched view; the
/// enriched view only adds the indicator set.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub identifier: String,
    pub kind: ArtifactKind,
    pub series: Arc<PriceSeries>,
    pub indicators: Option<Arc<IndicatorSet>>,
    pub summary: ArtifactSummary,
}

impl StoredArtifact {
    /// Raw artifact for a freshly fetched series
    pub fn raw(summary: ArtifactSummary, series: PriceSeries) -> Self {
        Self {
            identifier: raw_identifier(&summary.symbol, summary.requested),
            kind: ArtifactKind::Raw,
            series: Arc::new(series),
            indicators: None,
            summary,
        }
    }

    /// Enriched view of this artifact carrying `indicators`
    pub fn enriched(&self, indicators: IndicatorSet) -> Self {
        Self {
            identifier: identifier_for(&self.summary.symbol, self.summary.requested, ArtifactKind::Enriched),
            kind: ArtifactKind::Enriched,
            series: Arc::clone(&self.series),
            indicators: Some(Arc::new(indicators)),
            summary: self.summary.clone(),
        }
    }

    /// Summary payload handed to the reasoning step
    ///
    /// Includes the period change and price range computed from the series.
    pub fn summary_json(&self) -> Value {
        let s = &self.summary;
        let period_change_pct = match (self.series.first(), self.series.last()) {
            (Some(first), Some(last)) if first.close != 0.0 => {
                Some(round_to((last.close - first.close) / first.close * 100.0, 2))
            }
            _ => None,
        };
        json!({
            "identifier": self.identifier,
            "kind": self.kind,
            "symbol": s.symbol,
            "display_name": s.display_name,
            "instrument": s.instrument,
            "row_count": s.row_count,
            "requested_range": s.requested,
            "date_range": s.date_range,
            "latest_close": s.latest_close,
            "period_change_pct": period_change_pct,
            "price_range": {
                "min_low": self.series.min_low(),
                "max_high": self.series.max_high(),
            },
        })
    }
}
