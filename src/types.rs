// =============================================================================
// Shared types used across the stock-lens dashboard backend
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

// ---------------------------------------------------------------------------
// PriceSeries
// ---------------------------------------------------------------------------

/// Daily bars in ascending date order with no duplicate dates.
///
/// Non-trading days are simply absent. The series cannot be mutated once
/// built; every derived computation reads it through [`PriceSeries::bars`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars in any order. Bars are sorted by date; two
    /// bars sharing a date are rejected.
    pub fn from_bars(mut bars: Vec<PriceBar>) -> Result<Self, LookupError> {
        bars.sort_by_key(|b| b.date);
        if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(LookupError::Upstream(format!(
                "duplicate bar for {}",
                w[0].date
            )));
        }
        Ok(Self { bars })
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

// ---------------------------------------------------------------------------
// Date ranges
// ---------------------------------------------------------------------------

/// Inclusive calendar-date window for a price query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `(YYYYMMDD, YYYYMMDD)` as expected by the daily chart endpoint.
    pub fn to_compact(&self) -> (String, String) {
        (
            self.start.format("%Y%m%d").to_string(),
            self.end.format("%Y%m%d").to_string(),
        )
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Quick-range buttons offered by the dashboard, plus an explicit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangePreset {
    #[serde(rename = "explicit")]
    Explicit,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "MAX")]
    Max,
}

impl Default for RangePreset {
    fn default() -> Self {
        Self::YearToDate
    }
}

impl std::fmt::Display for RangePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::OneMonth => write!(f, "1M"),
            Self::ThreeMonths => write!(f, "3M"),
            Self::SixMonths => write!(f, "6M"),
            Self::YearToDate => write!(f, "YTD"),
            Self::OneYear => write!(f, "1Y"),
            Self::ThreeYears => write!(f, "3Y"),
            Self::Max => write!(f, "MAX"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar::new(date, close, close, close, close, 1_000)
    }

    #[test]
    fn from_bars_sorts_ascending() {
        let series = PriceSeries::from_bars(vec![
            bar(d(2024, 1, 3), 3.0),
            bar(d(2024, 1, 2), 2.0),
            bar(d(2024, 1, 5), 5.0),
        ])
        .unwrap();
        assert_eq!(series.closes(), vec![2.0, 3.0, 5.0]);
        assert_eq!(series.first().unwrap().date, d(2024, 1, 2));
        assert_eq!(series.last().unwrap().date, d(2024, 1, 5));
    }

    #[test]
    fn from_bars_rejects_duplicate_dates() {
        let err = PriceSeries::from_bars(vec![
            bar(d(2024, 1, 2), 2.0),
            bar(d(2024, 1, 2), 2.5),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("2024-01-02"));
    }

    #[test]
    fn compact_range_format() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 7, 15));
        assert_eq!(
            range.to_compact(),
            ("20240101".to_string(), "20240715".to_string())
        );
    }

    #[test]
    fn preset_labels_match_serde() {
        for preset in [
            RangePreset::Explicit,
            RangePreset::OneMonth,
            RangePreset::YearToDate,
            RangePreset::ThreeYears,
            RangePreset::Max,
        ] {
            let json = serde_json::to_string(&preset).unwrap();
            assert_eq!(json, format!("\"{preset}\""));
        }
        let parsed: RangePreset = serde_json::from_str("\"6M\"").unwrap();
        assert_eq!(parsed, RangePreset::SixMonths);
    }
}
