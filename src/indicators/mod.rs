// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators shown on the
// dashboard. Per-bar values are `Option<f64>`: `None` marks a bar without
// enough history and is never replaced by zero.

pub mod returns;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::types::{PriceBar, PriceSeries};

pub use returns::{summarize_returns, ReturnSummary};
pub use rsi::RsiZone;

/// Look-back used for the RSI column.
pub const RSI_PERIOD: usize = 14;

/// Moving-average columns attached to every bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovingAverage {
    #[serde(rename = "MA5")]
    Ma5,
    #[serde(rename = "MA20")]
    Ma20,
    #[serde(rename = "MA60")]
    Ma60,
    #[serde(rename = "MA120")]
    Ma120,
}

impl MovingAverage {
    pub const ALL: [MovingAverage; 4] = [Self::Ma5, Self::Ma20, Self::Ma60, Self::Ma120];

    pub fn period(self) -> usize {
        match self {
            Self::Ma5 => 5,
            Self::Ma20 => 20,
            Self::Ma60 => 60,
            Self::Ma120 => 120,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ma5 => "MA5",
            Self::Ma20 => "MA20",
            Self::Ma60 => "MA60",
            Self::Ma120 => "MA120",
        }
    }
}

impl std::fmt::Display for MovingAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for MovingAverage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ma| ma.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown moving average '{s}' (expected MA5, MA20, MA60 or MA120)"))
    }
}

/// Derived fields for a single bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    #[serde(rename = "MA5")]
    pub ma5: Option<f64>,
    #[serde(rename = "MA20")]
    pub ma20: Option<f64>,
    #[serde(rename = "MA60")]
    pub ma60: Option<f64>,
    #[serde(rename = "MA120")]
    pub ma120: Option<f64>,
    #[serde(rename = "RSI14")]
    pub rsi14: Option<f64>,
}

impl IndicatorSet {
    pub fn moving_average(&self, ma: MovingAverage) -> Option<f64> {
        match ma {
            MovingAverage::Ma5 => self.ma5,
            MovingAverage::Ma20 => self.ma20,
            MovingAverage::Ma60 => self.ma60,
            MovingAverage::Ma120 => self.ma120,
        }
    }
}

/// A price bar with its indicators attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    #[serde(flatten)]
    pub indicators: IndicatorSet,
}

/// The augmented series handed to the presentation layer.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct IndicatorSeries {
    rows: Vec<IndicatorRow>,
}

impl IndicatorSeries {
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one moving-average column, aligned with the rows.
    pub fn moving_average(&self, ma: MovingAverage) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.indicators.moving_average(ma)).collect()
    }

    pub fn rsi(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.indicators.rsi14).collect()
    }

    /// The last `count` rows (oldest-first order).
    pub fn tail(&self, count: usize) -> &[IndicatorRow] {
        let start = self.rows.len().saturating_sub(count);
        &self.rows[start..]
    }
}

/// Attach MA5/20/60/120 and RSI14 to every bar of a non-empty series.
pub fn compute_indicators(series: &PriceSeries) -> Result<IndicatorSeries, LookupError> {
    if series.is_empty() {
        return Err(LookupError::EmptySeries);
    }

    let closes = series.closes();
    let ma5 = sma::calculate_sma(&closes, MovingAverage::Ma5.period());
    let ma20 = sma::calculate_sma(&closes, MovingAverage::Ma20.period());
    let ma60 = sma::calculate_sma(&closes, MovingAverage::Ma60.period());
    let ma120 = sma::calculate_sma(&closes, MovingAverage::Ma120.period());
    let rsi14 = rsi::calculate_rsi(&closes, RSI_PERIOD);

    let rows = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            bar: bar.clone(),
            indicators: IndicatorSet {
                ma5: ma5[i],
                ma20: ma20[i],
                ma60: ma60[i],
                ma120: ma120[i],
                rsi14: rsi14[i],
            },
        })
        .collect();

    Ok(IndicatorSeries { rows })
}
