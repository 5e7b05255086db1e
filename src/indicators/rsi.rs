// =============================================================================
// Relative Strength Index (RSI) — simple rolling-mean variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether a stock is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Split each delta into gain = max(delta, 0), loss = max(-delta, 0).
// Step 3 — avg_gain / avg_loss = plain mean of the trailing `period` gains /
//          losses (no Wilder smoothing; every window is independent).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

use serde::Serialize;

/// Upper guide line drawn on the RSI panel.
pub const OVERBOUGHT_LEVEL: f64 = 70.0;
/// Lower guide line drawn on the RSI panel.
pub const OVERSOLD_LEVEL: f64 = 30.0;

/// Coarse reading of an RSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(value: f64) -> Self {
        if value >= OVERBOUGHT_LEVEL {
            Self::Overbought
        } else if value <= OVERSOLD_LEVEL {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

/// Compute the RSI series for the given `closes` and `period`.
///
/// The output is aligned with `closes`. Slot `i` is defined once `period`
/// deltas exist, i.e. from index `period` onward (there is no delta at 0).
///
/// # Edge cases
/// - `period == 0` => every slot is `None`
/// - `closes.len() < period + 1` => every slot is `None`
/// - Average loss zero with gains => 100.0; no movement at all => 50.0.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return result;
    }

    // --- Split deltas into gains and losses ---------------------------------
    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();

    // --- Trailing-window means ----------------------------------------------
    // Delta k belongs to close k+1, so the window ending at delta k fills
    // result slot k+1.
    let period_f = period as f64;
    for end in period..=gains.len() {
        let avg_gain = gains[end - period..end].iter().sum::<f64>() / period_f;
        let avg_loss = losses[end - period..end].iter().sum::<f64>() / period_f;
        result[end] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

/// Most recent defined RSI value together with its zone.
///
/// Returns `None` when no slot in the series is defined.
pub fn current_rsi(series: &[Option<f64>]) -> Option<(f64, RsiZone)> {
    let value = series.iter().rev().find_map(|v| *v)?;
    Some((value, RsiZone::classify(value)))
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If both averages are zero, RSI is 50.0 (no movement).
/// - If average loss is zero (only gains), RSI is 100.0.
/// - Returns `None` when the result is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi)
    } else {
        None
    }
}
