// =============================================================================
// Daily Returns, Base-100 Cumulative Index & Annualized Volatility
// =============================================================================
//
//   return[i]     = close[i] / close[i-1] - 1          (undefined at i = 0)
//   index[i]      = 100 * prod_{k=1..i} (1 + return[k]),  index[0] = 100
//   total return  = (last / first - 1) * 100
//   volatility    = sample_std(returns) * sqrt(252) * 100
// =============================================================================

use serde::Serialize;

use crate::error::LookupError;
use crate::types::PriceSeries;

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Starting value of the cumulative index.
pub const INDEX_BASE: f64 = 100.0;

/// Aggregate performance numbers for one queried series.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnSummary {
    pub first_close: f64,
    pub last_close: f64,
    /// `None` when the series has fewer than 2 bars or starts at zero.
    pub total_return_pct: Option<f64>,
    /// 0.0 when fewer than 2 daily returns exist.
    pub volatility_pct: f64,
    pub daily_returns: Vec<Option<f64>>,
    pub cumulative_index: Vec<f64>,
}

/// Simple daily returns aligned with `closes`.
///
/// Slot 0 is always `None`. A zero previous close also yields `None`
/// rather than an infinite return.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    for w in closes.windows(2) {
        let r = w[1] / w[0] - 1.0;
        out.push(if r.is_finite() { Some(r) } else { None });
    }
    out
}

/// Base-100 cumulative index. Undefined returns count as 0 (flat day).
pub fn cumulative_index(returns: &[Option<f64>]) -> Vec<f64> {
    let mut level = INDEX_BASE;
    returns
        .iter()
        .map(|r| {
            level *= 1.0 + r.unwrap_or(0.0);
            level
        })
        .collect()
}

/// Sample (n-1) standard deviation. `None` for fewer than 2 values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();
    std.is_finite().then_some(std)
}

/// Annualized volatility in percent; 0.0 when it cannot be computed.
pub fn annualized_volatility_pct(returns: &[Option<f64>]) -> f64 {
    let defined: Vec<f64> = returns.iter().flatten().copied().collect();
    sample_std_dev(&defined)
        .map(|std| std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
        .unwrap_or(0.0)
}

/// Summarize a non-empty series.
pub fn summarize_returns(series: &PriceSeries) -> Result<ReturnSummary, LookupError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(f), Some(l)) => (f.close, l.close),
        _ => return Err(LookupError::EmptySeries),
    };

    let total_return_pct = if series.len() >= 2 && first != 0.0 {
        Some((last / first - 1.0) * 100.0)
    } else {
        None
    };

    let returns = daily_returns(&series.closes());
    let volatility_pct = annualized_volatility_pct(&returns);
    let cumulative = cumulative_index(&returns);

    Ok(ReturnSummary {
        first_close: first,
        last_close: last,
        total_return_pct,
        volatility_pct,
        daily_returns: returns,
        cumulative_index: cumulative,
    })
}
