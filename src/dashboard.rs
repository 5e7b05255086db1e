// =============================================================================
// Dashboard query — one submit, one result
// =============================================================================
//
// Pipeline:
//   1. Reject blank input, validate an explicit range.
//   2. Resolve the preset into a concrete window ending at `as_of`.
//   3. Resolve the company name / code.
//   4. Fetch the daily series. No bars => result with a notice, not an error.
//   5. Attach indicators, summarize returns, derive KPI cards and the chart
//      payload.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument};

use crate::date_range::{resolve_range, resolve_range_with_floor, validate_range};
use crate::error::LookupError;
use crate::indicators::{
    compute_indicators, rsi, summarize_returns, IndicatorRow, IndicatorSeries, MovingAverage,
    ReturnSummary, RsiZone,
};
use crate::market_data::PriceHistorySource;
use crate::runtime_config::DashboardConfig;
use crate::symbols::SymbolResolver;
use crate::types::{DateRange, RangePreset};

/// Shown when the window holds no trading days.
pub const NO_DATA_NOTICE: &str = "no price data for the selected period";

#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Company name or 6-digit code, as typed.
    pub query: String,
    pub preset: RangePreset,
    /// Only read when `preset` is `Explicit`.
    pub explicit: Option<DateRange>,
    /// MA lines to overlay on the candle chart.
    pub overlays: Vec<MovingAverage>,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Headline numbers shown as cards above the chart.
#[derive(Debug, Clone, Serialize)]
pub struct KpiCards {
    pub last_close: f64,
    pub prev_close: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
    pub period_high: f64,
    pub period_low: f64,
    pub avg_volume: f64,
    pub total_return_pct: Option<f64>,
    pub volatility_pct: f64,
    pub latest_rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overlay {
    pub name: MovingAverage,
    pub values: Vec<Option<f64>>,
}

/// Column-oriented series for the candle / volume / RSI / cumulative charts.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPayload {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
    pub overlays: Vec<Overlay>,
    pub rsi: Vec<Option<f64>>,
    /// Overbought / oversold guide lines.
    pub rsi_guides: [f64; 2],
    pub cumulative_index: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub code: String,
    pub preset: RangePreset,
    pub range: DateRange,
    pub notice: Option<String>,
    pub kpis: Option<KpiCards>,
    pub summary: Option<ReturnSummary>,
    pub bars: IndicatorSeries,
    pub recent: Vec<IndicatorRow>,
    pub chart: Option<ChartPayload>,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[instrument(skip(resolver, prices, config), fields(query = %request.query, preset = %request.preset))]
pub async fn submit_query(
    resolver: &SymbolResolver,
    prices: &dyn PriceHistorySource,
    config: &DashboardConfig,
    as_of: NaiveDate,
    request: &QueryRequest,
) -> Result<QueryResult, LookupError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(LookupError::EmptyQuery);
    }

    if request.preset == RangePreset::Explicit {
        if let Some(range) = request.explicit {
            validate_range(range)?;
        }
    }
    // Only MAX reads the configured floor.
    let range = match request.preset {
        RangePreset::Max => resolve_range_with_floor(request.preset, as_of, None, config.epoch_floor),
        preset => resolve_range(preset, as_of, request.explicit),
    };

    let code = resolver.resolve(query).await?;

    let series = prices
        .fetch_daily(&code, range)
        .await
        .map_err(LookupError::upstream)?;

    if series.is_empty() {
        info!(code = %code, range = %range, "no bars in range");
        return Ok(QueryResult {
            query: query.to_string(),
            code,
            preset: request.preset,
            range,
            notice: Some(NO_DATA_NOTICE.to_string()),
            kpis: None,
            summary: None,
            bars: IndicatorSeries::default(),
            recent: Vec::new(),
            chart: None,
        });
    }

    let augmented = compute_indicators(&series)?;
    let summary = summarize_returns(&series)?;
    let kpis = build_kpis(&augmented, &summary);
    let chart = build_chart(&augmented, &summary, &request.overlays);
    let recent = augmented.tail(config.recent_rows).to_vec();

    info!(
        code = %code,
        range = %range,
        bars = augmented.len(),
        total_return_pct = ?summary.total_return_pct,
        "query served"
    );

    Ok(QueryResult {
        query: query.to_string(),
        code,
        preset: request.preset,
        range,
        notice: None,
        kpis: Some(kpis),
        summary: Some(summary),
        bars: augmented,
        recent,
        chart: Some(chart),
    })
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// KPI cards for a non-empty augmented series.
pub fn build_kpis(series: &IndicatorSeries, summary: &ReturnSummary) -> KpiCards {
    let rows = series.rows();
    let last_close = summary.last_close;
    let prev_close = rows.len().checked_sub(2).map(|i| rows[i].bar.close);

    let (change, change_pct) = match prev_close {
        Some(prev) if prev != 0.0 => {
            let diff = last_close - prev;
            (Some(diff), Some(diff / prev * 100.0))
        }
        Some(prev) => (Some(last_close - prev), None),
        None => (None, None),
    };

    let period_high = rows.iter().map(|r| r.bar.high).fold(f64::NEG_INFINITY, f64::max);
    let period_low = rows.iter().map(|r| r.bar.low).fold(f64::INFINITY, f64::min);
    let avg_volume = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|r| r.bar.volume as f64).sum::<f64>() / rows.len() as f64
    };

    let latest = rsi::current_rsi(&series.rsi());

    KpiCards {
        last_close,
        prev_close,
        change,
        change_pct,
        period_high,
        period_low,
        avg_volume,
        total_return_pct: summary.total_return_pct,
        volatility_pct: summary.volatility_pct,
        latest_rsi: latest.map(|(v, _)| v),
        rsi_zone: latest.map(|(_, z)| z),
    }
}

pub fn build_chart(
    series: &IndicatorSeries,
    summary: &ReturnSummary,
    overlays: &[MovingAverage],
) -> ChartPayload {
    let bars = series.rows().iter().map(|r| &r.bar);

    let mut selected: Vec<MovingAverage> = Vec::with_capacity(overlays.len());
    for ma in overlays {
        if !selected.contains(ma) {
            selected.push(*ma);
        }
    }

    ChartPayload {
        dates: bars.clone().map(|b| b.date).collect(),
        open: bars.clone().map(|b| b.open).collect(),
        high: bars.clone().map(|b| b.high).collect(),
        low: bars.clone().map(|b| b.low).collect(),
        close: bars.clone().map(|b| b.close).collect(),
        volume: bars.map(|b| b.volume).collect(),
        overlays: selected
            .into_iter()
            .map(|ma| Overlay {
                name: ma,
                values: series.moving_average(ma),
            })
            .collect(),
        rsi: series.rsi(),
        rsi_guides: [rsi::OVERBOUGHT_LEVEL, rsi::OVERSOLD_LEVEL],
        cumulative_index: summary.cumulative_index.clone(),
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::market_data::{ListedCompany, StaticListing};
    use crate::symbols::ListingCache;
    use crate::types::{PriceBar, PriceSeries};
    use async_trait::async_trait;
    use chrono::Duration;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Serves a fixed series clipped to the requested window and records
    /// every request.
    pub(crate) struct FixedPrices {
        pub bars: Vec<PriceBar>,
        pub requests: Mutex<Vec<(String, DateRange)>>,
        pub fail: bool,
    }

    impl FixedPrices {
        pub fn new(bars: Vec<PriceBar>) -> Self {
            Self {
                bars,
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl PriceHistorySource for FixedPrices {
        async fn fetch_daily(&self, code: &str, range: DateRange) -> anyhow::Result<PriceSeries> {
            self.requests.lock().push((code.to_string(), range));
            if self.fail {
                anyhow::bail!("chart endpoint returned 503");
            }
            let bars = self
                .bars
                .iter()
                .filter(|b| b.date >= range.start && b.date <= range.end)
                .cloned()
                .collect();
            Ok(PriceSeries::from_bars(bars)?)
        }
    }

    pub(crate) fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// `n` consecutive calendar days ending on 2024-07-15, closes 100, 101, ...
    pub(crate) fn rising_bars(n: usize) -> Vec<PriceBar> {
        let end = d(2024, 7, 15);
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                let date = end - Duration::days((n - 1 - i) as i64);
                PriceBar::new(date, c - 0.5, c + 1.0, c - 1.0, c, 1_000 + i as u64)
            })
            .collect()
    }

    pub(crate) fn test_resolver() -> SymbolResolver {
        let listing = StaticListing::new(vec![ListedCompany {
            name: "삼성전자".into(),
            code: "005930".into(),
        }]);
        let clock = Arc::new(ManualClock::on(d(2024, 7, 15)));
        SymbolResolver::new(ListingCache::new(Arc::new(listing), clock, Duration::hours(12)))
    }

    fn request(query: &str, preset: RangePreset) -> QueryRequest {
        QueryRequest {
            query: query.into(),
            preset,
            explicit: None,
            overlays: vec![MovingAverage::Ma20, MovingAverage::Ma60],
        }
    }

    #[tokio::test]
    async fn full_query_by_company_name() {
        let prices = FixedPrices::new(rising_bars(200));
        let cfg = DashboardConfig::default();
        let result = submit_query(
            &test_resolver(),
            &prices,
            &cfg,
            d(2024, 7, 15),
            &request("삼성전자", RangePreset::YearToDate),
        )
        .await
        .unwrap();

        assert_eq!(result.code, "005930");
        assert_eq!(result.range, DateRange::new(d(2024, 1, 1), d(2024, 7, 15)));
        assert_eq!(prices.requests.lock()[0].0, "005930");

        // 2024-01-01 ..= 2024-07-15 is 197 calendar days.
        assert_eq!(result.bars.len(), 197);
        assert_eq!(result.recent.len(), 20);
        assert!(result.notice.is_none());

        let kpis = result.kpis.unwrap();
        assert_eq!(kpis.rsi_zone, Some(RsiZone::Overbought));
        assert!((kpis.change.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(kpis.period_high, kpis.last_close + 1.0);

        let chart = result.chart.unwrap();
        assert_eq!(chart.overlays.len(), 2);
        assert_eq!(chart.overlays[0].name, MovingAverage::Ma20);
        assert_eq!(chart.dates.len(), 197);
        assert_eq!(chart.cumulative_index[0], 100.0);
        assert_eq!(chart.rsi_guides, [70.0, 30.0]);
    }

    #[tokio::test]
    async fn empty_window_yields_notice() {
        let prices = FixedPrices::new(rising_bars(10));
        let cfg = DashboardConfig::default();
        let mut req = request("005930", RangePreset::Explicit);
        req.explicit = Some(DateRange::new(d(2020, 1, 1), d(2020, 2, 1)));

        let result = submit_query(&test_resolver(), &prices, &cfg, d(2024, 7, 15), &req)
            .await
            .unwrap();
        assert_eq!(result.notice.as_deref(), Some(NO_DATA_NOTICE));
        assert!(result.bars.is_empty());
        assert!(result.kpis.is_none());
        assert!(result.chart.is_none());
    }

    #[tokio::test]
    async fn inverted_explicit_range_is_rejected_before_fetch() {
        let prices = FixedPrices::new(rising_bars(10));
        let cfg = DashboardConfig::default();
        let mut req = request("005930", RangePreset::Explicit);
        req.explicit = Some(DateRange::new(d(2024, 3, 1), d(2024, 2, 1)));

        let err = submit_query(&test_resolver(), &prices, &cfg, d(2024, 7, 15), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::InvalidRange { .. }));
        assert!(prices.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn unknown_company_is_reported() {
        let prices = FixedPrices::new(rising_bars(10));
        let cfg = DashboardConfig::default();
        let err = submit_query(
            &test_resolver(),
            &prices,
            &cfg,
            d(2024, 7, 15),
            &request("없는회사", RangePreset::OneMonth),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LookupError::SymbolNotFound { .. }));
    }

    #[tokio::test]
    async fn fetch_failure_is_upstream_with_context() {
        let mut prices = FixedPrices::new(Vec::new());
        prices.fail = true;
        let cfg = DashboardConfig::default();
        let err = submit_query(
            &test_resolver(),
            &prices,
            &cfg,
            d(2024, 7, 15),
            &request("005930", RangePreset::OneMonth),
        )
        .await
        .unwrap_err();
        match err {
            LookupError::Upstream(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn max_preset_uses_configured_floor() {
        let prices = FixedPrices::new(rising_bars(5));
        let mut cfg = DashboardConfig::default();
        cfg.epoch_floor = d(2010, 1, 4);
        let result = submit_query(
            &test_resolver(),
            &prices,
            &cfg,
            d(2024, 7, 15),
            &request("005930", RangePreset::Max),
        )
        .await
        .unwrap();
        assert_eq!(result.range.start, d(2010, 1, 4));
        assert_eq!(result.bars.len(), 5);
    }

    #[tokio::test]
    async fn explicit_range_is_passed_through_and_floor_ignored() {
        let prices = FixedPrices::new(rising_bars(30));
        let mut cfg = DashboardConfig::default();
        cfg.epoch_floor = d(2010, 1, 4);
        let mut req = request("005930", RangePreset::Explicit);
        req.explicit = Some(DateRange::new(d(2024, 7, 1), d(2024, 7, 10)));

        let result = submit_query(&test_resolver(), &prices, &cfg, d(2024, 7, 15), &req)
            .await
            .unwrap();
        assert_eq!(result.range, DateRange::new(d(2024, 7, 1), d(2024, 7, 10)));
        assert_eq!(result.bars.len(), 10);

        let result = submit_query(
            &test_resolver(),
            &prices,
            &cfg,
            d(2024, 7, 15),
            &request("005930", RangePreset::OneMonth),
        )
        .await
        .unwrap();
        assert_eq!(result.range, DateRange::new(d(2024, 6, 14), d(2024, 7, 15)));
    }

    #[test]
    fn kpis_for_single_bar() {
        let series = PriceSeries::from_bars(rising_bars(1)).unwrap();
        let augmented = compute_indicators(&series).unwrap();
        let summary = summarize_returns(&series).unwrap();
        let kpis = build_kpis(&augmented, &summary);
        assert!(kpis.prev_close.is_none());
        assert!(kpis.change.is_none());
        assert!(kpis.total_return_pct.is_none());
        assert_eq!(kpis.volatility_pct, 0.0);
        assert!(kpis.latest_rsi.is_none());
        assert_eq!(kpis.avg_volume, 1_000.0);
    }

    #[test]
    fn chart_deduplicates_overlays() {
        let series = PriceSeries::from_bars(rising_bars(30)).unwrap();
        let augmented = compute_indicators(&series).unwrap();
        let summary = summarize_returns(&series).unwrap();
        let chart = build_chart(
            &augmented,
            &summary,
            &[MovingAverage::Ma5, MovingAverage::Ma5, MovingAverage::Ma120],
        );
        assert_eq!(chart.overlays.len(), 2);
        assert!(chart.overlays[1].values.iter().all(Option::is_none));
    }
}
