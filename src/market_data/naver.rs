// =============================================================================
// Naver daily chart client — KRX price history
// =============================================================================
//
// The `siseJson.nhn` endpoint answers with a JavaScript array literal rather
// than strict JSON:
//
//   [['날짜', '시가', '고가', '저가', '종가', '거래량', '외국인소진율'],
//   ["20240102", 78200, 79800, 78200, 79600, 17142847, 53.45],
//   ...
//   ]
//
// Single quotes are rewritten to double quotes, the header row is skipped and
// the remaining rows become `PriceBar`s. An empty body array means no trading
// in the window.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::market_data::PriceHistorySource;
use crate::types::{DateRange, PriceBar, PriceSeries};

/// Default endpoint base.
pub const DEFAULT_BASE_URL: &str = "https://fchart.stock.naver.com";

/// Daily chart client for KRX-listed stocks.
#[derive(Clone)]
pub struct NaverChartClient {
    base_url: String,
    client: reqwest::Client,
}

impl NaverChartClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "NaverChartClient initialised");

        Ok(Self { base_url, client })
    }

    /// GET /siseJson.nhn for one code and window.
    #[instrument(skip(self), name = "naver::fetch_daily")]
    async fn get_daily(&self, code: &str, range: DateRange) -> Result<PriceSeries> {
        let (start, end) = range.to_compact();
        let url = format!(
            "{}/siseJson.nhn?symbol={}&requestType=1&startTime={}&endTime={}&timeframe=day",
            self.base_url, code, start, end
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET daily chart for {code} failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read daily chart body for {code}"))?;

        if !status.is_success() {
            anyhow::bail!("daily chart for {code} returned {status}: {body}");
        }

        let bars = parse_chart_body(&body)
            .with_context(|| format!("failed to parse daily chart for {code} ({range})"))?;
        let series = PriceSeries::from_bars(bars)
            .with_context(|| format!("inconsistent daily chart for {code}"))?;

        debug!(code, range = %range, count = series.len(), "daily bars fetched");
        Ok(series)
    }
}

#[async_trait]
impl PriceHistorySource for NaverChartClient {
    async fn fetch_daily(&self, code: &str, range: DateRange) -> Result<PriceSeries> {
        self.get_daily(code, range).await
    }
}

impl std::fmt::Debug for NaverChartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaverChartClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Body parsing
// =============================================================================

/// Parse the array-literal body into bars (input order preserved).
///
/// Rows whose first cell is not an 8-digit date (the header) are skipped.
/// Short rows are skipped with a warning.
pub fn parse_chart_body(body: &str) -> Result<Vec<PriceBar>> {
    let normalised = body.trim().replace('\'', "\"");
    if normalised.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<Value>> =
        serde_json::from_str(&normalised).context("chart body is not an array of rows")?;

    let mut bars = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(date) = row.first().and_then(parse_date_cell) else {
            continue;
        };

        if row.len() < 6 {
            warn!(%date, cells = row.len(), "skipping short chart row");
            continue;
        }

        let open = parse_number(&row[1]).context("open")?;
        let high = parse_number(&row[2]).context("high")?;
        let low = parse_number(&row[3]).context("low")?;
        let close = parse_number(&row[4]).context("close")?;
        let volume = parse_number(&row[5]).context("volume")?;

        bars.push(PriceBar::new(date, open, high, low, close, volume.max(0.0).round() as u64));
    }

    Ok(bars)
}

fn parse_date_cell(cell: &Value) -> Option<NaiveDate> {
    let s = cell.as_str()?.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Accept either a JSON number or a numeric string.
fn parse_number(val: &Value) -> Result<f64> {
    if let Some(n) = val.as_f64() {
        Ok(n)
    } else if let Some(s) = val.as_str() {
        s.trim()
            .parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
 [['날짜', '시가', '고가', '저가', '종가', '거래량', '외국인소진율'],
["20240103", 78500, 78800, 77000, 77000, 21753644, 53.46],
["20240102", 78200, 79800, 78200, 79600, 17142847, 53.45]
]
"#;

    #[test]
    fn parses_rows_and_skips_header() {
        let bars = parse_chart_body(SAMPLE).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[1].open, 78200.0);
        assert_eq!(bars[1].high, 79800.0);
        assert_eq!(bars[1].low, 78200.0);
        assert_eq!(bars[1].close, 79600.0);
        assert_eq!(bars[1].volume, 17_142_847);
    }

    #[test]
    fn parsed_rows_build_ascending_series() {
        let series = PriceSeries::from_bars(parse_chart_body(SAMPLE).unwrap()).unwrap();
        assert_eq!(series.closes(), vec![79600.0, 77000.0]);
    }

    #[test]
    fn header_only_body_is_empty() {
        let body = "[['날짜', '시가', '고가', '저가', '종가', '거래량', '외국인소진율']]";
        assert!(parse_chart_body(body).unwrap().is_empty());
        assert!(parse_chart_body("   ").unwrap().is_empty());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let body = r#"[["20240102", "100.5", "101", "99", "100", "1234"]]"#;
        let bars = parse_chart_body(body).unwrap();
        assert_eq!(bars[0].open, 100.5);
        assert_eq!(bars[0].volume, 1234);
    }

    #[test]
    fn short_rows_are_skipped() {
        let body = r#"[["20240102", 1, 2, 3], ["20240103", 1, 2, 0.5, 1.5, 10]]"#;
        let bars = parse_chart_body(body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.5);
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(parse_chart_body("<html>blocked</html>").is_err());
    }

    #[test]
    fn bad_number_is_an_error() {
        let body = r#"[["20240102", "n/a", 2, 1, 1.5, 10]]"#;
        assert!(parse_chart_body(body).is_err());
    }
}
