// =============================================================================
// Spreadsheet export
// =============================================================================
//
// One header row, then one row per bar, in a fixed column order. Undefined
// indicator values are empty cells. Rendered as CSV for download.

use anyhow::{anyhow, Context, Result};

use crate::indicators::{IndicatorRow, IndicatorSeries, MovingAverage};

pub const EXPORT_COLUMNS: [&str; 11] = [
    "Date", "Open", "High", "Low", "Close", "Volume", "MA5", "MA20", "MA60", "MA120", "RSI14",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub header: [&'static str; 11],
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn from_series(series: &IndicatorSeries) -> Self {
        Self {
            header: EXPORT_COLUMNS,
            rows: series.rows().iter().map(export_row).collect(),
        }
    }

    /// CSV text with `\r\n` line endings, header first.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());

        writer
            .write_record(self.header)
            .context("failed to write export header")?;
        for row in &self.rows {
            writer
                .write_record(row)
                .context("failed to write export row")?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush export: {}", e.error()))?;
        String::from_utf8(bytes).context("export is not valid UTF-8")
    }
}

fn export_row(row: &IndicatorRow) -> Vec<String> {
    let bar = &row.bar;
    let mut cells = vec![
        bar.date.format("%Y-%m-%d").to_string(),
        bar.open.to_string(),
        bar.high.to_string(),
        bar.low.to_string(),
        bar.close.to_string(),
        bar.volume.to_string(),
    ];
    cells.extend(
        MovingAverage::ALL
            .into_iter()
            .map(|ma| optional_cell(row.indicators.moving_average(ma))),
    );
    cells.push(optional_cell(row.indicators.rsi14));
    cells
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Download name for a code, e.g. `005930_prices.csv`.
pub fn export_filename(code: &str) -> String {
    let safe: String = code
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if safe.is_empty() {
        "prices.csv".to_string()
    } else {
        format!("{safe}_prices.csv")
    }
}
