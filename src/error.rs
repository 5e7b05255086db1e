// =============================================================================
// Lookup error taxonomy
// =============================================================================
//
// Every failure is terminal for the current query. Missing indicator values
// are not errors; they are `None` fields on the affected bars.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    /// Indicator or summary requested on a series with zero bars.
    #[error("price series is empty")]
    EmptySeries,

    /// The listing has no company with this name.
    #[error("'{query}' was not found; try entering the 6-digit stock code directly")]
    SymbolNotFound { query: String },

    /// Explicit range whose start falls after its end.
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Blank company name / code input.
    #[error("enter a company name or 6-digit stock code")]
    EmptyQuery,

    /// Price or listing source failed (transport, status, or parse).
    #[error("upstream data source failed: {0}")]
    Upstream(String),
}

impl LookupError {
    /// Flatten an `anyhow` chain into an `Upstream` error, keeping every
    /// context layer in the message.
    pub fn upstream(err: anyhow::Error) -> Self {
        Self::Upstream(format!("{err:#}"))
    }
}
