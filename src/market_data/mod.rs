// =============================================================================
// Market data sources
// =============================================================================
//
// Everything that talks to the outside world lives here. The indicator core
// never sees these traits; it only receives the `PriceSeries` they produce.

pub mod krx_listing;
pub mod naver;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{DateRange, PriceSeries};

pub use krx_listing::{KrxListingClient, StaticListing};
pub use naver::NaverChartClient;

/// One row of the exchange listing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedCompany {
    pub name: String,
    pub code: String,
}

/// Daily OHLCV history for a stock code.
///
/// A window without trading data yields an empty series, not an error.
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn fetch_daily(&self, code: &str, range: DateRange) -> Result<PriceSeries>;
}

/// Full company-name → code listing.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<Vec<ListedCompany>>;
}
