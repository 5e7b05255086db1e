// =============================================================================
// Runtime Configuration — dashboard backend settings
// =============================================================================
//
// Loaded once at startup from `dashboard_config.json`. All fields carry
// `#[serde(default)]` so a partial (or empty) file is always valid; a missing
// file falls back to `DashboardConfig::default()`.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::date_range::default_epoch_floor;
use crate::indicators::MovingAverage;
use crate::market_data::{krx_listing, naver};
use crate::types::RangePreset;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_price_source_url() -> String {
    naver::DEFAULT_BASE_URL.to_string()
}

fn default_listing_url() -> String {
    krx_listing::DEFAULT_LISTING_URL.to_string()
}

/// 12 hours.
fn default_listing_ttl_secs() -> u64 {
    12 * 60 * 60
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_recent_rows() -> usize {
    20
}

fn default_overlays() -> Vec<MovingAverage> {
    vec![MovingAverage::Ma20, MovingAverage::Ma60]
}

// =============================================================================
// DashboardConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Upstream sources ---------------------------------------------------

    /// Base URL of the daily chart endpoint.
    #[serde(default = "default_price_source_url")]
    pub price_source_url: String,

    /// KRX listing endpoint.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Optional local listing (JSON array of `{name, code}`); replaces the
    /// KRX endpoint when set.
    #[serde(default)]
    pub listing_file: Option<String>,

    /// How long a fetched listing stays fresh.
    #[serde(default = "default_listing_ttl_secs")]
    pub listing_ttl_secs: u64,

    /// Timeout for every outbound HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Query defaults -----------------------------------------------------

    /// Start date used by the MAX preset.
    #[serde(default = "default_epoch_floor")]
    pub epoch_floor: NaiveDate,

    /// Preset applied when a query names neither a preset nor dates.
    #[serde(default)]
    pub default_preset: RangePreset,

    /// MA overlays drawn when a query does not pick any.
    #[serde(default = "default_overlays")]
    pub default_overlays: Vec<MovingAverage>,

    /// Size of the "recent data" table.
    #[serde(default = "default_recent_rows")]
    pub recent_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            price_source_url: default_price_source_url(),
            listing_url: default_listing_url(),
            listing_file: None,
            listing_ttl_secs: default_listing_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            epoch_floor: default_epoch_floor(),
            default_preset: RangePreset::default(),
            default_overlays: default_overlays(),
            recent_rows: default_recent_rows(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dashboard config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dashboard config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            default_preset = %config.default_preset,
            "dashboard config loaded"
        );

        Ok(config)
    }

    /// Apply `STOCK_LENS_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("STOCK_LENS_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
        if let Ok(file) = std::env::var("STOCK_LENS_LISTING_FILE") {
            if !file.trim().is_empty() {
                self.listing_file = Some(file.trim().to_string());
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn listing_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.listing_ttl_secs as i64)
    }
}
