// =============================================================================
// KRX listing — company name → 6-digit stock code
// =============================================================================
//
// The KRX data portal serves the full listing of KOSPI / KOSDAQ / KONEX
// issues as JSON from its `getJsonData.cmd` endpoint:
//
//   { "OutBlock_1": [ { "ISU_SRT_CD": "005930", "ISU_ABBRV": "삼성전자", ... } ] }
//
// `StaticListing` serves a fixed table (from memory or a JSON file) for
// offline runs and tests.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::market_data::{ListedCompany, ListingSource};

/// Default KRX data portal endpoint.
pub const DEFAULT_LISTING_URL: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";

/// Report id of the "all listed issues" table.
const LISTING_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01901";

/// The portal rejects requests without a same-site referer.
const LISTING_REFERER: &str = "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader";

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(rename = "OutBlock_1", default)]
    rows: Vec<ListingRow>,
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "ISU_SRT_CD")]
    code: String,
    #[serde(rename = "ISU_ABBRV")]
    name: String,
}

/// Listing client for the KRX data portal.
#[derive(Clone)]
pub struct KrxListingClient {
    url: String,
    client: reqwest::Client,
}

impl KrxListingClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// POST the listing report request and map rows to companies.
    #[instrument(skip(self), name = "krx::fetch_listing")]
    async fn get_listing(&self) -> Result<Vec<ListedCompany>> {
        let resp = self
            .client
            .post(&self.url)
            .header(reqwest::header::REFERER, LISTING_REFERER)
            .form(&[
                ("bld", LISTING_BLD),
                ("mktId", "ALL"),
                ("share", "1"),
                ("csvxls_isNo", "false"),
            ])
            .send()
            .await
            .context("POST KRX listing request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read KRX listing body")?;

        if !status.is_success() {
            anyhow::bail!("KRX listing returned {status}: {body}");
        }

        let companies = parse_listing_body(&body)?;
        info!(count = companies.len(), "KRX listing fetched");
        Ok(companies)
    }
}

#[async_trait]
impl ListingSource for KrxListingClient {
    async fn fetch_listing(&self) -> Result<Vec<ListedCompany>> {
        self.get_listing().await
    }
}

impl std::fmt::Debug for KrxListingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrxListingClient")
            .field("url", &self.url)
            .finish()
    }
}

/// Parse the portal JSON into companies, zero-padding codes to six digits.
pub fn parse_listing_body(body: &str) -> Result<Vec<ListedCompany>> {
    let parsed: ListingResponse =
        serde_json::from_str(body).context("failed to parse KRX listing JSON")?;

    let companies: Vec<ListedCompany> = parsed
        .rows
        .into_iter()
        .filter(|row| !row.code.trim().is_empty())
        .map(|row| ListedCompany {
            name: row.name.trim().to_string(),
            code: pad_code(&row.code),
        })
        .collect();

    debug!(count = companies.len(), "listing rows parsed");
    Ok(companies)
}

/// Listing codes sometimes arrive without leading zeros (e.g. "5930").
fn pad_code(raw: &str) -> String {
    format!("{:0>6}", raw.trim())
}

// =============================================================================
// StaticListing
// =============================================================================

/// Fixed listing table.
#[derive(Debug, Clone, Default)]
pub struct StaticListing {
    companies: Vec<ListedCompany>,
}

impl StaticListing {
    pub fn new(companies: Vec<ListedCompany>) -> Self {
        Self { companies }
    }

    /// Load a JSON array of `{ "name": ..., "code": ... }` objects.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read listing file {}", path.display()))?;
        let companies: Vec<ListedCompany> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse listing file {}", path.display()))?;

        let companies = companies
            .into_iter()
            .map(|c| ListedCompany {
                code: pad_code(&c.code),
                name: c.name,
            })
            .collect::<Vec<_>>();

        info!(path = %path.display(), count = companies.len(), "static listing loaded");
        Ok(Self::new(companies))
    }
}

#[async_trait]
impl ListingSource for StaticListing {
    async fn fetch_listing(&self) -> Result<Vec<ListedCompany>> {
        Ok(self.companies.clone())
    }
}
