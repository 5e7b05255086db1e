// =============================================================================
// Listing cache — time-bounded memo of the exchange listing table
// =============================================================================
//
// The listing rarely changes, so it is fetched at most once per TTL. Readers
// get an `Arc` snapshot; the lock is never held across the network call.
//
// Two concurrent misses may both refetch; the later write wins. If a refresh
// fails while an older table is held, the stale table keeps being served.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::market_data::{ListedCompany, ListingSource};

/// Name → code lookup built from one listing fetch.
#[derive(Debug, Default)]
pub struct ListingTable {
    by_name: HashMap<String, String>,
}

impl ListingTable {
    /// On duplicate names the first listed code wins.
    pub fn from_companies(companies: Vec<ListedCompany>) -> Self {
        let mut by_name = HashMap::with_capacity(companies.len());
        for c in companies {
            by_name.entry(c.name).or_insert(c.code);
        }
        Self { by_name }
    }

    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }
}

struct CachedListing {
    fetched_at: DateTime<Utc>,
    table: Arc<ListingTable>,
}

pub struct ListingCache {
    source: Arc<dyn ListingSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: RwLock<Option<CachedListing>>,
}

impl ListingCache {
    pub fn new(source: Arc<dyn ListingSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Current table, fetching first when absent or older than the TTL.
    pub async fn get(&self) -> Result<Arc<ListingTable>> {
        let now = self.clock.now();

        let stale = {
            let entry = self.entry.read();
            match entry.as_ref() {
                Some(cached) if now - cached.fetched_at < self.ttl => {
                    debug!("listing cache hit");
                    return Ok(cached.table.clone());
                }
                Some(cached) => Some(cached.table.clone()),
                None => None,
            }
        };

        match self.source.fetch_listing().await {
            Ok(companies) => {
                let table = Arc::new(ListingTable::from_companies(companies));
                info!(entries = table.len(), "listing cache refreshed");
                *self.entry.write() = Some(CachedListing {
                    fetched_at: now,
                    table: table.clone(),
                });
                Ok(table)
            }
            Err(e) => match stale {
                Some(table) => {
                    warn!(error = %e, "listing refresh failed, serving stale table");
                    Ok(table)
                }
                None => Err(e.context("listing table unavailable")),
            },
        }
    }

    /// Drop the cached table so the next `get` refetches.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts fetches; can be switched to fail.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ListingSource for CountingSource {
        async fn fetch_listing(&self) -> Result<Vec<ListedCompany>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("portal down");
            }
            Ok(vec![ListedCompany {
                name: format!("회사{n}"),
                code: "000001".into(),
            }])
        }
    }

    fn setup() -> (Arc<CountingSource>, Arc<ManualClock>, ListingCache) {
        let source = Arc::new(CountingSource::default());
        let clock = Arc::new(ManualClock::on(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()));
        let cache = ListingCache::new(source.clone(), clock.clone(), Duration::hours(12));
        (source, clock, cache)
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_refetch() {
        let (source, clock, cache) = setup();
        cache.get().await.unwrap();
        clock.advance(Duration::hours(11));
        let table = cache.get().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(table.code_for("회사0"), Some("000001"));
    }

    #[tokio::test]
    async fn stale_entry_is_refetched() {
        let (source, clock, cache) = setup();
        cache.get().await.unwrap();
        clock.advance(Duration::hours(12));
        let table = cache.get().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(table.code_for("회사1"), Some("000001"));
        assert!(table.code_for("회사0").is_none());
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_table() {
        let (source, clock, cache) = setup();
        cache.get().await.unwrap();
        source.fail.store(true, Ordering::SeqCst);
        clock.advance(Duration::days(1));
        let table = cache.get().await.unwrap();
        assert_eq!(table.code_for("회사0"), Some("000001"));
    }

    #[tokio::test]
    async fn failure_without_table_propagates() {
        let (source, _clock, cache) = setup();
        source.fail.store(true, Ordering::SeqCst);
        let err = cache.get().await.unwrap_err();
        assert!(format!("{err:#}").contains("portal down"));
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let (source, _clock, cache) = setup();
        cache.get().await.unwrap();
        cache.invalidate();
        cache.get().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_names_keep_first_code() {
        let table = ListingTable::from_companies(vec![
            ListedCompany { name: "동명".into(), code: "111111".into() },
            ListedCompany { name: "동명".into(), code: "222222".into() },
        ]);
        assert_eq!(table.code_for("동명"), Some("111111"));
        assert_eq!(table.len(), 1);
    }
}
