// =============================================================================
// Central Application State — stock-lens dashboard backend
// =============================================================================
//
// Shared by every request handler through `Arc<AppState>`. Apart from the
// listing cache inside the resolver (which guards itself) nothing here is
// mutated after startup; the query counter is a lock-free atomic.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::market_data::PriceHistorySource;
use crate::runtime_config::DashboardConfig;
use crate::symbols::SymbolResolver;

pub struct AppState {
    pub config: DashboardConfig,

    // ── Collaborators ───────────────────────────────────────────────────
    pub resolver: SymbolResolver,
    pub prices: Arc<dyn PriceHistorySource>,
    pub clock: Arc<dyn Clock>,

    // ── Counters ────────────────────────────────────────────────────────
    /// Queries answered successfully since startup.
    pub queries_served: AtomicU64,

    /// Instant when the server was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        resolver: SymbolResolver,
        prices: Arc<dyn PriceHistorySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            resolver,
            prices,
            clock,
            queries_served: AtomicU64::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn record_query(&self) -> u64 {
        self.queries_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn queries_served(&self) -> u64 {
        self.queries_served.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
