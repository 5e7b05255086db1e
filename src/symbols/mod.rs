// =============================================================================
// Symbol resolution — free-text company input → KRX stock code
// =============================================================================

pub mod cache;

use tracing::debug;

use crate::error::LookupError;

pub use cache::ListingCache;

/// `true` for a 6-character all-ASCII-digit string such as "005930".
pub fn is_stock_code(input: &str) -> bool {
    input.len() == 6 && input.bytes().all(|b| b.is_ascii_digit())
}

pub struct SymbolResolver {
    cache: ListingCache,
}

impl SymbolResolver {
    pub fn new(cache: ListingCache) -> Self {
        Self { cache }
    }

    /// Resolve a company name or code.
    ///
    /// A 6-digit code is returned as-is without touching the listing, whether
    /// or not that code is actually listed. Names must match exactly (after
    /// trimming).
    pub async fn resolve(&self, input: &str) -> Result<String, LookupError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        if is_stock_code(query) {
            return Ok(query.to_string());
        }

        let table = self.cache.get().await.map_err(LookupError::upstream)?;
        match table.code_for(query) {
            Some(code) => {
                debug!(query, code, "company name resolved");
                Ok(code.to_string())
            }
            None => Err(LookupError::SymbolNotFound {
                query: query.to_string(),
            }),
        }
    }

    pub fn invalidate_listing(&self) {
        self.cache.invalidate();
    }
}
