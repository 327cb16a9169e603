use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::price::QuoteMap;
use crate::providers::traits::PriceProvider;

/// Fetches quotes for a set of asset ids through a single provider call.
///
/// - Ids are deduplicated and sorted, so the request is stable across refreshes.
/// - An empty id set never reaches the provider.
/// - Failures are returned as-is; retrying is the scheduler's job.
#[derive(Clone)]
pub struct PriceService {
    provider: Arc<dyn PriceProvider>,
    timeout: Duration,
}

impl PriceService {
    pub fn new(provider: Arc<dyn PriceProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch quotes for `ids`. Returns a possibly partial map, or an error
    /// when nothing usable came back.
    pub async fn fetch_all<I, S>(&self, ids: I) -> Result<QuoteMap, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if unique.is_empty() {
            return Ok(QuoteMap::new());
        }

        let requested: Vec<String> = unique.into_iter().collect();
        // The provider gets the timeout too, but the wait is bounded here regardless.
        let fetch = self.provider.fetch_quotes(&requested, self.timeout);
        let mut quotes = tokio::time::timeout(self.timeout, fetch)
            .await
            .unwrap_or(Err(CoreError::Timeout(self.timeout)))
            .inspect_err(|e| warn!("{} price fetch failed: {e}", self.provider.name()))?;

        // Providers are external code: keep only what was asked for and what is sane.
        quotes.retain(|id, quote| {
            let keep = requested.binary_search(id).is_ok()
                && quote.price_usd.is_finite()
                && quote.price_usd >= 0.0;
            if !keep {
                warn!("Discarding quote for {id} from {}", self.provider.name());
            }
            keep
        });
        for quote in quotes.values_mut() {
            if !quote.change_24h_pct.is_finite() {
                quote.change_24h_pct = 0.0;
            }
        }

        debug!(
            "{} priced {}/{} assets",
            self.provider.name(),
            quotes.len(),
            requested.len()
        );
        Ok(quotes)
    }
}
