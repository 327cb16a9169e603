use async_trait::async_trait;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::price::QuoteMap;

/// Trait abstraction for price data sources.
///
/// Implementations answer one batched question per refresh: "what are the
/// USD prices of these ids right now?". The refresh pipeline only talks to
/// this trait, so tests and alternative APIs plug in without touching it.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch quotes for all `ids` in a single request, waiting at most `timeout`.
    ///
    /// - `Ok` with a possibly partial map: ids the source does not know are absent.
    /// - `Err`: nothing usable came back (network, timeout, malformed body).
    ///
    /// Implementations must not retry.
    async fn fetch_quotes(&self, ids: &[String], timeout: Duration) -> Result<QuoteMap, CoreError>;
}
