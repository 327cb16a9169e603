use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest USD price and 24h change for one asset.
///
/// Valid only until the next successful fetch, which replaces the whole map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub id: String,
    pub price_usd: f64,
    /// Percentage change over the last 24 hours (e.g., `-2.5` means -2.5%).
    pub change_24h_pct: f64,
}

impl PriceQuote {
    pub fn new(id: impl Into<String>, price_usd: f64, change_24h_pct: f64) -> Self {
        Self {
            id: id.into(),
            price_usd,
            change_24h_pct,
        }
    }
}

/// Quotes keyed by asset id. An id with no entry is "unpriced".
pub type QuoteMap = HashMap<String, PriceQuote>;
