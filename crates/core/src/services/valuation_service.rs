use crate::models::holding::Holding;
use crate::models::price::QuoteMap;
use crate::models::snapshot::{PortfolioSnapshot, SnapshotEntry};

/// Combines holdings with the latest quotes into a snapshot.
///
/// Pure business logic: no I/O, no clock, no state.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Value every holding at its quote.
    ///
    /// Holdings without a quote stay in the snapshot with `value_usd == 0.0`
    /// and `unpriced == true`. The total is accumulated in entry order, so it
    /// is exactly the sum of the entries' values.
    pub fn compute_snapshot(&self, holdings: &[Holding], quotes: &QuoteMap) -> PortfolioSnapshot {
        let entries: Vec<SnapshotEntry> = holdings
            .iter()
            .map(|holding| match quotes.get(&holding.id) {
                Some(quote) => SnapshotEntry {
                    holding: holding.clone(),
                    quote: Some(quote.clone()),
                    value_usd: holding.amount * quote.price_usd,
                    unpriced: false,
                },
                None => SnapshotEntry {
                    holding: holding.clone(),
                    quote: None,
                    value_usd: 0.0,
                    unpriced: true,
                },
            })
            .collect();

        let total_value_usd = entries.iter().fold(0.0, |acc, e| acc + e.value_usd);

        PortfolioSnapshot {
            entries,
            total_value_usd,
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
