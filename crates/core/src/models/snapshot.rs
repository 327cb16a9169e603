use serde::{Deserialize, Serialize};

use super::asset::AssetCatalog;
use super::holding::Holding;
use super::price::PriceQuote;

/// Placeholder shown in price/change cells of holdings without a quote.
pub const UNPRICED_LABEL: &str = "n/a";

/// One row of the valuation: a holding, its quote (if any) and its USD value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub holding: Holding,
    pub quote: Option<PriceQuote>,
    /// `amount * price_usd`, or `0.0` when unpriced.
    pub value_usd: f64,
    /// Set when the latest fetch had no price for this holding's id.
    pub unpriced: bool,
}

/// Fully recomputed valuation of the portfolio at one point in time.
///
/// Entries follow holding order. Never mutated after construction;
/// every refresh produces a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub entries: Vec<SnapshotEntry>,
    pub total_value_usd: f64,
}

impl PortfolioSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unpriced_count(&self) -> usize {
        self.entries.iter().filter(|e| e.unpriced).count()
    }

    /// Display-ready rows in the layout of the portfolio table.
    pub fn rows(&self, catalog: &AssetCatalog) -> Vec<DisplayRow> {
        self.entries
            .iter()
            .map(|entry| DisplayRow {
                name: catalog.display_name(&entry.holding.id),
                amount: format_amount(entry.holding.amount),
                price: entry
                    .quote
                    .as_ref()
                    .map(|q| format_usd(q.price_usd))
                    .unwrap_or_else(|| UNPRICED_LABEL.to_string()),
                value: format_usd(entry.value_usd),
                change_24h: entry
                    .quote
                    .as_ref()
                    .map(|q| format_change(q.change_24h_pct))
                    .unwrap_or_else(|| UNPRICED_LABEL.to_string()),
                unpriced: entry.unpriced,
            })
            .collect()
    }

    pub fn formatted_total(&self) -> String {
        format_usd(self.total_value_usd)
    }
}

/// Pre-formatted strings for one table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub name: String,
    pub amount: String,
    pub price: String,
    pub value: String,
    pub change_24h: String,
    pub unpriced: bool,
}

/// Coin quantities are shown with 8 decimals (satoshi precision).
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.8}")
}

pub fn format_usd(value: f64) -> String {
    format!("${value:.2}")
}

/// Signed percentage, e.g. "+1.50%" or "-0.25%".
pub fn format_change(pct: f64) -> String {
    format!("{pct:+.2}%")
}
