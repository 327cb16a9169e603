use serde::{Deserialize, Serialize};

/// A user's recorded position in one asset.
///
/// Holdings do NOT store prices. Prices arrive with every refresh and are
/// combined with holdings into a `PortfolioSnapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Asset id as known to the price API (e.g., "bitcoin")
    pub id: String,

    /// Quantity owned (always finite and > 0)
    pub amount: f64,
}

impl Holding {
    pub fn new(id: impl Into<String>, amount: f64) -> Self {
        Self {
            id: id.into(),
            amount,
        }
    }
}

/// Amounts must be finite and strictly positive.
pub fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}
