use serde::{Deserialize, Serialize};

/// A trackable cryptocurrency.
///
/// **Equality and hashing** are based solely on `id`, NOT on `name` or
/// `symbol`. The id is what the price API keys its responses by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// CoinGecko asset id, lowercase (e.g., "bitcoin", "matic-network")
    pub id: String,

    /// Human-readable name (e.g., "Bitcoin", "Polygon")
    pub name: String,

    /// Ticker symbol, uppercased (e.g., "BTC", "MATIC")
    pub symbol: String,
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Asset {}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Asset {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into().to_lowercase(),
            name: name.into(),
            symbol: symbol.into().to_uppercase(),
        }
    }

    /// Label shown in pickers and table rows, e.g. "Bitcoin (BTC)".
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

/// Assets shipped with the application: (id, name, symbol).
const BUILTIN_ASSETS: &[(&str, &str, &str)] = &[
    ("bitcoin", "Bitcoin", "BTC"),
    ("ethereum", "Ethereum", "ETH"),
    ("cardano", "Cardano", "ADA"),
    ("solana", "Solana", "SOL"),
    ("binancecoin", "Binance Coin", "BNB"),
    ("ripple", "Ripple", "XRP"),
    ("polkadot", "Polkadot", "DOT"),
    ("dogecoin", "Dogecoin", "DOGE"),
    ("matic-network", "Polygon", "MATIC"),
    ("avalanche-2", "Avalanche", "AVAX"),
];

/// Read-only table of the assets a user may hold.
///
/// Built once at startup and shared by value; it decides which ids
/// `HoldingStore::add` accepts and which ids are requested on every refresh.
/// Order is preserved so pickers list assets the same way every time.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCatalog {
    assets: Vec<Asset>,
}

impl AssetCatalog {
    /// Build a catalog from an explicit list. Later duplicates of an id are dropped.
    pub fn new(assets: Vec<Asset>) -> Self {
        let mut unique: Vec<Asset> = Vec::with_capacity(assets.len());
        for asset in assets {
            if !unique.contains(&asset) {
                unique.push(asset);
            }
        }
        Self { assets: unique }
    }

    /// The ten assets the application supports out of the box.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_ASSETS
                .iter()
                .map(|(id, name, symbol)| Asset::new(*id, *name, *symbol))
                .collect(),
        )
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Display label for an id, falling back to the raw id for assets
    /// that are no longer in the catalog (e.g. loaded from an older file).
    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .map(Asset::display_name)
            .unwrap_or_else(|| id.to_string())
    }

    /// Reverse lookup: "Bitcoin (BTC)" → "bitcoin".
    pub fn id_for_display_name(&self, display_name: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| a.display_name() == display_name)
            .map(|a| a.id.as_str())
    }

    /// All ids, in catalog order.
    pub fn ids(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.id.clone()).collect()
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
