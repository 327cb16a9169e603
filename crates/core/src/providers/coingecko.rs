use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::price::{PriceQuote, QuoteMap};
use crate::models::settings::DEFAULT_API_BASE_URL;
use super::traits::PriceProvider;

const PROVIDER_NAME: &str = "CoinGecko";

/// CoinGecko API provider for cryptocurrency prices.
///
/// - **Free**: No API key required (public tier is rate limited).
/// - **Endpoint**: `/simple/price?ids=a,b,c&vs_currencies=usd&include_24hr_change=true`
///
/// All requested ids go into one request, so a refresh costs one call no
/// matter how many assets are tracked.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }

    /// Point the provider at another CoinGecko-compatible API root
    /// (e.g., the pro endpoint or a local proxy).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder().build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the batched `simple/price` URL for `ids`.
    pub fn simple_price_url(&self, ids: &[String]) -> Result<Url, CoreError> {
        let mut url = Url::parse(&format!("{}/simple/price", self.base_url)).map_err(|e| {
            CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Invalid base URL {}: {e}", self.base_url),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("vs_currencies", "usd")
            .append_pair("include_24hr_change", "true");
        Ok(url)
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

/// One value of the `simple/price` response object.
/// Both fields are optional: delisted coins come back with `usd` missing or null.
#[derive(Deserialize)]
struct SimplePriceEntry {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// Turn a `simple/price` body into quotes for the requested ids.
///
/// A body that is not an object of objects is an error. Inside a valid body,
/// unknown ids, missing `usd` and negative or non-finite prices just leave
/// the id out of the map. Ids that were not requested are ignored.
pub fn parse_simple_price(body: &[u8], ids: &[String]) -> Result<QuoteMap, CoreError> {
    let parsed: HashMap<String, SimplePriceEntry> =
        serde_json::from_slice(body).map_err(|e| CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: format!("Failed to parse price response: {e}"),
        })?;

    let mut quotes = QuoteMap::with_capacity(ids.len());
    for id in ids {
        let Some(entry) = parsed.get(id) else {
            debug!("{PROVIDER_NAME} returned no price for {id}");
            continue;
        };
        let price = match entry.usd {
            Some(price) if price.is_finite() && price >= 0.0 => price,
            Some(price) => {
                warn!("{PROVIDER_NAME} returned invalid price for {id}: {price}");
                continue;
            }
            None => {
                debug!("{PROVIDER_NAME} returned no usd field for {id}");
                continue;
            }
        };
        let change = entry
            .usd_24h_change
            .filter(|c| c.is_finite())
            .unwrap_or(0.0);
        quotes.insert(id.clone(), PriceQuote::new(id.clone(), price, change));
    }

    Ok(quotes)
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_quotes(&self, ids: &[String], timeout: Duration) -> Result<QuoteMap, CoreError> {
        if ids.is_empty() {
            return Ok(QuoteMap::new());
        }

        let url = self.simple_price_url(ids)?;
        debug!("Fetching {} prices from {PROVIDER_NAME}", ids.len());

        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("HTTP {status}"),
            });
        }

        let body = resp.bytes().await.map_err(|e| request_error(e, timeout))?;
        parse_simple_price(&body, ids)
    }
}

fn request_error(e: reqwest::Error, timeout: Duration) -> CoreError {
    if e.is_timeout() {
        CoreError::Timeout(timeout)
    } else {
        CoreError::from(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn url_contains_all_ids_in_one_request() {
        let provider = CoinGeckoProvider::with_base_url("https://example.test/api/v3/");
        let url = provider
            .simple_price_url(&ids(&["bitcoin", "ethereum"]))
            .unwrap();
        assert_eq!(url.path(), "/api/v3/simple/price");
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["ids"], "bitcoin,ethereum");
        assert_eq!(pairs["vs_currencies"], "usd");
        assert_eq!(pairs["include_24hr_change"], "true");
    }

    #[test]
    fn invalid_base_url_is_api_error() {
        let provider = CoinGeckoProvider::with_base_url("not a url");
        let err = provider.simple_price_url(&ids(&["bitcoin"])).unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }));
    }

    #[test]
    fn parses_price_and_change() {
        let body = br#"{"bitcoin":{"usd":50000.0,"usd_24h_change":1.5}}"#;
        let quotes = parse_simple_price(body, &ids(&["bitcoin"])).unwrap();
        assert_eq!(quotes["bitcoin"], PriceQuote::new("bitcoin", 50000.0, 1.5));
    }

    #[test]
    fn missing_change_defaults_to_zero() {
        let body = br#"{"solana":{"usd":150}}"#;
        let quotes = parse_simple_price(body, &ids(&["solana"])).unwrap();
        assert_eq!(quotes["solana"].change_24h_pct, 0.0);
        assert_eq!(quotes["solana"].price_usd, 150.0);
    }

    #[test]
    fn unknown_and_unusable_ids_are_absent() {
        let body = br#"{
            "bitcoin": {"usd": 1.0},
            "ethereum": {"usd": null},
            "cardano": {"usd": -3.0},
            "dogecoin": {}
        }"#;
        let requested = ids(&["bitcoin", "ethereum", "cardano", "dogecoin", "ripple"]);
        let quotes = parse_simple_price(body, &requested).unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key("bitcoin"));
    }

    #[test]
    fn unrequested_ids_are_ignored() {
        let body = br#"{"bitcoin":{"usd":1.0},"ethereum":{"usd":2.0}}"#;
        let quotes = parse_simple_price(body, &ids(&["ethereum"])).unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key("ethereum"));
    }

    #[test]
    fn malformed_body_is_error() {
        assert!(parse_simple_price(b"<html>rate limited</html>", &ids(&["bitcoin"])).is_err());
        assert!(parse_simple_price(br#"{"bitcoin": 5}"#, &ids(&["bitcoin"])).is_err());
        assert!(parse_simple_price(br#"[1,2,3]"#, &ids(&["bitcoin"])).is_err());
    }

    #[test]
    fn empty_object_is_empty_map() {
        let quotes = parse_simple_price(b"{}", &ids(&["bitcoin"])).unwrap();
        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn empty_ids_skip_the_network() {
        // Unroutable base URL: any request would fail.
        let provider = CoinGeckoProvider::with_base_url("http://127.0.0.1:9");
        let quotes = provider
            .fetch_quotes(&[], Duration::from_millis(10))
            .await
            .unwrap();
        assert!(quotes.is_empty());
    }
}
