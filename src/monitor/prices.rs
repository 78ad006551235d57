//! Price lookup sources.
//!
//! The monitor only needs indicative USD prices for reporting, so the
//! lookup is infallible: unknown symbols and failed fetches resolve to a
//! default of 1.0. Sources are swappable behind [`PriceSource`] without
//! touching detection logic.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, warn};

/// Price a token symbol in USD.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn price_usd(&self, symbol: &str) -> f64;
}

/// Default price returned for symbols no source knows about.
pub const DEFAULT_PRICE_USD: f64 = 1.0;

/// Fixed symbol -> USD lookup table.
pub struct StaticPriceTable {
    prices: HashMap<&'static str, f64>,
}

impl StaticPriceTable {
    pub fn new() -> Self {
        let prices = HashMap::from([
            ("UNI", 12.45),
            ("LINK", 18.20),
            ("AAVE", 95.30),
            ("COMP", 75.15),
            ("CRV", 0.85),
            ("SUSHI", 2.15),
            ("PEPE", 0.00002),
            ("SHIB", 0.000025),
            ("FLOKI", 0.00015),
            ("USDC", 1.00),
            ("USDT", 1.00),
            ("DAI", 1.00),
            ("APE", 3.20),
            ("SAND", 0.45),
            ("MANA", 0.65),
            ("MATIC", 0.85),
            ("ARB", 1.25),
        ]);
        Self { prices }
    }
}

impl Default for StaticPriceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for StaticPriceTable {
    async fn price_usd(&self, symbol: &str) -> f64 {
        self.prices.get(symbol).copied().unwrap_or(DEFAULT_PRICE_USD)
    }
}

/// Live price source backed by the CoinGecko simple-price endpoint.
///
/// Responses are cached with a short TTL so repeated lookups within one
/// scan window hit the cache, not the API.
pub struct CoinGeckoPriceSource {
    http_client: Client,
    cache: Cache<String, f64>,
    coingecko_ids: HashMap<&'static str, &'static str>,
}

impl CoinGeckoPriceSource {
    pub fn new(http_client: Client, cache_ttl: Duration) -> Self {
        let coingecko_ids = HashMap::from([
            ("UNI", "uniswap"),
            ("LINK", "chainlink"),
            ("AAVE", "aave"),
            ("COMP", "compound-governance-token"),
            ("CRV", "curve-dao-token"),
            ("SUSHI", "sushi"),
            ("PEPE", "pepe"),
            ("SHIB", "shiba-inu"),
            ("FLOKI", "floki"),
            ("USDC", "usd-coin"),
            ("USDT", "tether"),
            ("DAI", "dai"),
            ("APE", "apecoin"),
            ("SAND", "the-sandbox"),
            ("MANA", "decentraland"),
            ("MATIC", "matic-network"),
            ("ARB", "arbitrum"),
        ]);

        Self {
            http_client,
            cache: Cache::builder().time_to_live(cache_ttl).build(),
            coingecko_ids,
        }
    }

    async fn fetch_price(&self, coingecko_id: &str) -> anyhow::Result<f64> {
        let url = format!(
            "https://api.coingecko.com/api/v3/simple/price?ids={}&vs_currencies=usd",
            coingecko_id
        );

        let retry_strategy = ExponentialBackoff::from_millis(500)
            .max_delay(Duration::from_secs(3))
            .take(3);

        Retry::spawn(retry_strategy, || async {
            let response = self
                .http_client
                .get(&url)
                .timeout(Duration::from_secs(10))
                .send()
                .await?
                .json::<serde_json::Value>()
                .await?;

            let price = response[coingecko_id]["usd"]
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("No USD price in response for {}", coingecko_id))?;

            debug!("Fetched price for {}: ${}", coingecko_id, price);
            Ok(price)
        })
        .await
    }
}

#[async_trait]
impl PriceSource for CoinGeckoPriceSource {
    async fn price_usd(&self, symbol: &str) -> f64 {
        let Some(coingecko_id) = self.coingecko_ids.get(symbol).copied() else {
            return DEFAULT_PRICE_USD;
        };

        if let Some(price) = self.cache.get(symbol).await {
            return price;
        }

        match self.fetch_price(coingecko_id).await {
            Ok(price) => {
                self.cache.insert(symbol.to_string(), price).await;
                price
            }
            Err(e) => {
                warn!("Price lookup failed for {}: {}", symbol, e);
                DEFAULT_PRICE_USD
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_table_known_symbol() {
        let table = StaticPriceTable::new();
        assert_eq!(table.price_usd("UNI").await, 12.45);
        assert_eq!(table.price_usd("USDC").await, 1.0);
    }

    #[tokio::test]
    async fn test_static_table_unknown_symbol_defaults() {
        let table = StaticPriceTable::new();
        assert_eq!(table.price_usd("NOCOIN").await, DEFAULT_PRICE_USD);
    }

    #[tokio::test]
    async fn test_coingecko_unknown_symbol_skips_network() {
        // Unmapped symbols resolve locally without touching the API
        let source = CoinGeckoPriceSource::new(Client::new(), Duration::from_secs(60));
        assert_eq!(source.price_usd("NOCOIN").await, DEFAULT_PRICE_USD);
    }
}
