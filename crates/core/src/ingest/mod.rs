pub mod provider;
pub mod retry;
pub mod types;

use crate::domain::signals::SignalReadings;
use crate::ingest::provider::JsonFetcher;
use crate::ingest::retry::{fetch_with_fallback, RetryPolicy};
use crate::scoring::normalize::{canonicalize, NEUTRAL_FEAR_GREED};
use std::sync::Arc;

pub const DEFAULT_FEAR_GREED_URL: &str = "https://api.alternative.me/fng/?limit=1";
pub const MARKET_DATA_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_ASSETS: [&str; 2] = ["ethereum", "bitcoin"];

/// Simple-price query requesting exactly `assets` with their 24h change.
pub fn market_data_url<S: AsRef<str>>(assets: &[S]) -> String {
    let ids: Vec<&str> = assets.iter().map(|a| a.as_ref()).collect();
    format!(
        "{MARKET_DATA_PRICE_URL}?ids={}&vs_currencies=usd&include_24hr_change=true",
        ids.join(",")
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub fear_greed_url: String,
    pub market_data_url: String,
    /// Asset ids read from the market data response.
    pub assets: Vec<String>,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            fear_greed_url: DEFAULT_FEAR_GREED_URL.to_string(),
            market_data_url: market_data_url(&DEFAULT_ASSETS),
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches the sentiment index and market changes and normalizes them.
#[derive(Clone)]
pub struct SignalFetcher {
    http: Arc<dyn JsonFetcher>,
    config: FetchConfig,
}

impl SignalFetcher {
    pub fn new(http: Arc<dyn JsonFetcher>, config: FetchConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Both upstreams are queried concurrently. Infallible: each side falls
    /// back independently.
    pub async fn fetch_aggregated_signals(&self) -> SignalReadings {
        let fear_greed = fetch_with_fallback(
            self.http.as_ref(),
            &self.config.retry,
            "fear_greed",
            &self.config.fear_greed_url,
            NEUTRAL_FEAR_GREED,
            types::parse_fear_greed,
        );

        let assets = &self.config.assets;
        let market = fetch_with_fallback(
            self.http.as_ref(),
            &self.config.retry,
            "market_data",
            &self.config.market_data_url,
            Vec::new(),
            |body| types::parse_market_changes(body, assets),
        );

        let (fear_greed, market) = tokio::join!(fear_greed, market);

        tracing::debug!(
            fetcher = self.http.fetcher_name(),
            fear_greed = fear_greed.value,
            fear_greed_source = fear_greed.source.as_str(),
            assets = market.value.len(),
            market_source = market.source.as_str(),
            "signals fetched"
        );

        canonicalize(fear_greed, market)
    }
}
