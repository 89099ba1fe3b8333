use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

/// GET-and-parse-JSON capability used by the signal fetcher.
///
/// A direct implementation talks to the upstream itself; a network-mediated
/// one may route through an oracle node. Any `Err` is treated as a transient
/// upstream failure by the caller.
#[async_trait::async_trait]
pub trait JsonFetcher: Send + Sync {
    fn fetcher_name(&self) -> &'static str;

    async fn get_json(&self, url: &str) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonFetcher {
    http: reqwest::Client,
}

impl HttpJsonFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linkforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build signal http client")?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl JsonFetcher for HttpJsonFetcher {
    fn fetcher_name(&self) -> &'static str {
        "direct_http_json"
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let res = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("upstream request failed: {url}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read upstream response")?;

        if !status.is_success() {
            anyhow::bail!("upstream HTTP {status}: {url}");
        }

        serde_json::from_str::<Value>(&text)
            .with_context(|| format!("upstream response is not valid JSON: {url}"))
    }
}
