use super::util::fetch_json;
use crate::core::price::PriceSource;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct GoldApiResponse {
    price_gram_24k: Option<f64>,
}

/// GoldAPI.io quotes 24k gold per gram directly.
pub struct GoldApiSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoldApiSource {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for GoldApiSource {
    fn name(&self) -> &str {
        "GoldAPI.io"
    }

    #[instrument(name = "GoldApiFetch", skip(self))]
    async fn attempt(&self) -> Result<f64> {
        let url = format!("{}/api/XAU/USD", self.base_url);
        debug!("Requesting gold price from {}", url);

        let request = self
            .client
            .get(&url)
            .header("x-access-token", &self.api_key)
            .header("Content-Type", "application/json");
        let data: GoldApiResponse = fetch_json(request, self.name()).await?;

        data.price_gram_24k
            .ok_or_else(|| anyhow!("Invalid response format from GoldAPI"))
    }
}
