use super::util::fetch_json;
use crate::core::price::PriceSource;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Grams in one troy ounce.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1035;

#[derive(Debug, Deserialize)]
struct MetalPriceResponse {
    rates: Option<MetalRates>,
}

#[derive(Debug, Deserialize)]
struct MetalRates {
    #[serde(rename = "XAU")]
    xau: Option<f64>,
}

/// MetalPriceAPI reports gold as troy ounces per USD; this inverts the rate
/// and converts it to USD per gram.
pub struct MetalPriceApiSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MetalPriceApiSource {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

/// Converts a troy-ounces-per-USD rate into USD per gram.
pub fn per_gram_from_inverse_rate(ounces_per_usd: f64) -> Result<f64> {
    if !ounces_per_usd.is_finite() || ounces_per_usd <= 0.0 {
        return Err(anyhow!("Invalid XAU rate: {}", ounces_per_usd));
    }
    Ok((1.0 / ounces_per_usd) / GRAMS_PER_TROY_OUNCE)
}

#[async_trait]
impl PriceSource for MetalPriceApiSource {
    fn name(&self) -> &str {
        "MetalPriceAPI"
    }

    #[instrument(name = "MetalPriceApiFetch", skip(self))]
    async fn attempt(&self) -> Result<f64> {
        let url = format!(
            "{}/v1/latest?api_key={}&base=USD&currencies=XAU",
            self.base_url, self.api_key
        );
        debug!("Requesting XAU rate from {}/v1/latest", self.base_url);

        let data: MetalPriceResponse = fetch_json(self.client.get(&url), self.name()).await?;

        let rate = data
            .rates
            .and_then(|rates| rates.xau)
            .ok_or_else(|| anyhow!("Invalid response format from MetalPriceAPI"))?;

        per_gram_from_inverse_rate(rate)
    }
}
