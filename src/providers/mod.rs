pub mod fixed;
pub mod gold_api;
pub mod metal_price_api;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::price::PriceSource;
use fixed::FixedPriceSource;
use gold_api::GoldApiSource;
use anyhow::Result;
use metal_price_api::MetalPriceApiSource;
use tracing::info;

/// Builds the source chain in priority order. Live sources without an API
/// key are left out; the fixed fallback always closes the chain. The live
/// sources share one HTTP client and its connection pool.
pub fn build_sources(config: &AppConfig) -> Result<Vec<Box<dyn PriceSource>>> {
    let mut sources: Vec<Box<dyn PriceSource>> = Vec::new();
    let providers = &config.providers;
    let client = util::http_client()?;

    match providers.metal_price_api.api_key.as_deref() {
        Some(key) => sources.push(Box::new(MetalPriceApiSource::new(
            client.clone(),
            &providers.metal_price_api.base_url,
            key,
        ))),
        None => info!("METAL_API_KEY not set, skipping MetalPriceAPI"),
    }
    match providers.gold_api.api_key.as_deref() {
        Some(key) => sources.push(Box::new(GoldApiSource::new(
            client.clone(),
            &providers.gold_api.base_url,
            key,
        ))),
        None => info!("GOLDAPI_KEY not set, skipping GoldAPI.io"),
    }
    sources.push(Box::new(FixedPriceSource::new(config.oracle.fallback_price)));

    Ok(sources)
}
