use crate::core::price::PriceSource;
use anyhow::Result;
use async_trait::async_trait;

/// Terminal source that always answers with a configured constant.
pub struct FixedPriceSource {
    price: f64,
}

impl FixedPriceSource {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    fn name(&self) -> &str {
        "Fallback"
    }

    fn is_live(&self) -> bool {
        false
    }

    async fn attempt(&self) -> Result<f64> {
        Ok(self.price)
    }
}
