//! Spot price sources and quotes

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;
use std::time::Duration;

/// One place the per-gram gold price can come from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the value comes from a live market feed rather than a constant.
    fn is_live(&self) -> bool {
        true
    }

    /// Fetches the price in USD per gram. Range checks are the caller's job.
    async fn attempt(&self) -> Result<f64>;
}

/// Where the value held by the oracle originally came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceOrigin {
    Live(String),
    Fallback,
}

impl Display for PriceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceOrigin::Live(name) => write!(f, "{name}"),
            PriceOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// The result of resolving the current price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub price: f64,
    pub origin: PriceOrigin,
    /// `true` when served from cache without contacting any source.
    pub cached: bool,
    /// Time since the value was last refreshed; `None` if it never was.
    pub age: Option<Duration>,
}

impl PriceQuote {
    pub fn is_live(&self) -> bool {
        matches!(self.origin, PriceOrigin::Live(_))
    }

    pub fn age_secs(&self) -> u64 {
        self.age.map_or(0, |age| age.as_secs_f64().round() as u64)
    }
}
