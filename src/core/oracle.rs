//! Cached, multi-source resolution of the gold spot price

use super::price::{PriceOrigin, PriceQuote, PriceSource};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_FALLBACK_PRICE: f64 = 100.45;
pub const DEFAULT_MAX_PRICE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleSettings {
    pub ttl: Duration,
    pub source_timeout: Duration,
    /// Initial cached value, used until a source succeeds.
    pub floor_price: f64,
    /// Exclusive upper sanity bound for accepted prices.
    pub max_price: f64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            floor_price: DEFAULT_FALLBACK_PRICE,
            max_price: DEFAULT_MAX_PRICE,
        }
    }
}

#[derive(Debug, Clone)]
struct PriceCacheEntry {
    value: f64,
    origin: PriceOrigin,
    fetched_at: Option<Instant>,
}

impl PriceCacheEntry {
    fn age(&self, now: Instant) -> Option<Duration> {
        self.fetched_at
            .map(|fetched_at| now.saturating_duration_since(fetched_at))
    }

    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now).is_some_and(|age| age < ttl)
    }
}

/// Point-in-time view of the cache, taken without triggering a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    pub price: f64,
    pub origin: PriceOrigin,
    pub age: Option<Duration>,
    pub fresh: bool,
}

/// Resolves the per-gram price from cache or from an ordered list of sources.
///
/// Refreshes are not coalesced: callers that see a stale entry at the same
/// time each walk the source list, and the last one to finish wins the cache.
pub struct PriceOracle {
    sources: Vec<Box<dyn PriceSource>>,
    settings: OracleSettings,
    cache: Mutex<PriceCacheEntry>,
}

impl PriceOracle {
    pub fn new(sources: Vec<Box<dyn PriceSource>>, settings: OracleSettings) -> Self {
        Self {
            sources,
            settings,
            cache: Mutex::new(PriceCacheEntry {
                value: settings.floor_price,
                origin: PriceOrigin::Fallback,
                fetched_at: None,
            }),
        }
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    fn is_acceptable(&self, value: f64) -> bool {
        value.is_finite() && value > 0.0 && value < self.settings.max_price
    }

    /// Returns the current price. Never fails: when every source is down the
    /// last cached value (or the floor) is returned.
    #[instrument(name = "ResolveGoldPrice", skip(self))]
    pub async fn resolve(&self) -> PriceQuote {
        {
            let cache = self.cache.lock().await;
            let now = Instant::now();
            if cache.is_fresh(now, self.settings.ttl) {
                debug!(price = cache.value, "Using cached gold price");
                return PriceQuote {
                    price: cache.value,
                    origin: cache.origin.clone(),
                    cached: true,
                    age: cache.age(now),
                };
            }
        }

        for source in &self.sources {
            let value = match timeout(self.settings.source_timeout, source.attempt()).await {
                Ok(Ok(value)) => value,
                Ok(Err(e)) => {
                    warn!(source = source.name(), error = %e, "Price source failed");
                    continue;
                }
                Err(_) => {
                    warn!(
                        source = source.name(),
                        timeout = ?self.settings.source_timeout,
                        "Price source timed out"
                    );
                    continue;
                }
            };

            if !self.is_acceptable(value) {
                warn!(source = source.name(), value, "Price source returned an invalid price");
                continue;
            }

            let origin = if source.is_live() {
                PriceOrigin::Live(source.name().to_string())
            } else {
                PriceOrigin::Fallback
            };
            let mut cache = self.cache.lock().await;
            *cache = PriceCacheEntry {
                value,
                origin: origin.clone(),
                fetched_at: Some(Instant::now()),
            };
            info!(price = value, source = source.name(), "Refreshed gold price");
            return PriceQuote {
                price: value,
                origin,
                cached: false,
                age: Some(Duration::ZERO),
            };
        }

        let cache = self.cache.lock().await;
        warn!(price = cache.value, "All price sources failed, serving last known price");
        PriceQuote {
            price: cache.value,
            origin: cache.origin.clone(),
            cached: true,
            age: cache.age(Instant::now()),
        }
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        let cache = self.cache.lock().await;
        let now = Instant::now();
        CacheSnapshot {
            price: cache.value,
            origin: cache.origin.clone(),
            age: cache.age(now),
            fresh: cache.is_fresh(now, self.settings.ttl),
        }
    }
}
