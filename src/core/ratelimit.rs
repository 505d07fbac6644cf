//! Per-client sliding-window admission control

use super::error::AppError;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Sliding-window limiter keyed by client identity.
///
/// Each key keeps the timestamps of its admitted requests. Stale timestamps
/// are only pruned when that key is checked again; idle keys are never swept.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits the request if `key` made fewer than `max` requests in the
    /// trailing `window`, recording it when admitted.
    pub async fn admit(&self, key: &str, window: Duration, max: usize) -> bool {
        self.admit_at(key, window, max, Instant::now()).await
    }

    pub async fn admit_at(&self, key: &str, window: Duration, max: usize, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;
        let timestamps = windows.entry(key.to_string()).or_default();

        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) < window {
                break;
            }
            timestamps.pop_front();
        }

        if timestamps.len() >= max {
            debug!(key, count = timestamps.len(), max, "Rate window full");
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Number of keys currently holding a window entry.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Seconds a rejected client should wait, rounded up.
pub fn retry_after_secs(window: Duration) -> u64 {
    window.as_millis().div_ceil(1000) as u64
}

/// A named `(window, max)` limit bound to one route group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    pub name: String,
    pub window: Duration,
    pub max_requests: usize,
}

impl RateLimitRule {
    pub fn new(name: &str, window: Duration, max_requests: usize) -> Self {
        Self {
            name: name.to_string(),
            window,
            max_requests,
        }
    }
}

/// A rule together with its own key table.
#[derive(Debug)]
pub struct RateLimitLayer {
    rule: RateLimitRule,
    limiter: RateLimiter,
}

impl RateLimitLayer {
    pub fn new(rule: RateLimitRule) -> Self {
        Self {
            rule,
            limiter: RateLimiter::new(),
        }
    }

    pub fn rule(&self) -> &RateLimitRule {
        &self.rule
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        if self
            .limiter
            .admit(key, self.rule.window, self.rule.max_requests)
            .await
        {
            Ok(())
        } else {
            warn!(key, layer = %self.rule.name, "Rate limit exceeded");
            Err(AppError::RateLimited {
                retry_after_secs: retry_after_secs(self.rule.window),
            })
        }
    }
}

/// Runs `key` through each layer in order, stopping at the first rejection.
pub async fn check_layers(layers: &[&RateLimitLayer], key: &str) -> Result<(), AppError> {
    for layer in layers {
        layer.check(key).await?;
    }
    Ok(())
}
