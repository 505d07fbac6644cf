use super::oracle::{
    DEFAULT_FALLBACK_PRICE, DEFAULT_MAX_PRICE, DEFAULT_SOURCE_TIMEOUT, DEFAULT_TTL, OracleSettings,
};
use super::ratelimit::RateLimitRule;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Key rate limits on the first `X-Forwarded-For` hop. Only enable this
    /// behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:5000".to_string(),
            trust_forwarded_for: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OracleConfig {
    pub ttl_secs: u64,
    pub timeout_secs: u64,
    pub fallback_price: f64,
    pub max_price: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            ttl_secs: DEFAULT_TTL.as_secs(),
            timeout_secs: DEFAULT_SOURCE_TIMEOUT.as_secs(),
            fallback_price: DEFAULT_FALLBACK_PRICE,
            max_price: DEFAULT_MAX_PRICE,
        }
    }
}

impl OracleConfig {
    pub fn settings(&self) -> OracleSettings {
        OracleSettings {
            ttl: Duration::from_secs(self.ttl_secs),
            source_timeout: Duration::from_secs(self.timeout_secs),
            floor_price: self.fallback_price,
            max_price: self.max_price,
        }
    }

    /// The fallback has to be a price the oracle itself would accept.
    pub fn validate(&self) -> Result<()> {
        if !self.max_price.is_finite() || self.max_price <= 0.0 {
            bail!("oracle.max_price must be a positive number, got {}", self.max_price);
        }
        if !self.fallback_price.is_finite()
            || self.fallback_price <= 0.0
            || self.fallback_price >= self.max_price
        {
            bail!(
                "oracle.fallback_price must be greater than 0 and less than max_price ({}), got {}",
                self.max_price,
                self.fallback_price
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub metal_price_api: SourceConfig,
    pub gold_api: SourceConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            metal_price_api: SourceConfig {
                base_url: "https://api.metalpriceapi.com".to_string(),
                api_key: None,
            },
            gold_api: SourceConfig {
                base_url: "https://www.goldapi.io".to_string(),
                api_key: None,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct LimitConfig {
    pub window_secs: u64,
    pub max_requests: usize,
}

impl LimitConfig {
    pub fn rule(&self, name: &str) -> RateLimitRule {
        RateLimitRule::new(name, Duration::from_secs(self.window_secs), self.max_requests)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RateLimitsConfig {
    pub general: LimitConfig,
    pub products: LimitConfig,
    pub gold_price: LimitConfig,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        RateLimitsConfig {
            general: LimitConfig {
                window_secs: 15 * 60,
                max_requests: 100,
            },
            products: LimitConfig {
                window_secs: 60,
                max_requests: 30,
            },
            gold_price: LimitConfig {
                window_secs: 5 * 60,
                max_requests: 10,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub environment: Environment,
    pub server: ServerConfig,
    pub oracle: OracleConfig,
    pub providers: ProvidersConfig,
    pub rate_limits: RateLimitsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            catalog_path: PathBuf::from("products.json"),
            environment: Environment::default(),
            server: ServerConfig::default(),
            oracle: OracleConfig::default(),
            providers: ProvidersConfig::default(),
            rate_limits: RateLimitsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file if it exists, otherwise the built-in
    /// defaults. Environment overrides apply in both cases.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            return Self::load_from_path(&config_path);
        }
        debug!("No config file at {}, using defaults", config_path.display());
        Ok(Self::default().with_env_overrides())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "aurum", "aurum")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::parse(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config.with_env_overrides())
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        // An empty document deserializes to `null`, which is not a mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.oracle.validate()
    }

    /// Applies `METAL_API_KEY`, `GOLDAPI_KEY`, `AURUM_ENV` and `PORT`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("METAL_API_KEY") {
            self.providers.metal_price_api.api_key = Some(key);
        }
        if let Some(key) = non_empty("GOLDAPI_KEY") {
            self.providers.gold_api.api_key = Some(key);
        }
        if let Some(env) = non_empty("AURUM_ENV") {
            match env.to_lowercase().as_str() {
                "production" => self.environment = Environment::Production,
                "development" => self.environment = Environment::Development,
                other => debug!("Ignoring unknown AURUM_ENV value: {other}"),
            }
        }
        if let Some(port) = non_empty("PORT").and_then(|p| p.parse::<u16>().ok()) {
            let host = self
                .server
                .bind
                .rsplit_once(':')
                .map_or("127.0.0.1", |(host, _)| host)
                .to_string();
            self.server.bind = format!("{host}:{port}");
        }
        self
    }
}
