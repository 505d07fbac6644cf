//! HTTP surface over the catalog service

pub mod handlers;
pub mod response;

use crate::core::catalog::JsonCatalog;
use crate::core::config::{AppConfig, Environment, RateLimitsConfig};
use crate::core::oracle::PriceOracle;
use crate::core::ratelimit::RateLimitLayer;
use crate::core::service::CatalogService;
use crate::providers;
use anyhow::{Context, Result};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use warp::{Filter, Rejection, Reply};

/// Process-wide state shared by every request.
pub struct AppState {
    pub service: CatalogService,
    pub environment: Environment,
    pub general: RateLimitLayer,
    pub products: RateLimitLayer,
    pub gold_price: RateLimitLayer,
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(service: CatalogService, environment: Environment, limits: &RateLimitsConfig) -> Self {
        Self {
            service,
            environment,
            general: RateLimitLayer::new(limits.general.rule("general")),
            products: RateLimitLayer::new(limits.products.rule("products")),
            gold_price: RateLimitLayer::new(limits.gold_price.rule("gold_price")),
            trust_forwarded_for: false,
        }
    }

    pub fn trusting_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let oracle = PriceOracle::new(providers::build_sources(config)?, config.oracle.settings());
        let service = CatalogService::new(JsonCatalog::new(&config.catalog_path), oracle);
        Ok(Self::new(service, config.environment, &config.rate_limits)
            .trusting_forwarded_for(config.server.trust_forwarded_for))
    }
}

/// Derives the rate-limit key. The first `X-Forwarded-For` hop is used only
/// when `trust_forwarded_for` is set; otherwise the peer address.
pub fn client_key(
    forwarded_for: Option<&str>,
    remote: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    forwarded_for
        .filter(|_| trust_forwarded_for)
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

fn with_client(
    trust_forwarded_for: bool,
) -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::optional::<String>("x-forwarded-for")
        .and(warp::addr::remote())
        .map(move |forwarded: Option<String>, remote: Option<SocketAddr>| {
            client_key(forwarded.as_deref(), remote, trust_forwarded_for)
        })
}

/// The full route tree. Unmatched requests end in the 404 handler, so the
/// tree never rejects.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let trust = state.trust_forwarded_for;

    let products = warp::path!("api" / "products")
        .and(warp::get())
        .and(with_state(Arc::clone(&state)))
        .and(with_client(trust))
        .and(warp::query::<Vec<(String, String)>>())
        .then(handlers::list_products);

    let product = warp::path!("api" / "products" / String)
        .and(warp::get())
        .and(with_state(Arc::clone(&state)))
        .and(with_client(trust))
        .then(|id: String, state: Arc<AppState>, client: String| {
            handlers::get_product(state, client, id)
        });

    let gold_price = warp::path!("api" / "gold-price")
        .and(warp::get())
        .and(with_state(Arc::clone(&state)))
        .and(with_client(trust))
        .then(handlers::gold_price);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state))
        .then(handlers::health);

    let index = warp::path::end().and(warp::get()).then(handlers::index);

    let not_found = warp::any().then(handlers::not_found);

    products
        .or(product)
        .or(gold_price)
        .or(health)
        .or(index)
        .or(not_found)
}

/// Binds the API and serves until Ctrl-C.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind))?;

    let state = Arc::new(AppState::from_config(config)?);
    info!(
        sources = ?state.service.oracle().source_names(),
        catalog = %config.catalog_path.display(),
        environment = config.environment.as_str(),
        trust_forwarded_for = state.trust_forwarded_for,
        "Starting aurum API"
    );

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type", "Authorization", "x-access-token"]);
    let api = routes(state)
        .with(cors)
        .with(warp::trace::request());

    let (bound, server) = warp::serve(api)
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{bound}");
    server.await;
    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::oracle::OracleSettings;
    use crate::providers::fixed::FixedPriceSource;
    use serde_json::Value;
    use std::io::Write;
    use warp::http::StatusCode;

    const CATALOG: &str = r#"[
        {"name": "Plain Band", "popularityScore": 0.0, "weight": 1.0, "images": {"yellow": "y.jpg"}},
        {"name": "Star Ring", "popularityScore": 1.0, "weight": 1.0},
        {"name": "Mid Hoop", "popularityScore": 0.5, "weight": 2.0}
    ]"#;

    fn test_state(catalog: &str, limits: RateLimitsConfig) -> (Arc<AppState>, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(catalog.as_bytes()).unwrap();
        let oracle = PriceOracle::new(
            vec![Box::new(FixedPriceSource::new(100.0))],
            OracleSettings::default(),
        );
        let service = CatalogService::new(JsonCatalog::new(file.path()), oracle);
        (
            Arc::new(AppState::new(service, Environment::Production, &limits)),
            file,
        )
    }

    fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    fn peer(addr: &str) -> SocketAddr {
        addr.parse().unwrap()
    }

    #[test]
    fn test_client_key() {
        let remote = peer("10.1.2.3:5555");
        assert_eq!(client_key(Some("203.0.113.9, 10.0.0.1"), Some(remote), true), "203.0.113.9");
        assert_eq!(client_key(Some("  "), Some(remote), true), "10.1.2.3");
        assert_eq!(client_key(None, Some(remote), true), "10.1.2.3");
        assert_eq!(client_key(None, None, true), "unknown");
    }

    #[test]
    fn test_from_config_carries_proxy_trust() {
        let mut config = AppConfig::default();
        assert!(!AppState::from_config(&config).unwrap().trust_forwarded_for);

        config.server.trust_forwarded_for = true;
        let state = AppState::from_config(&config).unwrap();
        assert!(state.trust_forwarded_for);
        assert_eq!(state.service.oracle().source_names(), vec!["Fallback"]);
    }

    #[test]
    fn test_client_key_ignores_untrusted_header() {
        let remote = peer("10.1.2.3:5555");
        assert_eq!(client_key(Some("203.0.113.9"), Some(remote), false), "10.1.2.3");
        assert_eq!(client_key(Some("203.0.113.9"), None, false), "unknown");
    }

    #[tokio::test]
    async fn test_list_products() {
        let (state, _file) = test_state(CATALOG, RateLimitsConfig::default());
        let api = routes(state);

        let response = warp::test::request()
            .path("/api/products?minPrice=100&maxPrice=250&sortBy=price&sortOrder=desc")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body(&response);
        assert_eq!(json["success"], true);
        assert_eq!(json["totalProducts"], 3);
        assert_eq!(json["filteredCount"], 2);
        assert_eq!(json["goldPrice"], 100.0);
        assert_eq!(json["goldPriceSource"], "fallback");
        assert_eq!(json["filters"]["minPrice"], 100.0);
        assert!(json["filters"].get("minRating").is_none());
        assert_eq!(json["sort"]["sortBy"], "price");
        assert_eq!(json["data"][0]["name"], "Star Ring");
        assert_eq!(json["data"][0]["price"], 200.0);
        assert_eq!(json["data"][0]["popularityRating"], 5.0);
        assert_eq!(json["data"][1]["name"], "Plain Band");
        assert_eq!(json["data"][1]["images"]["yellow"], "y.jpg");
    }

    #[tokio::test]
    async fn test_validation_error() {
        let (state, _file) = test_state(CATALOG, RateLimitsConfig::default());
        let api = routes(state);

        let response = warp::test::request()
            .path("/api/products?minPrice=abc&minRating=4&maxRating=1")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body(&response);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_not_found() {
        let (state, _file) = test_state("[]", RateLimitsConfig::default());
        let api = routes(state);

        let response = warp::test::request().path("/api/products").reply(&api).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response)["error"], "No products found in catalog");
    }

    #[tokio::test]
    async fn test_single_product() {
        let (state, _file) = test_state(CATALOG, RateLimitsConfig::default());
        let api = routes(state);

        let response = warp::test::request().path("/api/products/3").reply(&api).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body(&response);
        assert_eq!(json["data"]["id"], 3);
        assert_eq!(json["data"]["price"], 300.0);

        let response = warp::test::request().path("/api/products/9").reply(&api).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = warp::test::request().path("/api/products/abc").reply(&api).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_gold_price_rate_limited() {
        let mut limits = RateLimitsConfig::default();
        limits.gold_price.max_requests = 2;
        limits.gold_price.window_secs = 300;
        let (state, _file) = test_state(CATALOG, limits);
        let api = routes(state);

        for _ in 0..2 {
            let response = warp::test::request()
                .path("/api/gold-price")
                .remote_addr(peer("198.51.100.7:40000"))
                .reply(&api)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body(&response)["goldPrice"], 100.0);
        }

        let response = warp::test::request()
            .path("/api/gold-price")
            .remote_addr(peer("198.51.100.7:40001"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "300");
        assert_eq!(body(&response)["retryAfter"], 300);

        // Another client is unaffected, and so is the listing route group.
        let response = warp::test::request()
            .path("/api/gold-price")
            .remote_addr(peer("198.51.100.8:40000"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .path("/api/products")
            .remote_addr(peer("198.51.100.7:40000"))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_spoofed_forwarded_for_does_not_reset_window() {
        let mut limits = RateLimitsConfig::default();
        limits.gold_price.max_requests = 1;
        let (state, _file) = test_state(CATALOG, limits);
        let api = routes(Arc::clone(&state));

        let mut statuses = Vec::new();
        for hop in 0..5 {
            let response = warp::test::request()
                .path("/api/gold-price")
                .remote_addr(peer("192.0.2.10:50000"))
                .header("x-forwarded-for", format!("1.1.1.{hop}"))
                .reply(&api)
                .await;
            statuses.push(response.status());
        }

        assert_eq!(statuses[0], StatusCode::OK);
        assert!(statuses[1..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(state.gold_price.limiter().tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn test_trusted_proxy_keys_on_forwarded_for() {
        let mut limits = RateLimitsConfig::default();
        limits.gold_price.max_requests = 1;
        let (state, _file) = test_state(CATALOG, limits);
        let state = Arc::new(
            Arc::try_unwrap(state)
                .unwrap_or_else(|_| panic!("state is shared"))
                .trusting_forwarded_for(true),
        );
        let api = routes(state);

        for client in ["203.0.113.1", "203.0.113.2"] {
            let response = warp::test::request()
                .path("/api/gold-price")
                .remote_addr(peer("10.0.0.1:8080"))
                .header("x-forwarded-for", format!("{client}, 10.0.0.1"))
                .reply(&api)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = warp::test::request()
            .path("/api/gold-price")
            .remote_addr(peer("10.0.0.1:8080"))
            .header("x-forwarded-for", "203.0.113.1")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_repeated_query_parameter_is_a_validation_error() {
        let mut limits = RateLimitsConfig::default();
        limits.products.max_requests = 2;
        let (state, _file) = test_state(CATALOG, limits);
        let api = routes(state);

        for path in [
            "/api/products?minPrice=1&minPrice=2",
            "/api/products?minRating=1&minPopularity=2",
        ] {
            let response = warp::test::request().path(path).reply(&api).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
            let json = body(&response);
            assert_eq!(json["error"], "Validation failed");
            assert!(json["details"][0].as_str().unwrap().ends_with("may only be given once."));
        }

        // Both rejected requests still counted against the products limit.
        let response = warp::test::request().path("/api/products").reply(&api).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_general_limit_covers_all_api_routes() {
        let mut limits = RateLimitsConfig::default();
        limits.general.max_requests = 1;
        let (state, _file) = test_state(CATALOG, limits);
        let api = routes(state);

        let first = warp::test::request().path("/api/gold-price").reply(&api).await;
        assert_eq!(first.status(), StatusCode::OK);
        let second = warp::test::request().path("/api/products").reply(&api).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body(&second)["retryAfter"], 900);

        // Health is outside the API limiters.
        let health = warp::test::request().path("/health").reply(&api).await;
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_index_and_not_found() {
        let (state, _file) = test_state(CATALOG, RateLimitsConfig::default());
        let api = routes(state);

        let health = warp::test::request().path("/health").reply(&api).await;
        let json = body(&health);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["productsLoaded"], 3);
        assert_eq!(json["environment"], "production");
        assert_eq!(json["goldPriceCache"]["cached"], false);
        assert_eq!(json["goldPriceCache"]["price"], 100.45);

        let index = warp::test::request().path("/").reply(&api).await;
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(body(&index)["endpoints"]["goldPrice"], "/api/gold-price");

        let missing = warp::test::request().path("/api/nope").reply(&api).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&missing)["error"], "Endpoint not found");
    }
}
