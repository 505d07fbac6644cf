//! JSON envelopes returned by the HTTP API

use crate::core::config::Environment;
use crate::core::error::AppError;
use crate::core::listing::{PriceFilters, describe};
use crate::core::oracle::CacheSnapshot;
use crate::core::price::{PriceOrigin, PriceQuote};
use crate::core::pricing::{PricedItem, round_cents};
use crate::core::service::Listing;
use serde::Serialize;
use tracing::error;
use warp::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use warp::reply::{Response, Reply};

pub const ENDPOINTS: [&str; 4] = [
    "GET /api/products",
    "GET /api/products/:id",
    "GET /api/gold-price",
    "GET /health",
];

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn source_label(quote: &PriceQuote) -> &'static str {
    if quote.is_live() { "API" } else { "fallback" }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortInfo {
    pub sort_by: String,
    pub sort_order: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub gold_price_cached: bool,
    pub cache_age: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub success: bool,
    pub data: Vec<PricedItem>,
    pub total_products: usize,
    pub filtered_count: usize,
    pub gold_price: f64,
    pub gold_price_source: &'static str,
    pub filters: PriceFilters,
    pub sort: SortInfo,
    pub timestamp: String,
    pub cache_info: CacheInfo,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        let filtered_count = listing.filtered_count();
        let query = listing.query;
        ListingResponse {
            success: true,
            total_products: listing.total_items,
            filtered_count,
            gold_price: round_cents(listing.quote.price),
            gold_price_source: source_label(&listing.quote),
            filters: query.filters,
            sort: SortInfo {
                sort_by: query.sort_by.to_string(),
                sort_order: query.sort_order.to_string(),
                description: describe(query.sort_by, query.sort_order, filtered_count),
            },
            timestamp: timestamp(),
            cache_info: CacheInfo {
                gold_price_cached: listing.quote.cached,
                cache_age: listing.quote.age_secs(),
            },
            data: listing.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub success: bool,
    pub data: PricedItem,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldData {
    #[serde(rename = "price_gram_24k")]
    pub price_gram_24k: f64,
    pub currency: &'static str,
    pub metal: &'static str,
    pub source: String,
    pub cached: bool,
    pub cache_age: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldPriceResponse {
    pub success: bool,
    pub gold_price: f64,
    pub gold_data: GoldData,
    pub unit: &'static str,
    pub timestamp: String,
}

impl From<PriceQuote> for GoldPriceResponse {
    fn from(quote: PriceQuote) -> Self {
        let price = round_cents(quote.price);
        let source = match &quote.origin {
            PriceOrigin::Live(name) => format!("Live API ({name})"),
            PriceOrigin::Fallback => "Fallback price".to_string(),
        };
        GoldPriceResponse {
            success: true,
            gold_price: price,
            gold_data: GoldData {
                price_gram_24k: price,
                currency: "USD",
                metal: "XAU",
                source,
                cached: quote.cached,
                cache_age: quote.age_secs(),
            },
            unit: "USD per gram (24k)",
            timestamp: timestamp(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub price: f64,
    pub age: Option<u64>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub products_loaded: usize,
    pub gold_price_cache: CacheHealth,
    pub environment: &'static str,
    pub endpoints: [&'static str; 4],
}

impl HealthResponse {
    pub fn new(products_loaded: usize, snapshot: CacheSnapshot, environment: Environment) -> Self {
        HealthResponse {
            status: "OK",
            timestamp: timestamp(),
            products_loaded,
            gold_price_cache: CacheHealth {
                price: snapshot.price,
                age: snapshot.age.map(|age| age.as_secs()),
                cached: snapshot.fresh,
            },
            environment: environment.as_str(),
            endpoints: ENDPOINTS,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Internal detail is only exposed in development.
    pub fn from_error(err: &AppError, environment: Environment) -> Self {
        let mut body = ErrorResponse {
            success: false,
            error: err.to_string(),
            details: None,
            retry_after: None,
            message: None,
        };
        match err {
            AppError::Validation { details } => body.details = Some(details.clone()),
            AppError::RateLimited { retry_after_secs } => body.retry_after = Some(*retry_after_secs),
            AppError::Internal(e) => {
                body.message = Some(if environment.is_development() {
                    format!("{e:#}")
                } else {
                    "Something went wrong".to_string()
                });
            }
            AppError::DataUnavailable | AppError::NotFound => {}
        }
        body
    }
}

pub fn json_response<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

pub fn error_response(err: &AppError, environment: Environment) -> Response {
    if let AppError::Internal(e) = err {
        error!(error = ?e, "Request failed");
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = json_response(&ErrorResponse::from_error(err, environment), status);
    if let AppError::RateLimited { retry_after_secs } = err {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
    }
    response
}
