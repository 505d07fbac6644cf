use super::AppState;
use super::response::{
    ENDPOINTS, GoldPriceResponse, HealthResponse, ItemResponse, ListingResponse, error_response,
    json_response,
};
use crate::core::error::AppError;
use crate::core::query::{ListingQuery, RawListingQuery, parse_item_id};
use crate::core::ratelimit::check_layers;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use warp::http::StatusCode;
use warp::reply::Response;

async fn try_list_products(
    state: &AppState,
    client: &str,
    params: Vec<(String, String)>,
) -> Result<Response, AppError> {
    check_layers(&[&state.general, &state.products], client).await?;
    let query = ListingQuery::from_raw(&RawListingQuery::from_pairs(params)?)?;
    debug!(?query, client, "Listing products");
    let listing = state.service.list(query).await?;
    Ok(json_response(&ListingResponse::from(listing), StatusCode::OK))
}

async fn try_get_product(state: &AppState, client: &str, id: &str) -> Result<Response, AppError> {
    check_layers(&[&state.general, &state.products], client).await?;
    let id = parse_item_id(id)?;
    let (item, _quote) = state.service.item(id).await?;
    Ok(json_response(
        &ItemResponse {
            success: true,
            data: item,
        },
        StatusCode::OK,
    ))
}

async fn try_gold_price(state: &AppState, client: &str) -> Result<Response, AppError> {
    check_layers(&[&state.general, &state.gold_price], client).await?;
    let quote = state.service.gold_price().await;
    Ok(json_response(&GoldPriceResponse::from(quote), StatusCode::OK))
}

pub async fn list_products(
    state: Arc<AppState>,
    client: String,
    params: Vec<(String, String)>,
) -> Response {
    try_list_products(&state, &client, params)
        .await
        .unwrap_or_else(|e| error_response(&e, state.environment))
}

pub async fn get_product(state: Arc<AppState>, client: String, id: String) -> Response {
    try_get_product(&state, &client, &id)
        .await
        .unwrap_or_else(|e| error_response(&e, state.environment))
}

pub async fn gold_price(state: Arc<AppState>, client: String) -> Response {
    try_gold_price(&state, &client)
        .await
        .unwrap_or_else(|e| error_response(&e, state.environment))
}

pub async fn health(state: Arc<AppState>) -> Response {
    let products_loaded = state.service.catalog().load_items().len();
    let snapshot = state.service.oracle().snapshot().await;
    json_response(
        &HealthResponse::new(products_loaded, snapshot, state.environment),
        StatusCode::OK,
    )
}

pub async fn index() -> Response {
    let body = json!({
        "message": "aurum - gold product listing API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Catalog prices derived from the live gold spot price",
        "endpoints": {
            "products": "/api/products",
            "singleProduct": "/api/products/:id",
            "goldPrice": "/api/gold-price",
            "health": "/health"
        },
        "filters": {
            "minPrice": "?minPrice=100",
            "maxPrice": "?maxPrice=500",
            "minRating": "?minRating=3",
            "maxRating": "?maxRating=5",
            "sort": "?sortBy=price&sortOrder=desc",
            "combined": "?minPrice=100&maxPrice=500&minRating=3"
        }
    });
    json_response(&body, StatusCode::OK)
}

pub async fn not_found() -> Response {
    let body = json!({
        "success": false,
        "error": "Endpoint not found",
        "availableEndpoints": ENDPOINTS,
    });
    json_response(&body, StatusCode::NOT_FOUND)
}
