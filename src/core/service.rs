//! Request-level orchestration: catalog, oracle, pricing, filter and sort

use super::catalog::{ItemRecord, JsonCatalog};
use super::error::AppError;
use super::listing::{filter, sort};
use super::oracle::PriceOracle;
use super::price::PriceQuote;
use super::pricing::{PricedItem, price_item};
use super::query::ListingQuery;
use anyhow::anyhow;
use tracing::{debug, warn};

/// A priced, filtered and ordered listing.
#[derive(Debug, Clone)]
pub struct Listing {
    pub items: Vec<PricedItem>,
    pub total_items: usize,
    pub quote: PriceQuote,
    pub query: ListingQuery,
}

impl Listing {
    pub fn filtered_count(&self) -> usize {
        self.items.len()
    }
}

pub struct CatalogService {
    catalog: JsonCatalog,
    oracle: PriceOracle,
}

/// Prices every record, dropping the ones that cannot be priced.
pub fn price_items(records: &[ItemRecord], unit_price: f64) -> Vec<PricedItem> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match price_item(index, record, unit_price) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(item = %record.name, error = %e, "Dropping item that cannot be priced");
                None
            }
        })
        .collect()
}

impl CatalogService {
    pub fn new(catalog: JsonCatalog, oracle: PriceOracle) -> Self {
        Self { catalog, oracle }
    }

    pub fn catalog(&self) -> &JsonCatalog {
        &self.catalog
    }

    pub fn oracle(&self) -> &PriceOracle {
        &self.oracle
    }

    pub async fn list(&self, query: ListingQuery) -> Result<Listing, AppError> {
        let records = self.catalog.load_items();
        if records.is_empty() {
            return Err(AppError::DataUnavailable);
        }

        let quote = self.oracle.resolve().await;
        let priced = price_items(&records, quote.price);
        let filtered = filter(priced, &query.filters);
        let items = sort(filtered, query.sort_by, query.sort_order);
        debug!(
            total = records.len(),
            matched = items.len(),
            unit_price = quote.price,
            "Built listing"
        );

        Ok(Listing {
            items,
            total_items: records.len(),
            quote,
            query,
        })
    }

    /// Prices the item at 1-based position `id`.
    pub async fn item(&self, id: usize) -> Result<(PricedItem, PriceQuote), AppError> {
        let records = self.catalog.load_items();
        let index = id.checked_sub(1).ok_or(AppError::NotFound)?;
        let record = records.get(index).ok_or(AppError::NotFound)?;

        let quote = self.oracle.resolve().await;
        let item = price_item(index, record, quote.price)
            .map_err(|e| anyhow!("Error processing product {}: {}", record.name, e))?;
        Ok((item, quote))
    }

    pub async fn gold_price(&self) -> PriceQuote {
        self.oracle.resolve().await
    }
}
