//! Core business logic: price resolution, pricing, listing and admission control

pub mod catalog;
pub mod config;
pub mod error;
pub mod listing;
pub mod log;
pub mod oracle;
pub mod price;
pub mod pricing;
pub mod query;
pub mod ratelimit;
pub mod service;

// Re-export main types for cleaner imports
pub use catalog::{ItemRecord, JsonCatalog};
pub use error::{AppError, PricingError};
pub use oracle::{OracleSettings, PriceOracle};
pub use price::{PriceOrigin, PriceQuote, PriceSource};
pub use pricing::PricedItem;
pub use service::CatalogService;
