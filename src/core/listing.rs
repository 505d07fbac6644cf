//! Range filters and ordering for priced listings

use super::pricing::PricedItem;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

/// Inclusive, pre-validated bounds. `None` means unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<f64>,
}

impl PriceFilters {
    pub fn matches(&self, item: &PricedItem) -> bool {
        self.min_price.is_none_or(|min| item.price >= min)
            && self.max_price.is_none_or(|max| item.price <= max)
            && self.min_rating.is_none_or(|min| item.popularity_rating >= min)
            && self.max_rating.is_none_or(|max| item.popularity_rating <= max)
    }

    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_rating.is_none()
            && self.max_rating.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Default,
    Price,
    Rating,
    Name,
}

impl Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortField::Default => "default",
                SortField::Price => "price",
                SortField::Rating => "rating",
                SortField::Name => "name",
            }
        )
    }
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(SortField::Default),
            "price" => Ok(SortField::Price),
            "rating" | "popularity" => Ok(SortField::Rating),
            "name" => Ok(SortField::Name),
            _ => Err(anyhow::anyhow!("Invalid sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            }
        )
    }
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(anyhow::anyhow!("Invalid sort order: {}", s)),
        }
    }
}

/// Keeps the items inside every present bound, in input order.
pub fn filter(items: Vec<PricedItem>, filters: &PriceFilters) -> Vec<PricedItem> {
    items.into_iter().filter(|item| filters.matches(item)).collect()
}

fn compare(a: &PricedItem, b: &PricedItem, field: SortField) -> Ordering {
    match field {
        SortField::Default => Ordering::Equal,
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Rating => a.popularity_rating.total_cmp(&b.popularity_rating),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}

/// Orders items by `field`. Equal keys keep their input order; `Default`
/// returns the input untouched.
pub fn sort(mut items: Vec<PricedItem>, field: SortField, direction: SortDirection) -> Vec<PricedItem> {
    if field == SortField::Default {
        return items;
    }

    items.sort_by(|a, b| match direction {
        SortDirection::Asc => compare(a, b, field),
        SortDirection::Desc => compare(b, a, field),
    });
    items
}

/// One-line summary of the applied ordering.
pub fn describe(field: SortField, direction: SortDirection, count: usize) -> String {
    if field == SortField::Default {
        return format!("Showing {count} products");
    }
    let direction = match direction {
        SortDirection::Asc => "ascending",
        SortDirection::Desc => "descending",
    };
    format!("{count} products sorted by {field} ({direction})")
}
