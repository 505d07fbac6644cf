//! Display price and star rating computation

use super::catalog::ItemRecord;
use super::error::PricingError;
use serde::Serialize;
use std::collections::BTreeMap;

/// An item with its derived, per-request price fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedItem {
    pub id: usize,
    pub name: String,
    pub weight: f64,
    pub popularity_score: f64,
    pub images: BTreeMap<String, String>,
    pub price: f64,
    pub popularity_rating: f64,
    pub gold_price: f64,
}

/// Rounds half-up to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes the display price of an item.
///
/// `(popularity + 1) * weight * unit_price`, rounded to cents. Popularity
/// scales the price from 1x to 2x.
pub fn price(popularity_score: f64, weight: f64, unit_price: f64) -> Result<f64, PricingError> {
    if !popularity_score.is_finite() || !(0.0..=1.0).contains(&popularity_score) {
        return Err(PricingError::InvalidInput(format!(
            "popularity score {popularity_score} outside [0, 1]"
        )));
    }
    if !weight.is_finite() || weight <= 0.0 {
        return Err(PricingError::InvalidInput(format!(
            "weight {weight} must be positive"
        )));
    }
    if !unit_price.is_finite() || unit_price <= 0.0 {
        return Err(PricingError::InvalidInput(format!(
            "unit price {unit_price} must be positive"
        )));
    }

    Ok(round_cents((popularity_score + 1.0) * weight * unit_price))
}

/// Maps a popularity score in [0, 1] to a 0-5 star rating with one decimal.
/// Anything outside the range renders as zero stars.
pub fn to_star_rating(popularity_score: f64) -> f64 {
    if !popularity_score.is_finite() || !(0.0..=1.0).contains(&popularity_score) {
        return 0.0;
    }
    (popularity_score * 5.0 * 10.0).round() / 10.0
}

/// Prices a catalog record. `index` is the zero-based catalog position.
pub fn price_item(
    index: usize,
    record: &ItemRecord,
    unit_price: f64,
) -> Result<PricedItem, PricingError> {
    let price = price(record.popularity_score, record.weight, unit_price)?;
    Ok(PricedItem {
        id: index + 1,
        name: record.name.clone(),
        weight: record.weight,
        popularity_score: record.popularity_score,
        images: record.images.clone(),
        price,
        popularity_rating: to_star_rating(record.popularity_score),
        gold_price: round_cents(unit_price),
    })
}
