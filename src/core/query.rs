//! Validation of raw listing query parameters

use super::error::AppError;
use super::listing::{PriceFilters, SortDirection, SortField};
use serde::Serialize;

pub const MAX_PRICE_BOUND: f64 = 10_000.0;
pub const MAX_RATING_BOUND: f64 = 5.0;

/// Query parameters exactly as the client sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListingQuery {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl RawListingQuery {
    /// Collects decoded `key=value` pairs. `minPopularity`/`maxPopularity`
    /// are aliases of the rating bounds; unknown keys are ignored. A parameter
    /// given twice, directly or through its alias, is a validation error.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = RawListingQuery::default();
        let mut errors = Vec::new();

        for (key, value) in pairs {
            let (name, slot) = match key.as_ref() {
                "minPrice" => ("minPrice", &mut raw.min_price),
                "maxPrice" => ("maxPrice", &mut raw.max_price),
                "minRating" | "minPopularity" => ("minRating", &mut raw.min_rating),
                "maxRating" | "maxPopularity" => ("maxRating", &mut raw.max_rating),
                "sortBy" => ("sortBy", &mut raw.sort_by),
                "sortOrder" => ("sortOrder", &mut raw.sort_order),
                _ => continue,
            };
            if slot.is_some() {
                let message = format!("{name} may only be given once.");
                if !errors.contains(&message) {
                    errors.push(message);
                }
                continue;
            }
            *slot = Some(value.into());
        }

        if errors.is_empty() {
            Ok(raw)
        } else {
            Err(AppError::Validation { details: errors })
        }
    }
}

/// A listing request whose bounds are known to be consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub filters: PriceFilters,
    pub sort_by: SortField,
    pub sort_order: SortDirection,
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(
    raw: &Option<String>,
    field: &str,
    max: f64,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let value = present(raw)?;
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && (0.0..=max).contains(&v) => Some(v),
        _ => {
            errors.push(format!(
                "Invalid {field}. Must be a number between 0 and {max}."
            ));
            None
        }
    }
}

impl ListingQuery {
    /// Validates every parameter, collecting all violations into one error.
    pub fn from_raw(raw: &RawListingQuery) -> Result<Self, AppError> {
        let mut errors = Vec::new();

        let filters = PriceFilters {
            min_price: parse_bound(&raw.min_price, "minPrice", MAX_PRICE_BOUND, &mut errors),
            max_price: parse_bound(&raw.max_price, "maxPrice", MAX_PRICE_BOUND, &mut errors),
            min_rating: parse_bound(&raw.min_rating, "minRating", MAX_RATING_BOUND, &mut errors),
            max_rating: parse_bound(&raw.max_rating, "maxRating", MAX_RATING_BOUND, &mut errors),
        };

        if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
            if min > max {
                errors.push("minPrice cannot be greater than maxPrice.".to_string());
            }
        }
        if let (Some(min), Some(max)) = (filters.min_rating, filters.max_rating) {
            if min > max {
                errors.push("minRating cannot be greater than maxRating.".to_string());
            }
        }

        let sort_by = match present(&raw.sort_by) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                errors.push("Invalid sortBy. Must be one of default, price, rating, name.".to_string());
                SortField::Default
            }),
            None => SortField::Default,
        };
        let sort_order = match present(&raw.sort_order) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                errors.push("Invalid sortOrder. Must be asc or desc.".to_string());
                SortDirection::Asc
            }),
            None => SortDirection::Asc,
        };

        if !errors.is_empty() {
            return Err(AppError::Validation { details: errors });
        }

        Ok(ListingQuery {
            filters,
            sort_by,
            sort_order,
        })
    }
}

/// Parses a 1-based item id from a path segment.
pub fn parse_item_id(raw: &str) -> Result<usize, AppError> {
    match raw.trim().parse::<usize>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::validation(
            "Invalid product ID. Must be a positive integer.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_query(pairs: &[(&str, &str)]) -> RawListingQuery {
        let mut query = RawListingQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "minPrice" => query.min_price = value,
                "maxPrice" => query.max_price = value,
                "minRating" => query.min_rating = value,
                "maxRating" => query.max_rating = value,
                "sortBy" => query.sort_by = value,
                "sortOrder" => query.sort_order = value,
                other => panic!("unknown key {other}"),
            }
        }
        query
    }

    fn details(result: Result<ListingQuery, AppError>) -> Vec<String> {
        match result {
            Err(AppError::Validation { details }) => details,
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_query() {
        let query = ListingQuery::from_raw(&RawListingQuery::default()).unwrap();
        assert!(query.filters.is_empty());
        assert_eq!(query.sort_by, SortField::Default);
        assert_eq!(query.sort_order, SortDirection::Asc);
    }

    #[test]
    fn test_valid_bounds() {
        let query = ListingQuery::from_raw(&raw_query(&[
            ("minPrice", "100"),
            ("maxPrice", "500.5"),
            ("minRating", "3"),
            ("maxRating", ""),
            ("sortBy", "price"),
            ("sortOrder", "desc"),
        ]))
        .unwrap();

        assert_eq!(query.filters.min_price, Some(100.0));
        assert_eq!(query.filters.max_price, Some(500.5));
        assert_eq!(query.filters.min_rating, Some(3.0));
        assert_eq!(query.filters.max_rating, None);
        assert_eq!(query.sort_by, SortField::Price);
        assert_eq!(query.sort_order, SortDirection::Desc);
    }

    #[test]
    fn test_collects_every_violation() {
        let errors = details(ListingQuery::from_raw(&raw_query(&[
            ("minPrice", "abc"),
            ("maxPrice", "10001"),
            ("minRating", "-1"),
            ("maxRating", "5.5"),
            ("sortBy", "weight"),
        ])));

        assert_eq!(
            errors,
            vec![
                "Invalid minPrice. Must be a number between 0 and 10000.",
                "Invalid maxPrice. Must be a number between 0 and 10000.",
                "Invalid minRating. Must be a number between 0 and 5.",
                "Invalid maxRating. Must be a number between 0 and 5.",
                "Invalid sortBy. Must be one of default, price, rating, name.",
            ]
        );
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let errors = details(ListingQuery::from_raw(&raw_query(&[
            ("minPrice", "600"),
            ("maxPrice", "500"),
            ("minRating", "4"),
            ("maxRating", "2"),
        ])));
        assert_eq!(
            errors,
            vec![
                "minPrice cannot be greater than maxPrice.",
                "minRating cannot be greater than maxRating.",
            ]
        );
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let query = ListingQuery::from_raw(&raw_query(&[
            ("minPrice", "0"),
            ("maxPrice", "10000"),
            ("minRating", "0"),
            ("maxRating", "5"),
        ]))
        .unwrap();
        assert_eq!(query.filters.max_price, Some(10_000.0));
        assert_eq!(query.filters.max_rating, Some(5.0));
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(ListingQuery::from_raw(&raw_query(&[("minPrice", "NaN")])).is_err());
        assert!(ListingQuery::from_raw(&raw_query(&[("maxPrice", "inf")])).is_err());
    }

    #[test]
    fn test_popularity_aliases() {
        let raw =
            RawListingQuery::from_pairs([("minPopularity", "2"), ("maxPopularity", "4")]).unwrap();
        let query = ListingQuery::from_raw(&raw).unwrap();
        assert_eq!(query.filters.min_rating, Some(2.0));
        assert_eq!(query.filters.max_rating, Some(4.0));
    }

    #[test]
    fn test_from_pairs_ignores_unknown_keys() {
        let raw = RawListingQuery::from_pairs([("minPrice", "10"), ("page", "2")]).unwrap();
        assert_eq!(raw, raw_query(&[("minPrice", "10")]));
    }

    #[test]
    fn test_repeated_parameter_is_rejected() {
        let errors = details(
            RawListingQuery::from_pairs([("minPrice", "1"), ("minPrice", "2"), ("minPrice", "3")])
                .and_then(|raw| ListingQuery::from_raw(&raw)),
        );
        assert_eq!(errors, vec!["minPrice may only be given once."]);
    }

    #[test]
    fn test_rating_and_alias_together_is_rejected() {
        let errors = details(
            RawListingQuery::from_pairs([
                ("minRating", "1"),
                ("minPopularity", "2"),
                ("sortBy", "name"),
                ("sortBy", "price"),
            ])
            .and_then(|raw| ListingQuery::from_raw(&raw)),
        );
        assert_eq!(
            errors,
            vec!["minRating may only be given once.", "sortBy may only be given once."]
        );
    }

    #[test]
    fn test_parse_item_id() {
        assert_eq!(parse_item_id("3").unwrap(), 3);
        assert!(parse_item_id("0").is_err());
        assert!(parse_item_id("-2").is_err());
        assert!(parse_item_id("ring").is_err());
    }
}
