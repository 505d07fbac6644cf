//! Client-facing error taxonomy

use thiserror::Error;

/// Errors that end a request with a non-success envelope.
///
/// Source failures never show up here: the oracle recovers from them by
/// falling through to the next source.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation { details: Vec<String> },

    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error("No products found in catalog")]
    DataUnavailable,

    #[error("Product not found")]
    NotFound,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(detail: impl Into<String>) -> Self {
        AppError::Validation {
            details: vec![detail.into()],
        }
    }

    /// HTTP status code the error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::RateLimited { .. } => 429,
            AppError::DataUnavailable | AppError::NotFound => 404,
            AppError::Internal(_) => 500,
        }
    }
}

/// An item whose attributes cannot be priced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Invalid input values for price calculation: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::validation("bad").status_code(), 400);
        assert_eq!(
            AppError::RateLimited {
                retry_after_secs: 60
            }
            .status_code(),
            429
        );
        assert_eq!(AppError::DataUnavailable.status_code(), 404);
        assert_eq!(AppError::NotFound.status_code(), 404);
        assert_eq!(AppError::Internal(anyhow!("boom")).status_code(), 500);
    }

    #[test]
    fn test_internal_message_hides_detail() {
        let err = AppError::from(anyhow!("disk on fire"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
