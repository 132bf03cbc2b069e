//! Error types for twap-core.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Price, Size};

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Invalid order constraints: {0}")]
    InvalidConstraints(String),
}

/// Reason a candidate level could not be fitted to the order constraints.
///
/// Not a hard failure: the caller drops the level and logs the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("price {0} is not positive")]
    NonPositivePrice(Price),

    #[error("amount {amount} is below the minimum base amount {min}")]
    BelowMinBase { amount: Size, min: Size },

    #[error("notional {notional} is below the minimum quote amount {min}")]
    BelowMinQuote { notional: Decimal, min: Decimal },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
