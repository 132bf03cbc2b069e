//! Error types for the TWAP engine.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use twap_core::CoreError;
use twap_feed::FeedError;

use crate::volume_filter::VolumeFilterError;

/// Invalid provider configuration. Fatal to construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid number of hours to sell, expected 0 < num_hours_to_sell <= 24; was {0}")]
    NumHoursToSell(u32),

    #[error("invalid value for parent_bucket_size_seconds, expected 0 < parent_bucket_size_seconds <= 86400 (seconds in day); was {0}")]
    ParentBucketSizeOutOfRange(u32),

    #[error("parent_bucket_size_seconds needs to perfectly divide the 86400 seconds in a day but it does not; was {0}")]
    ParentBucketSizeNotDivisor(u32),

    #[error("distribute_surplus_over_remaining_intervals_percent_ceiling is invalid, expected 0.0 <= value <= 1.0; was {0}")]
    SurplusCeiling(Decimal),

    #[error("exponential_smoothing_factor is invalid, expected 0.0 <= value <= 1.0; was {0}")]
    SmoothingFactor(Decimal),

    #[error("min_child_order_size_percent_of_parent is invalid, expected 0.0 <= value <= 1.0; was {0}")]
    MinChildOrderSize(Decimal),

    #[error("volume filter at index {index} was not selling the base asset as expected: {descriptor}")]
    NotSellingBase { index: usize, descriptor: String },

    #[error("invalid order constraints: {0}")]
    Constraints(#[from] CoreError),

    #[error("invalid rate offset: {0}")]
    RateOffset(#[source] FeedError),

    #[error("price_feed_timeout_ms must be positive")]
    PriceFeedTimeout,
}

/// Per-tick and fill-handling errors.
#[derive(Debug, Error)]
pub enum MmError {
    #[error("could not fetch base asset cap in base units for weekday {weekday}: {source}")]
    CapResolution {
        weekday: usize,
        #[source]
        source: VolumeFilterError,
    },

    #[error("price feed error: {0}")]
    PriceFeed(#[from] FeedError),

    #[error("price feed timed out after {0:?}")]
    PriceFeedTimeout(Duration),

    #[error("fill handling failed: {0}")]
    Fill(String),
}

impl MmError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapResolution { .. } => "cap_resolution",
            Self::PriceFeed(_) => "price_feed",
            Self::PriceFeedTimeout(_) => "price_feed_timeout",
            Self::Fill(_) => "fill",
        }
    }
}

pub type MmResult<T> = Result<T, MmError>;
