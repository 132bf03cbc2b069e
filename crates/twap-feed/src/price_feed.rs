//! Price feed capability.

use async_trait::async_trait;

use twap_core::Price;

use crate::error::{FeedError, FeedResult};

/// Source of the reference price a level provider anchors to.
///
/// Implementations may block on network I/O; callers bound the call with
/// a timeout.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the current price.
    async fn price(&self) -> FeedResult<Price>;
}

/// Price feed that always returns the same price.
#[derive(Debug, Clone, Copy)]
pub struct FixedPriceFeed {
    price: Price,
}

impl FixedPriceFeed {
    /// Create a fixed feed. The price must be positive.
    pub fn new(price: Price) -> FeedResult<Self> {
        if !price.is_positive() {
            return Err(FeedError::InvalidPrice(format!(
                "fixed price must be positive; was {price}"
            )));
        }
        Ok(Self { price })
    }
}

#[async_trait]
impl PriceFeed for FixedPriceFeed {
    async fn price(&self) -> FeedResult<Price> {
        Ok(self.price)
    }
}
