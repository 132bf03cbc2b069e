//! Reference price feeds for the TWAP sell bot.
//!
//! - `PriceFeed`: async capability returning the current reference price
//! - `FixedPriceFeed`: constant price (tests, pegged assets)
//! - `GenericPriceFeed`: HTTP GET + JSON path extraction
//! - `RateOffset`: percent/absolute adjustment applied to a fetched price

pub mod error;
pub mod generic;
pub mod offset;
pub mod price_feed;

pub use error::{FeedError, FeedResult};
pub use generic::GenericPriceFeed;
pub use offset::RateOffset;
pub use price_feed::{FixedPriceFeed, PriceFeed};
