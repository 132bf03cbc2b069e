//! Core domain types for the TWAP sell bot.
//!
//! This crate provides the value types shared by the scheduling engine,
//! the price feeds and the bot runner:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `OrderConstraints`: Venue bounds on amounts and price/amount granularity
//! - `Level`: One (price, amount) sell level produced per tick
//! - `Trade`: An executed fill reported back by the venue

pub mod constraints;
pub mod decimal;
pub mod error;
pub mod level;

pub use constraints::{ConstraintOverrides, OrderConstraints};
pub use decimal::{Price, Size};
pub use error::{ConstraintViolation, CoreError, Result};
pub use level::{Level, OrderSide, Trade};
