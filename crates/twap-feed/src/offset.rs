//! Rate offset applied to a reference price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use twap_core::Price;

use crate::error::{FeedError, FeedResult};

/// Adjustment applied to the reference price before it anchors a level.
///
/// `percent` is a fraction (0.01 = +1%). With `percent_first` the result is
/// `price * (1 + percent) + absolute`, otherwise
/// `(price + absolute) * (1 + percent)`. `invert` takes the reciprocal of
/// the fetched price before anything else is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateOffset {
    #[serde(default)]
    pub percent: Decimal,
    #[serde(default)]
    pub absolute: Decimal,
    #[serde(default)]
    pub percent_first: bool,
    #[serde(default)]
    pub invert: bool,
}

impl RateOffset {
    /// Check the offset can produce a positive price.
    pub fn validate(&self) -> FeedResult<()> {
        if self.percent <= Decimal::NEGATIVE_ONE {
            return Err(FeedError::InvalidOffset(format!(
                "percent must be greater than -1.0; was {}",
                self.percent
            )));
        }
        Ok(())
    }

    /// Apply the offset to `price`.
    pub fn apply(&self, price: Price) -> FeedResult<Price> {
        let base = if self.invert {
            price
                .invert()
                .ok_or_else(|| FeedError::InvalidPrice("cannot invert a zero price".to_string()))?
        } else {
            price
        };

        let factor = Decimal::ONE + self.percent;
        let adjusted = if self.percent_first {
            base.inner() * factor + self.absolute
        } else {
            (base.inner() + self.absolute) * factor
        };

        if adjusted <= Decimal::ZERO {
            return Err(FeedError::InvalidPrice(format!(
                "offset price is not positive: {adjusted} (from {price})"
            )));
        }
        Ok(Price::new(adjusted))
    }
}
