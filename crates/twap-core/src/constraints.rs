//! Order constraints supplied by the trading venue.
//!
//! Bounds the amounts a level may carry and the granularity of its price
//! and amount. Values are immutable; overrides produce a new value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ConstraintViolation, CoreError, Result};
use crate::{Level, Price, Size};

/// Venue bounds for a single trading pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConstraints {
    /// Minimum price increment.
    pub price_step: Price,

    /// Minimum base amount increment.
    pub amount_step: Size,

    /// Minimum base amount of a single order.
    #[serde(default)]
    pub min_base_amount: Size,

    /// Maximum base amount of a single order (None = unbounded).
    #[serde(default)]
    pub max_base_amount: Option<Size>,

    /// Minimum notional of a single order in quote units.
    #[serde(default)]
    pub min_quote_amount: Option<Decimal>,

    /// Maximum notional of a single order in quote units.
    #[serde(default)]
    pub max_quote_amount: Option<Decimal>,
}

/// Operator overrides for the venue-reported constraints.
///
/// Precisions are decimal places; they replace the corresponding step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintOverrides {
    #[serde(default)]
    pub price_precision: Option<u32>,
    #[serde(default)]
    pub volume_precision: Option<u32>,
    #[serde(default)]
    pub min_base_volume: Option<Size>,
    #[serde(default)]
    pub min_quote_volume: Option<Decimal>,
}

impl ConstraintOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Default for OrderConstraints {
    fn default() -> Self {
        Self {
            price_step: Price::new(Decimal::new(1, 7)),
            amount_step: Size::new(Decimal::new(1, 7)),
            min_base_amount: Size::ZERO,
            max_base_amount: None,
            min_quote_amount: None,
            max_quote_amount: None,
        }
    }
}

/// Step of `10^-precision`. Decimal supports at most 28 fractional digits.
fn step_for_precision(precision: u32) -> Decimal {
    Decimal::new(1, precision.min(28))
}

impl OrderConstraints {
    /// Return a copy with the given overrides applied.
    #[must_use]
    pub fn with_overrides(&self, overrides: &ConstraintOverrides) -> Self {
        let mut out = self.clone();
        if let Some(p) = overrides.price_precision {
            out.price_step = Price::new(step_for_precision(p));
        }
        if let Some(p) = overrides.volume_precision {
            out.amount_step = Size::new(step_for_precision(p));
        }
        if let Some(min) = overrides.min_base_volume {
            out.min_base_amount = min;
        }
        if let Some(min) = overrides.min_quote_volume {
            out.min_quote_amount = Some(min);
        }
        out
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if !self.price_step.is_positive() {
            return Err(CoreError::InvalidConstraints(format!(
                "price_step must be positive; was {}",
                self.price_step
            )));
        }
        if !self.amount_step.is_positive() {
            return Err(CoreError::InvalidConstraints(format!(
                "amount_step must be positive; was {}",
                self.amount_step
            )));
        }
        if self.min_base_amount.inner().is_sign_negative() {
            return Err(CoreError::InvalidConstraints(format!(
                "min_base_amount must not be negative; was {}",
                self.min_base_amount
            )));
        }
        if let Some(max) = self.max_base_amount {
            if max < self.min_base_amount {
                return Err(CoreError::InvalidConstraints(format!(
                    "max_base_amount ({max}) is below min_base_amount ({})",
                    self.min_base_amount
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_quote_amount, self.max_quote_amount) {
            if max < min {
                return Err(CoreError::InvalidConstraints(format!(
                    "max_quote_amount ({max}) is below min_quote_amount ({min})"
                )));
            }
        }
        Ok(())
    }

    /// Round a sell price up to the price step.
    pub fn round_sell_price(&self, price: Price) -> Price {
        price.ceil_to_tick(self.price_step)
    }

    /// Fit a sell level to the constraints.
    ///
    /// The amount is rounded down to the amount step and clamped so that it
    /// never exceeds the per-order maximums nor `quote_ceiling` in notional.
    /// A level that ends up under a minimum is rejected rather than inflated.
    pub fn fit_sell_level(
        &self,
        price: Price,
        amount: Size,
        quote_ceiling: Option<Decimal>,
    ) -> std::result::Result<Level, ConstraintViolation> {
        let price = self.round_sell_price(price);
        if !price.is_positive() {
            return Err(ConstraintViolation::NonPositivePrice(price));
        }

        let mut amount = amount;
        if let Some(max) = self.max_base_amount {
            amount = amount.min(max);
        }
        let quote_cap = match (self.max_quote_amount, quote_ceiling) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        if let Some(cap) = quote_cap {
            let cap = cap.max(Decimal::ZERO);
            amount = amount.min(Size::new(cap / price.inner()));
        }
        let amount = amount.round_to_lot(self.amount_step);

        if !amount.is_positive() || amount < self.min_base_amount {
            return Err(ConstraintViolation::BelowMinBase {
                amount,
                min: self.min_base_amount,
            });
        }
        if let Some(min) = self.min_quote_amount {
            let notional = amount.notional(price);
            if notional < min {
                return Err(ConstraintViolation::BelowMinQuote { notional, min });
            }
        }

        Ok(Level { price, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn constraints() -> OrderConstraints {
        OrderConstraints {
            price_step: Price::new(dec!(0.001)),
            amount_step: Size::new(dec!(0.1)),
            min_base_amount: Size::new(dec!(5)),
            max_base_amount: Some(Size::new(dec!(100))),
            min_quote_amount: Some(dec!(1)),
            max_quote_amount: None,
        }
    }

    #[test]
    fn test_fit_rounds_price_up_and_amount_down() {
        let level = constraints()
            .fit_sell_level(Price::new(dec!(0.12345)), Size::new(dec!(41.666)), None)
            .unwrap();
        assert_eq!(level.price.inner(), dec!(0.124));
        assert_eq!(level.amount.inner(), dec!(41.6));
    }

    #[test]
    fn test_fit_clamps_to_max_base() {
        let level = constraints()
            .fit_sell_level(Price::new(dec!(1)), Size::new(dec!(250)), None)
            .unwrap();
        assert_eq!(level.amount.inner(), dec!(100));
    }

    #[test]
    fn test_fit_clamps_to_quote_ceiling() {
        // 20 quote at price 2 allows 10 base.
        let level = constraints()
            .fit_sell_level(Price::new(dec!(2)), Size::new(dec!(50)), Some(dec!(20)))
            .unwrap();
        assert_eq!(level.amount.inner(), dec!(10));
        assert!(level.notional() <= dec!(20));
    }

    #[test]
    fn test_fit_rejects_below_min_base() {
        let err = constraints()
            .fit_sell_level(Price::new(dec!(1)), Size::new(dec!(4.99)), None)
            .unwrap_err();
        assert!(matches!(err, ConstraintViolation::BelowMinBase { .. }));
    }

    #[test]
    fn test_fit_rejects_below_min_quote() {
        let err = constraints()
            .fit_sell_level(Price::new(dec!(0.1)), Size::new(dec!(6)), None)
            .unwrap_err();
        assert!(matches!(err, ConstraintViolation::BelowMinQuote { .. }));
    }

    #[test]
    fn test_fit_rejects_zero_price() {
        let err = constraints()
            .fit_sell_level(Price::ZERO, Size::new(dec!(10)), None)
            .unwrap_err();
        assert_eq!(err, ConstraintViolation::NonPositivePrice(Price::ZERO));
    }

    #[test]
    fn test_overrides_replace_steps_and_minimums() {
        let overrides = ConstraintOverrides {
            price_precision: Some(6),
            volume_precision: Some(1),
            min_base_volume: Some(Size::new(dec!(30))),
            min_quote_volume: Some(dec!(10)),
        };
        let out = constraints().with_overrides(&overrides);
        assert_eq!(out.price_step.inner(), dec!(0.000001));
        assert_eq!(out.amount_step.inner(), dec!(0.1));
        assert_eq!(out.min_base_amount.inner(), dec!(30));
        assert_eq!(out.min_quote_amount, Some(dec!(10)));
        // Original is untouched.
        assert_eq!(constraints().min_base_amount.inner(), dec!(5));
    }

    #[test]
    fn test_validate() {
        assert!(constraints().validate().is_ok());
        assert!(OrderConstraints::default().validate().is_ok());

        let bad_step = OrderConstraints {
            price_step: Price::ZERO,
            ..constraints()
        };
        assert!(bad_step.validate().is_err());

        let inverted = OrderConstraints {
            max_base_amount: Some(Size::new(dec!(1))),
            ..constraints()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_toml_defaults() {
        let c: OrderConstraints = toml::from_str(
            r#"
price_step = "0.0001"
amount_step = "0.1"
"#,
        )
        .unwrap();
        assert_eq!(c.min_base_amount, Size::ZERO);
        assert!(c.max_base_amount.is_none());
    }
}
