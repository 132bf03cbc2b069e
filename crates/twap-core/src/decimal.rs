//! Precision-safe decimal types for prices and base amounts.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that daily caps,
//! bucket shares and step rounding never drift through float error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Price of one unit of base asset, denominated in quote asset.
///
/// Wraps `Decimal` so prices cannot be mixed with base amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round up to the price step.
    ///
    /// Sell levels use this so the posted price never undercuts the anchor.
    #[inline]
    pub fn ceil_to_tick(&self, tick_size: Price) -> Self {
        if tick_size.is_zero() {
            return *self;
        }
        Self((self.0 / tick_size.0).ceil() * tick_size.0)
    }

    /// Reciprocal price (quote per base ↔ base per quote).
    #[inline]
    pub fn invert(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(Self(Decimal::ONE / self.0))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Amount of base asset.
///
/// Daily caps, bucket allotments and level amounts are all `Size`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round down to the amount step.
    #[inline]
    pub fn round_to_lot(&self, lot_size: Size) -> Self {
        if lot_size.is_zero() {
            return *self;
        }
        Self((self.0 / lot_size.0).floor() * lot_size.0)
    }

    /// Subtract, flooring the result at zero.
    #[inline]
    pub fn saturating_sub(self, rhs: Size) -> Self {
        Self((self.0 - rhs.0).max(Decimal::ZERO))
    }

    /// Calculate notional value: size * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Size {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Size {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl Sum for Size {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Size::ZERO, |acc, s| acc + s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_ceil_to_tick() {
        let price = Price::new(dec!(0.1234567));
        let tick = Price::new(dec!(0.0001));

        assert_eq!(price.ceil_to_tick(tick).inner(), dec!(0.1235));
    }

    #[test]
    fn test_ceil_to_tick_keeps_exact_multiples() {
        let price = Price::new(dec!(1.25));
        assert_eq!(price.ceil_to_tick(Price::new(dec!(0.05))).inner(), dec!(1.25));
        assert_eq!(price.ceil_to_tick(Price::ZERO), price);
    }

    #[test]
    fn test_price_invert() {
        assert_eq!(Price::new(dec!(4)).invert(), Some(Price::new(dec!(0.25))));
        assert_eq!(Price::ZERO.invert(), None);
    }

    #[test]
    fn test_size_round_to_lot() {
        let size = Size::new(dec!(41.6666667));
        let lot = Size::new(dec!(0.1));

        assert_eq!(size.round_to_lot(lot).inner(), dec!(41.6));
    }

    #[test]
    fn test_size_defaults_to_zero() {
        assert_eq!(Size::default(), Size::ZERO);
    }

    #[test]
    fn test_size_saturating_sub() {
        let a = Size::new(dec!(10));
        let b = Size::new(dec!(12.5));

        assert_eq!(b.saturating_sub(a), Size::new(dec!(2.5)));
        assert_eq!(a.saturating_sub(b), Size::ZERO);
    }

    #[test]
    fn test_size_sum_and_notional() {
        let total: Size = [dec!(1.5), dec!(2), dec!(0.5)]
            .into_iter()
            .map(Size::new)
            .sum();
        assert_eq!(total, Size::new(dec!(4)));
        assert_eq!(total.notional(Price::new(dec!(0.25))), dec!(1));
    }
}
