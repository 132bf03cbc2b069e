//! Levels produced by a level provider and trades reported by the venue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Price, Size};

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// A single sell level: offer `amount` of base at `price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Price,
    pub amount: Size,
}

impl Level {
    pub fn new(price: Price, amount: Size) -> Self {
        Self { price, amount }
    }

    /// Quote value of the level.
    pub fn notional(&self) -> Decimal {
        self.amount.notional(self.price)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level[price={}, amount={}]", self.price, self.amount)
    }
}

/// An executed trade (fill) on the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Venue transaction or trade id.
    pub trade_id: String,
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide,
    pub price: Price,
    pub base_volume: Size,
    /// Fee paid in quote units.
    #[serde(default)]
    pub fee: Decimal,
}

impl Trade {
    /// Quote value exchanged, before fees.
    pub fn counter_cost(&self) -> Decimal {
        self.base_volume.notional(self.price)
    }
}
