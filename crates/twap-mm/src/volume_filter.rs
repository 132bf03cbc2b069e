//! Daily volume filter for a single weekday.
//!
//! Descriptor format: `volume/daily/<action>/<unit>/<capacity>/<mode>`,
//! e.g. `volume/daily/sell/base/1000.0/exact`. Parsing validates the shape
//! only; the capacity expression is resolved when the cap is requested.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use twap_core::Size;

/// Direction the filter caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Buy,
    Sell,
}

/// Asset the capacity is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapUnit {
    Base,
    Quote,
}

/// How an order exceeding the remaining capacity is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Trim the order to the remaining capacity.
    Exact,
    /// Drop the order entirely.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeFilterError {
    #[error("invalid volume filter descriptor '{descriptor}': {reason}")]
    Descriptor { descriptor: String, reason: String },

    #[error("capacity expression '{0}' is not a number")]
    MalformedCapacity(String),

    #[error("capacity must not be negative; was {0}")]
    NegativeCapacity(Decimal),

    #[error("volume filter '{0}' is not denominated in base units")]
    NotBaseUnits(String),
}

/// A per-day volume cap policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VolumeFilter {
    descriptor: String,
    action: FilterAction,
    unit: CapUnit,
    capacity: String,
    mode: FilterMode,
}

impl VolumeFilter {
    /// Filter capping daily base-asset sales at `cap`.
    pub fn sell_base(cap: Size, mode: FilterMode) -> Self {
        let mode_str = match mode {
            FilterMode::Exact => "exact",
            FilterMode::Ignore => "ignore",
        };
        Self {
            descriptor: format!("volume/daily/sell/base/{cap}/{mode_str}"),
            action: FilterAction::Sell,
            unit: CapUnit::Base,
            capacity: cap.to_string(),
            mode,
        }
    }

    /// Whether this filter caps sales of the base asset.
    pub fn is_selling_base(&self) -> bool {
        self.action == FilterAction::Sell && self.unit == CapUnit::Base
    }

    /// Resolve the capacity expression into a base-asset amount.
    pub fn base_cap_in_base_units(&self) -> Result<Size, VolumeFilterError> {
        if self.unit != CapUnit::Base {
            return Err(VolumeFilterError::NotBaseUnits(self.descriptor.clone()));
        }
        let cap = Decimal::from_str(&self.capacity)
            .map_err(|_| VolumeFilterError::MalformedCapacity(self.capacity.clone()))?;
        if cap.is_sign_negative() && !cap.is_zero() {
            return Err(VolumeFilterError::NegativeCapacity(cap));
        }
        Ok(Size::new(cap))
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

impl FromStr for VolumeFilter {
    type Err = VolumeFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: &str| VolumeFilterError::Descriptor {
            descriptor: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 6 {
            return Err(bad("expected 6 '/'-separated segments"));
        }
        if parts[0] != "volume" {
            return Err(bad("first segment must be 'volume'"));
        }
        if parts[1] != "daily" {
            return Err(bad("only 'daily' filters are supported"));
        }
        let action = match parts[2] {
            "buy" => FilterAction::Buy,
            "sell" => FilterAction::Sell,
            _ => return Err(bad("action must be 'buy' or 'sell'")),
        };
        let unit = match parts[3] {
            "base" => CapUnit::Base,
            "quote" => CapUnit::Quote,
            _ => return Err(bad("unit must be 'base' or 'quote'")),
        };
        if parts[4].is_empty() {
            return Err(bad("capacity must not be empty"));
        }
        let mode = match parts[5] {
            "exact" => FilterMode::Exact,
            "ignore" => FilterMode::Ignore,
            _ => return Err(bad("mode must be 'exact' or 'ignore'")),
        };

        Ok(Self {
            descriptor: s.trim().to_string(),
            action,
            unit,
            capacity: parts[4].to_string(),
            mode,
        })
    }
}

impl TryFrom<String> for VolumeFilter {
    type Error = VolumeFilterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VolumeFilter> for String {
    fn from(f: VolumeFilter) -> Self {
        f.descriptor
    }
}

impl fmt::Display for VolumeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VolumeFilter[{}]", self.descriptor)
    }
}
