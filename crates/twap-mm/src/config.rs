//! TWAP provider configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use twap_core::{OrderConstraints, Size};
use twap_feed::RateOffset;

use crate::bucket::SECONDS_IN_DAY;
use crate::error::ConfigError;
use crate::volume_filter::{FilterMode, VolumeFilter};

/// Seconds in an hour.
const SECONDS_IN_HOUR: i64 = 3600;

/// TWAP sell configuration.
///
/// Immutable once handed to the provider; `validate` is the only gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwapConfig {
    /// Hours per UTC day, counted from midnight, in which selling is allowed.
    #[serde(default = "default_num_hours_to_sell")]
    pub num_hours_to_sell: u32,

    /// Parent bucket size. Must evenly divide a day.
    #[serde(default = "default_parent_bucket_size_seconds")]
    pub parent_bucket_size_seconds: u32,

    /// Fraction of the remaining daily capacity a single bucket may absorb
    /// from unsold surplus (0.0 = never redistribute).
    #[serde(default = "default_surplus_ceiling")]
    pub distribute_surplus_over_remaining_intervals_percent_ceiling: Decimal,

    /// Weight of the previous bucket's executed volume against the
    /// scheduled share (0.0 = ignore executions).
    #[serde(default)]
    pub exponential_smoothing_factor: Decimal,

    /// Smallest child order, as a fraction of the nominal bucket share.
    #[serde(default = "default_min_child_pct")]
    pub min_child_order_size_percent_of_parent: Decimal,

    /// Daily caps indexed by weekday, Sunday = 0.
    pub day_of_week_filters: [VolumeFilter; 7],

    /// Venue constraints for the traded pair.
    #[serde(default)]
    pub order_constraints: OrderConstraints,

    /// Adjustment applied to the reference price.
    #[serde(default)]
    pub rate_offset: RateOffset,

    /// Upper bound on a single price fetch.
    #[serde(default = "default_price_feed_timeout_ms")]
    pub price_feed_timeout_ms: u64,
}

impl Default for TwapConfig {
    /// Hourly buckets over a full day with every weekday closed (cap 0).
    fn default() -> Self {
        let closed = VolumeFilter::sell_base(Size::ZERO, FilterMode::Exact);
        Self {
            num_hours_to_sell: default_num_hours_to_sell(),
            parent_bucket_size_seconds: default_parent_bucket_size_seconds(),
            distribute_surplus_over_remaining_intervals_percent_ceiling: default_surplus_ceiling(),
            exponential_smoothing_factor: Decimal::ZERO,
            min_child_order_size_percent_of_parent: default_min_child_pct(),
            day_of_week_filters: std::array::from_fn(|_| closed.clone()),
            order_constraints: OrderConstraints::default(),
            rate_offset: RateOffset::default(),
            price_feed_timeout_ms: default_price_feed_timeout_ms(),
        }
    }
}

fn default_num_hours_to_sell() -> u32 {
    24
}
fn default_parent_bucket_size_seconds() -> u32 {
    3600 // hourly
}
fn default_surplus_ceiling() -> Decimal {
    Decimal::new(2, 1) // 0.2
}
fn default_min_child_pct() -> Decimal {
    Decimal::new(1, 1) // 0.1
}
fn default_price_feed_timeout_ms() -> u64 {
    5_000
}

fn is_unit_fraction(v: Decimal) -> bool {
    v >= Decimal::ZERO && v <= Decimal::ONE
}

impl TwapConfig {
    /// Validate every parameter, reporting the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_hours_to_sell == 0 || self.num_hours_to_sell > 24 {
            return Err(ConfigError::NumHoursToSell(self.num_hours_to_sell));
        }

        let bucket = i64::from(self.parent_bucket_size_seconds);
        if bucket <= 0 || bucket > SECONDS_IN_DAY {
            return Err(ConfigError::ParentBucketSizeOutOfRange(
                self.parent_bucket_size_seconds,
            ));
        }
        if SECONDS_IN_DAY % bucket != 0 {
            return Err(ConfigError::ParentBucketSizeNotDivisor(
                self.parent_bucket_size_seconds,
            ));
        }

        let ceiling = self.distribute_surplus_over_remaining_intervals_percent_ceiling;
        if !is_unit_fraction(ceiling) {
            return Err(ConfigError::SurplusCeiling(ceiling));
        }
        if !is_unit_fraction(self.exponential_smoothing_factor) {
            return Err(ConfigError::SmoothingFactor(
                self.exponential_smoothing_factor,
            ));
        }
        if !is_unit_fraction(self.min_child_order_size_percent_of_parent) {
            return Err(ConfigError::MinChildOrderSize(
                self.min_child_order_size_percent_of_parent,
            ));
        }

        for (index, filter) in self.day_of_week_filters.iter().enumerate() {
            if !filter.is_selling_base() {
                return Err(ConfigError::NotSellingBase {
                    index,
                    descriptor: filter.descriptor().to_string(),
                });
            }
        }

        self.order_constraints.validate()?;
        self.rate_offset.validate().map_err(ConfigError::RateOffset)?;
        if self.price_feed_timeout_ms == 0 {
            return Err(ConfigError::PriceFeedTimeout);
        }

        Ok(())
    }

    /// Buckets at the start of each day in which selling is allowed.
    pub fn selling_buckets(&self) -> i64 {
        let bucket = i64::from(self.parent_bucket_size_seconds.max(1));
        let window = i64::from(self.num_hours_to_sell) * SECONDS_IN_HOUR;
        (window + bucket - 1) / bucket
    }

    pub fn price_feed_timeout(&self) -> Duration {
        Duration::from_millis(self.price_feed_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_config() -> TwapConfig {
        TwapConfig {
            day_of_week_filters: std::array::from_fn(|_| {
                VolumeFilter::sell_base(Size::new(dec!(1000)), FilterMode::Exact)
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TwapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_hours_to_sell, 24);
        assert_eq!(config.parent_bucket_size_seconds, 3600);
        assert_eq!(config.selling_buckets(), 24);
        assert_eq!(config.price_feed_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_num_hours_bounds() {
        for bad in [0, 25] {
            let config = TwapConfig {
                num_hours_to_sell: bad,
                ..open_config()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NumHoursToSell(v)) if v == bad
            ));
        }
        let config = TwapConfig {
            num_hours_to_sell: 24,
            ..open_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bucket_size_bounds() {
        let too_big = TwapConfig {
            parent_bucket_size_seconds: 86_401,
            ..open_config()
        };
        assert!(matches!(
            too_big.validate(),
            Err(ConfigError::ParentBucketSizeOutOfRange(86_401))
        ));

        let zero = TwapConfig {
            parent_bucket_size_seconds: 0,
            ..open_config()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::ParentBucketSizeOutOfRange(0))
        ));

        let uneven = TwapConfig {
            parent_bucket_size_seconds: 7,
            ..open_config()
        };
        assert!(matches!(
            uneven.validate(),
            Err(ConfigError::ParentBucketSizeNotDivisor(7))
        ));

        let whole_day = TwapConfig {
            parent_bucket_size_seconds: 86_400,
            ..open_config()
        };
        assert!(whole_day.validate().is_ok());
    }

    #[test]
    fn test_fraction_bounds() {
        let ceiling = TwapConfig {
            distribute_surplus_over_remaining_intervals_percent_ceiling: dec!(1.5),
            ..open_config()
        };
        assert!(matches!(ceiling.validate(), Err(ConfigError::SurplusCeiling(_))));

        let smoothing = TwapConfig {
            exponential_smoothing_factor: dec!(-0.1),
            ..open_config()
        };
        assert!(matches!(smoothing.validate(), Err(ConfigError::SmoothingFactor(_))));

        let child = TwapConfig {
            min_child_order_size_percent_of_parent: dec!(1.01),
            ..open_config()
        };
        assert!(matches!(child.validate(), Err(ConfigError::MinChildOrderSize(_))));

        for v in [dec!(0.0), dec!(1.0)] {
            let edge = TwapConfig {
                distribute_surplus_over_remaining_intervals_percent_ceiling: v,
                exponential_smoothing_factor: v,
                min_child_order_size_percent_of_parent: v,
                ..open_config()
            };
            assert!(edge.validate().is_ok(), "boundary {v} should be accepted");
        }
    }

    #[test]
    fn test_first_failure_is_reported() {
        let config = TwapConfig {
            num_hours_to_sell: 0,
            parent_bucket_size_seconds: 7,
            ..open_config()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NumHoursToSell(0))));
    }

    #[test]
    fn test_filter_must_sell_base() {
        let mut config = open_config();
        config.day_of_week_filters[3] = "volume/daily/sell/quote/100/exact".parse().unwrap();
        let err = config.validate().unwrap_err();
        match err {
            ConfigError::NotSellingBase { index, descriptor } => {
                assert_eq!(index, 3);
                assert_eq!(descriptor, "volume/daily/sell/quote/100/exact");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_selling_window_rounds_up() {
        let config = TwapConfig {
            num_hours_to_sell: 8,
            parent_bucket_size_seconds: 3600,
            ..open_config()
        };
        assert_eq!(config.selling_buckets(), 8);

        let coarse = TwapConfig {
            num_hours_to_sell: 1,
            parent_bucket_size_seconds: 7200,
            ..open_config()
        };
        assert_eq!(coarse.selling_buckets(), 1);
    }

    #[test]
    fn test_toml_with_defaults() {
        let toml_str = r#"
day_of_week_filters = [
    "volume/daily/sell/base/0/exact",
    "volume/daily/sell/base/1000/exact",
    "volume/daily/sell/base/1000/exact",
    "volume/daily/sell/base/1000/exact",
    "volume/daily/sell/base/1000/exact",
    "volume/daily/sell/base/1000/exact",
    "volume/daily/sell/base/0/exact",
]
"#;
        let config: TwapConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.parent_bucket_size_seconds, 3600);
        assert_eq!(
            config.distribute_surplus_over_remaining_intervals_percent_ceiling,
            dec!(0.2)
        );
        assert_eq!(
            config.day_of_week_filters[1].base_cap_in_base_units().unwrap(),
            Size::new(dec!(1000))
        );
    }
}
