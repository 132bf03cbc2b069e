//! Per-bucket sell allotment.
//!
//! Turns the day's cap, the bucket position and what has already been sold
//! into the amount of base asset to offer for the rest of the bucket:
//!
//! ```text
//! nominal   = daily_limit / selling_buckets
//! sold      = sold_before_bucket + nominal * unobserved_buckets
//! surplus   = max(nominal * id - sold, 0)
//! share     = min(surplus / remaining_buckets, ceiling * remaining_capacity)
//! target    = nominal + share
//! smoothed  = factor * observed_prev + (1 - factor) * target   (if observed)
//! parent    = smoothed
//! remaining = parent - sold_in_bucket, bounded by what is left of the day
//! ```
//!
//! A remaining amount below `min_child_pct * nominal` is held back; it is not
//! lost, since the next bucket sees it as surplus.
//!
//! Buckets the execution history does not cover are assumed to have sold
//! exactly their nominal share.

use rust_decimal::Decimal;
use std::fmt;

use twap_core::Size;

/// Tunables for the allotment, taken from `TwapConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleParams {
    pub surplus_ceiling: Decimal,
    pub smoothing_factor: Decimal,
    pub min_child_pct: Decimal,
    /// Trim to the remaining daily capacity (true) or drop when it binds.
    pub trim_to_capacity: bool,
}

/// Execution state of the day at the time of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleInputs {
    pub daily_limit: Size,
    pub selling_buckets: i64,
    pub bucket_id: i64,
    /// Observed sales today before the current bucket started.
    pub sold_before_bucket: Size,
    /// Leading buckets of the day with no execution history.
    pub unobserved_buckets: i64,
    /// Sold in the previous bucket, if known.
    pub observed_previous: Option<Size>,
    /// Sold so far in the current bucket.
    pub sold_in_bucket: Size,
}

/// What the bucket should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllotmentOutcome {
    /// Offer this much base asset.
    Release(Size),
    /// The bucket lies outside the day's selling window.
    OutsideSellingWindow,
    /// The daily cap is used up (or zero).
    DayExhausted,
    /// The bucket's parent allotment has already been sold.
    BucketFilled,
    /// The amount left is under the minimum child size; held for later.
    BelowMinChild { remaining: Size, min_child: Size },
    /// The allotment exceeds the remaining daily capacity and the filter
    /// drops instead of trimming.
    ExceedsCapacity { wanted: Size, capacity: Size },
}

impl AllotmentOutcome {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Release(_) => "release",
            Self::OutsideSellingWindow => "outside_window",
            Self::DayExhausted => "day_exhausted",
            Self::BucketFilled => "bucket_filled",
            Self::BelowMinChild { .. } => "below_min_child",
            Self::ExceedsCapacity { .. } => "exceeds_capacity",
        }
    }
}

impl fmt::Display for AllotmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release(amount) => write!(f, "release {amount}"),
            Self::OutsideSellingWindow => write!(f, "outside selling window"),
            Self::DayExhausted => write!(f, "day exhausted"),
            Self::BucketFilled => write!(f, "bucket filled"),
            Self::BelowMinChild {
                remaining,
                min_child,
            } => write!(f, "below min child ({remaining} < {min_child})"),
            Self::ExceedsCapacity { wanted, capacity } => {
                write!(f, "exceeds capacity ({wanted} > {capacity})")
            }
        }
    }
}

/// Intermediate values, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allotment {
    pub nominal: Size,
    pub surplus: Size,
    pub surplus_share: Size,
    pub target: Size,
    pub smoothed: Size,
    pub parent: Size,
    pub min_child: Size,
    pub outcome: AllotmentOutcome,
}

impl Allotment {
    fn empty(outcome: AllotmentOutcome) -> Self {
        Self {
            nominal: Size::ZERO,
            surplus: Size::ZERO,
            surplus_share: Size::ZERO,
            target: Size::ZERO,
            smoothed: Size::ZERO,
            parent: Size::ZERO,
            min_child: Size::ZERO,
            outcome,
        }
    }

    /// Amount to offer, zero unless the outcome is `Release`.
    pub fn release(&self) -> Size {
        match self.outcome {
            AllotmentOutcome::Release(amount) => amount,
            _ => Size::ZERO,
        }
    }
}

/// Compute the allotment for one tick.
pub fn compute_allotment(inputs: &ScheduleInputs, params: &ScheduleParams) -> Allotment {
    if inputs.selling_buckets <= 0
        || inputs.bucket_id < 0
        || inputs.bucket_id >= inputs.selling_buckets
    {
        return Allotment::empty(AllotmentOutcome::OutsideSellingWindow);
    }

    let nominal = inputs.daily_limit / Decimal::from(inputs.selling_buckets);
    let unobserved = inputs.unobserved_buckets.clamp(0, inputs.bucket_id);
    let sold_before = inputs.sold_before_bucket + nominal * Decimal::from(unobserved);

    let capacity_at_start = inputs.daily_limit.saturating_sub(sold_before);
    let capacity_now = capacity_at_start.saturating_sub(inputs.sold_in_bucket);
    if !capacity_now.is_positive() {
        return Allotment::empty(AllotmentOutcome::DayExhausted);
    }

    // (a) surplus carried over from earlier buckets today
    let expected_before = nominal * Decimal::from(inputs.bucket_id);
    let surplus = expected_before.saturating_sub(sold_before);
    let remaining_buckets = inputs.selling_buckets - inputs.bucket_id;
    let even_share = surplus / Decimal::from(remaining_buckets);
    let share_cap = capacity_at_start * params.surplus_ceiling;
    let surplus_share = even_share.min(share_cap);
    let target = nominal + surplus_share;

    // (b) exponential smoothing against the previous bucket's execution
    let smoothed = match inputs.observed_previous {
        Some(observed) => {
            observed * params.smoothing_factor
                + target * (Decimal::ONE - params.smoothing_factor)
        }
        None => target,
    };

    let parent = smoothed;
    let min_child = nominal * params.min_child_pct;

    let wanted = parent.saturating_sub(inputs.sold_in_bucket);
    let outcome = if !wanted.is_positive() {
        AllotmentOutcome::BucketFilled
    } else if wanted > capacity_now && !params.trim_to_capacity {
        AllotmentOutcome::ExceedsCapacity {
            wanted,
            capacity: capacity_now,
        }
    } else {
        // (c) minimum child order floor
        let remaining = wanted.min(capacity_now);
        if remaining < min_child {
            AllotmentOutcome::BelowMinChild {
                remaining,
                min_child,
            }
        } else {
            AllotmentOutcome::Release(remaining)
        }
    };

    Allotment {
        nominal,
        surplus,
        surplus_share,
        target,
        smoothed,
        parent,
        min_child,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params() -> ScheduleParams {
        ScheduleParams {
            surplus_ceiling: dec!(1),
            smoothing_factor: dec!(0),
            min_child_pct: dec!(0),
            trim_to_capacity: true,
        }
    }

    fn on_schedule(bucket_id: i64) -> ScheduleInputs {
        let nominal = dec!(1000) / dec!(24);
        ScheduleInputs {
            daily_limit: Size::new(dec!(1000)),
            selling_buckets: 24,
            bucket_id,
            sold_before_bucket: Size::new(nominal * Decimal::from(bucket_id)),
            unobserved_buckets: 0,
            observed_previous: None,
            sold_in_bucket: Size::ZERO,
        }
    }

    fn approx(a: Size, b: Decimal) -> bool {
        (a.inner() - b).abs() < dec!(0.001)
    }

    #[test]
    fn test_nominal_share_of_daily_cap() {
        let a = compute_allotment(&on_schedule(0), &params());
        assert!(approx(a.nominal, dec!(41.667)));
        assert_eq!(a.surplus, Size::ZERO);
        assert!(approx(a.release(), dec!(41.667)));
    }

    #[test]
    fn test_on_schedule_mid_day_has_no_surplus() {
        let a = compute_allotment(&on_schedule(12), &params());
        assert!(approx(a.surplus, dec!(0)));
        assert!(approx(a.release(), dec!(41.667)));
    }

    #[test]
    fn test_surplus_spread_over_remaining_buckets() {
        // Nothing sold in the first 12 buckets: 500 surplus over 12 buckets.
        let inputs = ScheduleInputs {
            sold_before_bucket: Size::ZERO,
            ..on_schedule(12)
        };
        let a = compute_allotment(&inputs, &params());
        assert!(approx(a.surplus, dec!(500)));
        assert!(approx(a.surplus_share, dec!(41.667)));
        assert!(approx(a.release(), dec!(83.333)));
    }

    #[test]
    fn test_unobserved_buckets_count_as_on_schedule() {
        // No history at all: nothing is surplus and the day keeps its shape.
        let blind = ScheduleInputs {
            sold_before_bucket: Size::ZERO,
            unobserved_buckets: 23,
            ..on_schedule(23)
        };
        let a = compute_allotment(&blind, &params());
        assert_eq!(a.surplus, Size::ZERO);
        assert!(approx(a.release(), dec!(41.667)));

        // History from bucket 12 on, 100 sold since: surplus is only the
        // shortfall of the observed buckets.
        let partial = ScheduleInputs {
            sold_before_bucket: Size::new(dec!(100)),
            unobserved_buckets: 12,
            ..on_schedule(16)
        };
        let a = compute_allotment(&partial, &params());
        assert!(approx(a.surplus, dec!(66.667)));
        assert!(approx(a.surplus_share, dec!(8.333)));
        assert!(approx(a.release(), dec!(50)));
    }

    #[test]
    fn test_unobserved_buckets_consume_capacity() {
        // Started at bucket 12 and sold 500 since: the earlier half of the
        // day is assumed sold, so the cap is reached.
        let inputs = ScheduleInputs {
            sold_before_bucket: Size::new(dec!(500)),
            unobserved_buckets: 12,
            ..on_schedule(23)
        };
        let a = compute_allotment(&inputs, &params());
        assert!(a.release() <= Size::new(dec!(0.001)));
    }

    #[test]
    fn test_surplus_ceiling_bounds_share() {
        // 5% of the 1000 remaining = 50 per bucket at most.
        let inputs = ScheduleInputs {
            sold_before_bucket: Size::ZERO,
            ..on_schedule(20)
        };
        let bounded = ScheduleParams {
            surplus_ceiling: dec!(0.05),
            ..params()
        };
        let a = compute_allotment(&inputs, &bounded);
        // even share would be 833.33 / 4 = 208.33
        assert_eq!(a.surplus_share, Size::new(dec!(50)));
        assert!(approx(a.release(), dec!(91.667)));

        let none = ScheduleParams {
            surplus_ceiling: dec!(0),
            ..params()
        };
        let a = compute_allotment(&inputs, &none);
        assert_eq!(a.surplus_share, Size::ZERO);
        assert!(approx(a.release(), dec!(41.667)));
    }

    #[test]
    fn test_smoothing_blends_observed_execution() {
        let inputs = ScheduleInputs {
            observed_previous: Some(Size::new(dec!(20))),
            ..on_schedule(5)
        };
        let half = ScheduleParams {
            smoothing_factor: dec!(0.5),
            ..params()
        };
        let a = compute_allotment(&inputs, &half);
        // 0.5 * 20 + 0.5 * 41.667
        assert!(approx(a.smoothed, dec!(30.833)));
        assert!(approx(a.release(), dec!(30.833)));

        let ignore = compute_allotment(&inputs, &params());
        assert!(approx(ignore.release(), dec!(41.667)));

        let full = ScheduleParams {
            smoothing_factor: dec!(1),
            ..params()
        };
        assert_eq!(compute_allotment(&inputs, &full).release(), Size::new(dec!(20)));
    }

    #[test]
    fn test_sold_in_bucket_reduces_release() {
        let inputs = ScheduleInputs {
            sold_in_bucket: Size::new(dec!(30)),
            ..on_schedule(3)
        };
        let a = compute_allotment(&inputs, &params());
        assert!(approx(a.release(), dec!(11.667)));

        let filled = ScheduleInputs {
            sold_in_bucket: Size::new(dec!(45)),
            ..on_schedule(3)
        };
        assert_eq!(
            compute_allotment(&filled, &params()).outcome,
            AllotmentOutcome::BucketFilled
        );
    }

    #[test]
    fn test_min_child_floor_holds_back() {
        let inputs = ScheduleInputs {
            sold_in_bucket: Size::new(dec!(40)),
            ..on_schedule(3)
        };
        let floor = ScheduleParams {
            min_child_pct: dec!(0.1),
            ..params()
        };
        let a = compute_allotment(&inputs, &floor);
        assert!(matches!(a.outcome, AllotmentOutcome::BelowMinChild { .. }));
        assert_eq!(a.release(), Size::ZERO);
    }

    #[test]
    fn test_outside_selling_window() {
        let inputs = ScheduleInputs {
            selling_buckets: 8,
            ..on_schedule(8)
        };
        assert_eq!(
            compute_allotment(&inputs, &params()).outcome,
            AllotmentOutcome::OutsideSellingWindow
        );
    }

    #[test]
    fn test_day_exhausted() {
        let inputs = ScheduleInputs {
            sold_before_bucket: Size::new(dec!(1000)),
            ..on_schedule(10)
        };
        assert_eq!(
            compute_allotment(&inputs, &params()).outcome,
            AllotmentOutcome::DayExhausted
        );

        let closed = ScheduleInputs {
            daily_limit: Size::ZERO,
            sold_before_bucket: Size::ZERO,
            ..on_schedule(0)
        };
        assert_eq!(
            compute_allotment(&closed, &params()).outcome,
            AllotmentOutcome::DayExhausted
        );
    }

    #[test]
    fn test_capacity_trim_versus_drop() {
        // Observed execution pushes the parent above what is left for the day.
        let inputs = ScheduleInputs {
            daily_limit: Size::new(dec!(1000)),
            selling_buckets: 24,
            bucket_id: 23,
            sold_before_bucket: Size::new(dec!(990)),
            unobserved_buckets: 0,
            observed_previous: Some(Size::new(dec!(100))),
            sold_in_bucket: Size::new(dec!(5)),
        };
        let smoothing = ScheduleParams {
            smoothing_factor: dec!(1),
            ..params()
        };
        let trimmed = compute_allotment(&inputs, &smoothing);
        assert_eq!(trimmed.parent, Size::new(dec!(100)));
        assert_eq!(trimmed.release(), Size::new(dec!(5)));

        let dropping = ScheduleParams {
            trim_to_capacity: false,
            ..smoothing
        };
        let dropped = compute_allotment(&inputs, &dropping);
        assert_eq!(
            dropped.outcome,
            AllotmentOutcome::ExceedsCapacity {
                wanted: Size::new(dec!(95)),
                capacity: Size::new(dec!(5)),
            }
        );
        assert_eq!(dropped.release(), Size::ZERO);
    }

    #[test]
    fn test_release_never_exceeds_daily_capacity() {
        for bucket_id in 0..24 {
            for sold in [dec!(0), dec!(250), dec!(900), dec!(999)] {
                let inputs = ScheduleInputs {
                    sold_before_bucket: Size::new(sold),
                    observed_previous: Some(Size::new(dec!(400))),
                    ..on_schedule(bucket_id)
                };
                let p = ScheduleParams {
                    surplus_ceiling: dec!(1),
                    smoothing_factor: dec!(0.7),
                    min_child_pct: dec!(0),
                    trim_to_capacity: true,
                };
                let a = compute_allotment(&inputs, &p);
                assert!(a.release() <= Size::new(dec!(1000) - sold));
            }
        }
    }
}
