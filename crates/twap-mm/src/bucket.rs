//! Time-bucket arithmetic for the trading day.
//!
//! A UTC day is split into fixed-size parent buckets. Everything here is a
//! pure function of the timestamp passed in, so any tick can be replayed.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use std::fmt;

use twap_core::Size;

use crate::volume_filter::VolumeFilter;

/// Seconds in a calendar day (UTC has no DST).
pub const SECONDS_IN_DAY: i64 = 24 * 60 * 60;

/// Midnight at the start of the day containing `now`.
#[must_use]
pub fn floor_date(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Midnight at the start of the following day.
#[must_use]
pub fn ceil_date(now: DateTime<Utc>) -> DateTime<Utc> {
    floor_date(now) + Duration::days(1)
}

/// Weekday index used to pick the day's volume filter (Sunday = 0).
#[must_use]
pub fn weekday_index(now: DateTime<Utc>) -> usize {
    now.weekday().num_days_from_sunday() as usize
}

/// Position of a timestamp within its day's buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSlot {
    /// Bucket index within the day (0-based).
    pub id: i64,
    /// Number of buckets in the day.
    pub total_buckets: i64,
    /// Seconds since the start of the day.
    pub seconds_elapsed: i64,
    pub day_start: DateTime<Utc>,
    pub bucket_start: DateTime<Utc>,
    /// Exclusive end of the bucket, capped at the end of the day.
    pub bucket_end: DateTime<Utc>,
}

/// Splits days into parent buckets of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketScheduler {
    bucket_size_seconds: i64,
}

impl BucketScheduler {
    /// Create a scheduler. `bucket_size_seconds` must be positive; the
    /// provider validates this before constructing one.
    pub fn new(bucket_size_seconds: u32) -> Self {
        Self {
            bucket_size_seconds: i64::from(bucket_size_seconds.max(1)),
        }
    }

    pub fn bucket_size_seconds(&self) -> i64 {
        self.bucket_size_seconds
    }

    /// Number of buckets needed to cover `seconds` (ceiling division).
    #[must_use]
    pub fn buckets_covering(&self, seconds: i64) -> i64 {
        (seconds + self.bucket_size_seconds - 1) / self.bucket_size_seconds
    }

    /// Locate `now` within its day.
    #[must_use]
    pub fn locate(&self, now: DateTime<Utc>) -> BucketSlot {
        let day_start = floor_date(now);
        let day_end = ceil_date(now);
        let seconds_today = (day_end - day_start).num_seconds();
        let total_buckets = self.buckets_covering(seconds_today);

        let seconds_elapsed = (now - day_start).num_seconds();
        let id = seconds_elapsed / self.bucket_size_seconds;

        let bucket_start = day_start + Duration::seconds(id * self.bucket_size_seconds);
        let bucket_end =
            (bucket_start + Duration::seconds(self.bucket_size_seconds)).min(day_end);

        BucketSlot {
            id,
            total_buckets,
            seconds_elapsed,
            day_start,
            bucket_start,
            bucket_end,
        }
    }
}

/// Everything the provider knows about the bucket a tick falls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    pub id: i64,
    pub total_buckets: i64,
    pub now: DateTime<Utc>,
    pub seconds_elapsed: i64,
    pub day_start: DateTime<Utc>,
    pub bucket_start: DateTime<Utc>,
    pub bucket_end: DateTime<Utc>,
    pub weekday_index: usize,
    pub volume_filter: VolumeFilter,
    /// Resolved daily base-asset cap.
    pub daily_limit: Size,
}

impl BucketInfo {
    pub fn new(
        slot: BucketSlot,
        now: DateTime<Utc>,
        weekday_index: usize,
        volume_filter: VolumeFilter,
        daily_limit: Size,
    ) -> Self {
        Self {
            id: slot.id,
            total_buckets: slot.total_buckets,
            now,
            seconds_elapsed: slot.seconds_elapsed,
            day_start: slot.day_start,
            bucket_start: slot.bucket_start,
            bucket_end: slot.bucket_end,
            weekday_index,
            volume_filter,
            daily_limit,
        }
    }
}

impl fmt::Display for BucketInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BucketInfo[ID={}, totalBuckets={}, now={} (day={}, secondsElapsed={}), volFilter={}, dailyLimit={:.8}]",
            self.id,
            self.total_buckets,
            self.now.to_rfc3339(),
            self.now.weekday(),
            self.seconds_elapsed,
            self.volume_filter,
            self.daily_limit.inner(),
        )
    }
}
