//! TWAP sell-volume scheduling engine.
//!
//! Releases a per-weekday base-asset cap evenly across fixed parent buckets
//! of the UTC day:
//! - Per-weekday volume filters resolving the daily cap
//! - Bucket location for any instant
//! - Allotment with surplus redistribution, smoothing and a minimum child size
//! - Sell level pricing off a reference price feed
//!
//! # Architecture
//!
//! ```text
//! Bot tick → TwapLevelProvider.get_levels(max_base, max_quote)
//!             ├─ Clock: now (UTC)
//!             ├─ VolumeFilter: daily cap for the weekday
//!             ├─ BucketScheduler: bucket id / bounds
//!             ├─ ExecutionHistory: volume sold so far (optional)
//!             ├─ compute_allotment: amount to release
//!             └─ PriceFeed + RateOffset + OrderConstraints: sell level
//! ```

pub mod bucket;
pub mod clock;
pub mod config;
pub mod error;
pub mod fill;
pub mod provider;
pub mod schedule;
pub mod volume_filter;

pub use bucket::{BucketInfo, BucketScheduler, BucketSlot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TwapConfig;
pub use error::{ConfigError, MmError, MmResult};
pub use fill::{ExecutionHistory, FillHandler, FillLedger};
pub use provider::{LevelProvider, TickReport, TwapLevelProvider};
pub use schedule::{compute_allotment, Allotment, AllotmentOutcome, ScheduleInputs, ScheduleParams};
pub use volume_filter::{CapUnit, FilterAction, FilterMode, VolumeFilter, VolumeFilterError};
