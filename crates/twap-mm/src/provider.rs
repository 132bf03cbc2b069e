//! TWAP sell level provider.
//!
//! Each tick locates the current parent bucket, works out how much base
//! asset the bucket may still release and, if anything, prices a single sell
//! level off the reference price feed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use twap_core::{Level, Price, Size};
use twap_feed::PriceFeed;

use crate::bucket::{weekday_index, BucketInfo, BucketScheduler};
use crate::clock::{Clock, SystemClock};
use crate::config::TwapConfig;
use crate::error::{ConfigError, MmError, MmResult};
use crate::fill::{ExecutionHistory, FillHandler, FillLedger};
use crate::schedule::{compute_allotment, Allotment, ScheduleInputs, ScheduleParams};
use crate::volume_filter::FilterMode;

/// Produces the sell levels the strategy loop should place.
#[async_trait]
pub trait LevelProvider: Send + Sync {
    /// Levels for the current tick, bounded by the inventory available.
    async fn get_levels(
        &self,
        max_asset_base: Size,
        max_asset_quote: Decimal,
    ) -> MmResult<Vec<Level>>;

    /// Handlers that want to hear about executed trades.
    fn fill_handlers(&self) -> Vec<Arc<dyn FillHandler>>;
}

/// Result of one tick, with the bucket and allotment that produced it.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub bucket: BucketInfo,
    pub allotment: Allotment,
    pub reference_price: Option<Price>,
    pub levels: Vec<Level>,
}

/// Releases a daily base-asset cap evenly over the day's parent buckets.
pub struct TwapLevelProvider {
    config: TwapConfig,
    scheduler: BucketScheduler,
    selling_buckets: i64,
    price_feed: Arc<dyn PriceFeed>,
    clock: Arc<dyn Clock>,
    history: Option<Arc<dyn ExecutionHistory>>,
    fill_handlers: Vec<Arc<dyn FillHandler>>,
}

impl std::fmt::Debug for TwapLevelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwapLevelProvider")
            .field("config", &self.config)
            .field("selling_buckets", &self.selling_buckets)
            .field("has_history", &self.history.is_some())
            .field("fill_handlers", &self.fill_handlers.len())
            .finish()
    }
}

impl TwapLevelProvider {
    /// Validate `config` and build a provider on the system clock.
    ///
    /// Does not touch the price feed.
    pub fn new(config: TwapConfig, price_feed: Arc<dyn PriceFeed>) -> Result<Self, ConfigError> {
        config.validate()?;

        let scheduler = BucketScheduler::new(config.parent_bucket_size_seconds);
        let selling_buckets = config.selling_buckets();

        info!(
            num_hours_to_sell = config.num_hours_to_sell,
            parent_bucket_size_seconds = config.parent_bucket_size_seconds,
            selling_buckets,
            surplus_ceiling = %config.distribute_surplus_over_remaining_intervals_percent_ceiling,
            smoothing_factor = %config.exponential_smoothing_factor,
            min_child_pct = %config.min_child_order_size_percent_of_parent,
            "TWAP level provider created"
        );

        Ok(Self {
            config,
            scheduler,
            selling_buckets,
            price_feed,
            clock: Arc::new(SystemClock),
            history: None,
            fill_handlers: Vec::new(),
        })
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Read executed volume from `history`.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn ExecutionHistory>) -> Self {
        self.history = Some(history);
        self
    }

    /// Add a handler to the list returned by `fill_handlers`.
    #[must_use]
    pub fn with_fill_handler(mut self, handler: Arc<dyn FillHandler>) -> Self {
        self.fill_handlers.push(handler);
        self
    }

    /// Use `ledger` both as the execution history and as a fill handler.
    #[must_use]
    pub fn with_fill_ledger(self, ledger: Arc<FillLedger>) -> Self {
        self.with_history(ledger.clone()).with_fill_handler(ledger)
    }

    pub fn config(&self) -> &TwapConfig {
        &self.config
    }

    /// Build the bucket description for `now`, resolving the day's cap.
    pub fn make_bucket_info(&self, now: DateTime<Utc>) -> MmResult<BucketInfo> {
        let weekday = weekday_index(now);
        let filter = &self.config.day_of_week_filters[weekday];
        let daily_limit = filter
            .base_cap_in_base_units()
            .map_err(|source| MmError::CapResolution { weekday, source })?;

        let slot = self.scheduler.locate(now);
        Ok(BucketInfo::new(slot, now, weekday, filter.clone(), daily_limit))
    }

    fn schedule_params(&self, mode: FilterMode) -> ScheduleParams {
        ScheduleParams {
            surplus_ceiling: self
                .config
                .distribute_surplus_over_remaining_intervals_percent_ceiling,
            smoothing_factor: self.config.exponential_smoothing_factor,
            min_child_pct: self.config.min_child_order_size_percent_of_parent,
            trim_to_capacity: mode == FilterMode::Exact,
        }
    }

    /// Leading buckets of the day that started before `since`.
    fn buckets_started_before(&self, bucket: &BucketInfo, since: DateTime<Utc>) -> i64 {
        let elapsed = (since - bucket.day_start).num_seconds();
        if elapsed <= 0 {
            return 0;
        }
        self.scheduler.buckets_covering(elapsed).min(bucket.id)
    }

    fn schedule_inputs(&self, bucket: &BucketInfo) -> MmResult<ScheduleInputs> {
        let mut inputs = ScheduleInputs {
            daily_limit: bucket.daily_limit,
            selling_buckets: self.selling_buckets,
            bucket_id: bucket.id,
            sold_before_bucket: Size::ZERO,
            unobserved_buckets: bucket.id,
            observed_previous: None,
            sold_in_bucket: Size::ZERO,
        };

        let Some(history) = &self.history else {
            return Ok(inputs);
        };

        let size = self.scheduler.bucket_size_seconds();
        let unobserved = self.buckets_started_before(bucket, history.observed_since());
        let observed_start = bucket.day_start + Duration::seconds(unobserved * size);

        inputs.unobserved_buckets = unobserved;
        inputs.sold_before_bucket =
            history.base_sold_between(observed_start, bucket.bucket_start)?;
        inputs.sold_in_bucket = history.base_sold_between(bucket.bucket_start, bucket.now)?;
        if bucket.id > unobserved {
            let prev_start = bucket.bucket_start - Duration::seconds(size);
            inputs.observed_previous =
                Some(history.base_sold_between(prev_start, bucket.bucket_start)?);
        }
        Ok(inputs)
    }

    async fn reference_price(&self) -> MmResult<Price> {
        let timeout = self.config.price_feed_timeout();
        let raw = tokio::time::timeout(timeout, self.price_feed.price())
            .await
            .map_err(|_| MmError::PriceFeedTimeout(timeout))??;
        Ok(self.config.rate_offset.apply(raw)?)
    }

    /// Run one tick and return everything it decided.
    pub async fn tick(
        &self,
        max_asset_base: Size,
        max_asset_quote: Decimal,
    ) -> MmResult<TickReport> {
        let now = self.clock.now();
        let bucket = self.make_bucket_info(now)?;
        debug!(bucket = %bucket, "Evaluating bucket");

        let inputs = self.schedule_inputs(&bucket)?;
        let allotment =
            compute_allotment(&inputs, &self.schedule_params(bucket.volume_filter.mode()));

        let release = allotment.release();
        if !release.is_positive() {
            debug!(
                bucket_id = bucket.id,
                outcome = %allotment.outcome,
                "No volume to release"
            );
            return Ok(TickReport {
                bucket,
                allotment,
                reference_price: None,
                levels: Vec::new(),
            });
        }

        let price = self.reference_price().await?;
        let amount = release.min(max_asset_base);

        let levels = match self
            .config
            .order_constraints
            .fit_sell_level(price, amount, Some(max_asset_quote))
        {
            Ok(level) => vec![level],
            Err(violation) => {
                warn!(
                    bucket_id = bucket.id,
                    price = %price,
                    amount = %amount,
                    reason = %violation,
                    "Level dropped by order constraints"
                );
                Vec::new()
            }
        };

        debug!(
            bucket_id = bucket.id,
            nominal = %allotment.nominal,
            surplus_share = %allotment.surplus_share,
            smoothed = %allotment.smoothed,
            release = %release,
            price = %price,
            levels = levels.len(),
            "Computed levels"
        );

        Ok(TickReport {
            bucket,
            allotment,
            reference_price: Some(price),
            levels,
        })
    }
}

#[async_trait]
impl LevelProvider for TwapLevelProvider {
    async fn get_levels(
        &self,
        max_asset_base: Size,
        max_asset_quote: Decimal,
    ) -> MmResult<Vec<Level>> {
        Ok(self.tick(max_asset_base, max_asset_quote).await?.levels)
    }

    fn fill_handlers(&self) -> Vec<Arc<dyn FillHandler>> {
        self.fill_handlers.clone()
    }
}
