//! Main application orchestration.
//!
//! Coordinates:
//! - Price feed construction
//! - TWAP level provider and fill ledger
//! - Tick loop with per-tick deadline
//! - Metrics endpoint

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use twap_core::{Level, Trade};
use twap_feed::{FixedPriceFeed, GenericPriceFeed, PriceFeed};
use twap_mm::{FillLedger, LevelProvider, TickReport, TwapLevelProvider};
use twap_telemetry::Metrics;

use crate::config::{AppConfig, PriceFeedConfig};
use crate::error::{AppError, AppResult};
use crate::instrumented::InstrumentedPriceFeed;

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Build the configured price feed.
pub fn build_price_feed(config: &PriceFeedConfig) -> AppResult<Arc<dyn PriceFeed>> {
    let feed: Arc<dyn PriceFeed> = match config {
        PriceFeedConfig::Fixed { price } => Arc::new(FixedPriceFeed::new(*price)?),
        PriceFeedConfig::Http {
            url,
            json_path,
            timeout_ms,
        } => Arc::new(GenericPriceFeed::with_timeout(
            url.as_str(),
            json_path.as_str(),
            Duration::from_millis(*timeout_ms),
        )?),
    };
    Ok(Arc::new(InstrumentedPriceFeed::new(feed)))
}

/// Main application.
pub struct Application {
    config: AppConfig,
    provider: TwapLevelProvider,
    ledger: Arc<FillLedger>,
}

impl Application {
    /// Create a new application. Fails if the TWAP settings are invalid.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let feed = build_price_feed(&config.price_feed)?;
        Self::with_price_feed(config, feed)
    }

    /// Create an application on an already built price feed.
    pub fn with_price_feed(config: AppConfig, feed: Arc<dyn PriceFeed>) -> AppResult<Self> {
        config.validate()?;
        let ledger = Arc::new(FillLedger::default());
        let provider =
            TwapLevelProvider::new(config.effective_twap(), feed)?.with_fill_ledger(ledger.clone());

        Ok(Self {
            config,
            provider,
            ledger,
        })
    }

    /// Replace the provider, keeping the rest of the application.
    #[must_use]
    pub fn with_provider(mut self, provider: TwapLevelProvider) -> Self {
        self.provider = provider.with_fill_ledger(self.ledger.clone());
        self
    }

    pub fn provider(&self) -> &TwapLevelProvider {
        &self.provider
    }

    pub fn ledger(&self) -> &Arc<FillLedger> {
        &self.ledger
    }

    /// Run a single tick bounded by the configured deadline.
    pub async fn run_tick(&self) -> AppResult<Vec<Level>> {
        let deadline = self.config.tick_deadline();
        let tick = self.provider.tick(
            self.config.inventory.max_asset_base,
            self.config.inventory.max_asset_quote,
        );

        let report = match tokio::time::timeout(deadline, tick).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                Metrics::tick_error(e.kind());
                return Err(e.into());
            }
            Err(_) => {
                Metrics::tick_error("tick_deadline");
                return Err(AppError::TickDeadline(deadline));
            }
        };

        self.record(&report);
        Ok(report.levels)
    }

    fn record(&self, report: &TickReport) {
        Metrics::tick(report.allotment.outcome.label());
        Metrics::bucket(report.bucket.id, to_f64(report.bucket.daily_limit.inner()));
        Metrics::released(to_f64(report.allotment.release().inner()));
        Metrics::levels_emitted(report.levels.len());
        if let Some(price) = report.reference_price {
            Metrics::reference_price(to_f64(price.inner()));
        }

        if report.levels.is_empty() {
            debug!(
                bucket = %report.bucket,
                outcome = %report.allotment.outcome,
                "No levels this tick"
            );
        }
        for level in &report.levels {
            info!(
                bucket_id = report.bucket.id,
                total_buckets = report.bucket.total_buckets,
                price = %level.price,
                amount = %level.amount,
                "Sell level"
            );
        }
    }

    /// Report an executed trade to every interested handler. Returns whether
    /// any handler recorded it.
    pub fn record_fill(&self, trade: &Trade) -> AppResult<bool> {
        let mut recorded = false;
        for handler in self.provider.fill_handlers() {
            recorded |= handler.handle_fill(trade)?;
        }
        if recorded {
            Metrics::filled(to_f64(trade.base_volume.inner()));
        }
        Ok(recorded)
    }

    /// Run the tick loop until ctrl-c.
    pub async fn run(&self) -> AppResult<()> {
        let metrics_handle = if self.config.telemetry.metrics_port != 0 {
            let port = self.config.telemetry.metrics_port;
            Some(tokio::spawn(async move {
                if let Err(e) = twap_telemetry::run_metrics_server(port).await {
                    error!(error = %e, "Metrics server failed");
                }
            }))
        } else {
            None
        };

        info!(
            tick_interval_ms = self.config.tick_interval_ms,
            tick_deadline_ms = self.config.tick_deadline_ms,
            max_asset_base = %self.config.inventory.max_asset_base,
            max_asset_quote = %self.config.inventory.max_asset_quote,
            "Entering tick loop"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut tick_count = 0u64;
        let mut error_count = 0u64;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tick_count += 1;
                    if let Err(e) = self.run_tick().await {
                        error_count += 1;
                        warn!(error = %e, kind = e.kind(), "Tick failed, retrying next interval");
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!(tick_count, error_count, fills = self.ledger.len(), "Shutting down");

        if let Some(handle) = metrics_handle {
            handle.abort();
        }

        Ok(())
    }
}
