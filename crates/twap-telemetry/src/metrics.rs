//! Prometheus metrics for the TWAP sell bot.
//!
//! Covers:
//! - Tick outcomes and tick errors
//! - Current bucket, daily cap and released amount
//! - Reference price and price feed latency
//! - Fills reported back by the venue
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram,
    register_int_gauge, Counter, CounterVec, Encoder, Gauge, Histogram, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Ticks by allotment outcome.
/// Labels: outcome (release/outside_window/day_exhausted/bucket_filled/...)
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("twap_ticks_total", "Total ticks by outcome", &["outcome"]).unwrap()
});

/// Ticks aborted by an error.
pub static TICK_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "twap_tick_errors_total",
        "Total ticks aborted by an error",
        &["kind"]
    )
    .unwrap()
});

/// Bucket index of the last tick.
pub static BUCKET_ID: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("twap_bucket_id", "Current parent bucket index").unwrap());

/// Daily base-asset cap in effect.
pub static DAILY_LIMIT: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("twap_daily_limit_base", "Daily base-asset cap in effect").unwrap()
});

/// Base amount offered by the last tick.
pub static RELEASED_BASE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("twap_released_base", "Base amount offered by the last tick").unwrap()
});

/// Levels handed to the strategy loop.
pub static LEVELS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("twap_levels_total", "Total sell levels emitted").unwrap()
});

/// Reference price after the rate offset.
pub static REFERENCE_PRICE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("twap_reference_price", "Reference price after rate offset").unwrap()
});

/// Price feed latency in milliseconds.
pub static PRICE_FEED_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "twap_price_feed_latency_ms",
        "Price feed fetch latency in milliseconds",
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap()
});

/// Base volume sold, as reported by fills.
pub static FILLED_BASE_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("twap_filled_base_total", "Total base volume reported filled").unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a completed tick.
    pub fn tick(outcome: &str) {
        TICKS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record an aborted tick.
    pub fn tick_error(kind: &str) {
        TICK_ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record the bucket a tick fell into.
    pub fn bucket(id: i64, daily_limit: f64) {
        BUCKET_ID.set(id);
        DAILY_LIMIT.set(daily_limit);
    }

    pub fn released(amount: f64) {
        RELEASED_BASE.set(amount);
    }

    pub fn levels_emitted(count: usize) {
        LEVELS_TOTAL.inc_by(count as f64);
    }

    pub fn reference_price(price: f64) {
        REFERENCE_PRICE.set(price);
    }

    pub fn price_feed_latency(latency_ms: f64) {
        PRICE_FEED_LATENCY_MS.observe(latency_ms);
    }

    pub fn filled(base_volume: f64) {
        FILLED_BASE_TOTAL.inc_by(base_volume);
    }
}

/// Render every registered metric in the Prometheus text format.
pub fn gather_text() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counters_show_up_in_text() {
        Metrics::tick("release");
        Metrics::tick_error("price_feed");
        Metrics::bucket(7, 1000.0);

        let text = gather_text().unwrap();
        assert!(text.contains("twap_ticks_total{outcome=\"release\"}"));
        assert!(text.contains("twap_tick_errors_total{kind=\"price_feed\"}"));
        assert!(text.contains("twap_bucket_id 7"));
    }

    #[test]
    fn test_counters_accumulate() {
        let before = TICKS_TOTAL.with_label_values(&["bucket_filled"]).get();
        Metrics::tick("bucket_filled");
        Metrics::tick("bucket_filled");
        let after = TICKS_TOTAL.with_label_values(&["bucket_filled"]).get();
        assert_eq!(after - before, 2.0);
    }
}
