//! Price feed wrapper recording fetch latency.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use twap_core::Price;
use twap_feed::{FeedResult, PriceFeed};
use twap_telemetry::Metrics;

pub struct InstrumentedPriceFeed {
    inner: Arc<dyn PriceFeed>,
}

impl InstrumentedPriceFeed {
    pub fn new(inner: Arc<dyn PriceFeed>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PriceFeed for InstrumentedPriceFeed {
    async fn price(&self) -> FeedResult<Price> {
        let started = Instant::now();
        let result = self.inner.price().await;
        Metrics::price_feed_latency(started.elapsed().as_secs_f64() * 1000.0);
        result
    }
}
