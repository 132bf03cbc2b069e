//! Prometheus metrics and structured logging for the TWAP sell bot.
//!
//! - Prometheus metrics for ticks, bucket allotments and the price feed
//! - Structured JSON logging with tracing
//! - `/metrics` and `/health` endpoints

pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use server::{metrics_router, run_metrics_server};
