//! Application error types.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider configuration error: {0}")]
    Provider(#[from] twap_mm::ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] twap_feed::FeedError),

    #[error("Engine error: {0}")]
    Engine(#[from] twap_mm::MmError),

    #[error("Tick exceeded deadline of {0:?}")]
    TickDeadline(Duration),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] twap_telemetry::TelemetryError),
}

impl AppError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.kind(),
            Self::TickDeadline(_) => "tick_deadline",
            Self::Config(_) | Self::Provider(_) => "config",
            Self::Feed(_) => "price_feed",
            Self::Telemetry(_) => "telemetry",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
