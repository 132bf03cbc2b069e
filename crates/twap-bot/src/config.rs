//! Application configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use twap_core::{ConstraintOverrides, Price, Size};
use twap_mm::TwapConfig;

use crate::error::{AppError, AppResult};

/// Where the reference price comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PriceFeedConfig {
    /// Constant price.
    Fixed { price: Price },
    /// HTTP GET returning JSON; `json_path` is dotted, e.g. `data.0.price`.
    Http {
        url: String,
        json_path: String,
        #[serde(default = "default_http_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self::Fixed { price: Price::ONE }
    }
}

/// Balances the bot may sell from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Base asset available to sell.
    pub max_asset_base: Size,
    /// Quote asset the bot may receive.
    pub max_asset_quote: Decimal,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_asset_base: Size::ZERO,
            max_asset_quote: Decimal::ZERO,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus metrics port (0 = disabled).
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info,twap=debug".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Time between ticks (ms).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Upper bound on a single tick (ms). A tick running longer is abandoned
    /// and retried on the next interval.
    #[serde(default = "default_tick_deadline_ms")]
    pub tick_deadline_ms: u64,

    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub price_feed: PriceFeedConfig,

    pub twap: TwapConfig,

    /// Operator overrides for the venue constraints in `twap`.
    #[serde(default)]
    pub constraint_overrides: ConstraintOverrides,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_tick_interval_ms() -> u64 {
    5_000
}

fn default_tick_deadline_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            tick_deadline_ms: default_tick_deadline_ms(),
            inventory: InventoryConfig::default(),
            price_feed: PriceFeedConfig::default(),
            twap: TwapConfig::default(),
            constraint_overrides: ConstraintOverrides::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the runner settings. The TWAP section is validated by the
    /// provider itself.
    pub fn validate(&self) -> AppResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(AppError::Config("tick_interval_ms must be positive".to_string()));
        }
        if self.tick_deadline_ms == 0 {
            return Err(AppError::Config("tick_deadline_ms must be positive".to_string()));
        }
        if self.inventory.max_asset_base < Size::ZERO
            || self.inventory.max_asset_quote < Decimal::ZERO
        {
            return Err(AppError::Config(
                "inventory limits must not be negative".to_string(),
            ));
        }
        if let PriceFeedConfig::Http { timeout_ms: 0, .. } = self.price_feed {
            return Err(AppError::Config(
                "price_feed.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// TWAP settings with the constraint overrides applied.
    pub fn effective_twap(&self) -> TwapConfig {
        let mut twap = self.twap.clone();
        if !self.constraint_overrides.is_empty() {
            twap.order_constraints = twap
                .order_constraints
                .with_overrides(&self.constraint_overrides);
        }
        twap
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn tick_deadline(&self) -> Duration {
        Duration::from_millis(self.tick_deadline_ms)
    }
}
