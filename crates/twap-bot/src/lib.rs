//! TWAP sell-volume bot.
//!
//! Main application that wires the components together:
//! - Reference price feed (fixed or HTTP)
//! - TWAP level provider with its fill ledger
//! - Tick loop with a per-tick deadline
//! - Prometheus metrics endpoint

pub mod app;
pub mod config;
pub mod error;
pub mod instrumented;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
