//! # Price Forecast
//!
//! Daily closing-price forecasting for equities.
//!
//! ## Features
//!
//! - Market data from CSV files or memory, with a configurable lookback window
//! - Series preparation: missing closes dropped, duplicate dates collapsed
//! - Additive trend + seasonality model with uncertainty bands
//! - Optional custom short-period seasonality in place of the daily term
//! - In-sample accuracy (MSE, RMSE, MAPE) of the fitted values
//!
//! ## Quick Start
//!
//! ```no_run
//! use price_forecast::data::CsvDataSource;
//! use price_forecast::models::additive::AdditiveBackend;
//! use price_forecast::pipeline::{ForecastRequest, PipelineOrchestrator};
//!
//! let orchestrator = PipelineOrchestrator::new(CsvDataSource::new("data"), AdditiveBackend::default());
//! let result = orchestrator.run(&ForecastRequest::new("THYAO.IS").with_horizon(30))?;
//!
//! println!("{}", result.metrics);
//! for point in &result.future {
//!     println!("{} {:.2}", point.timestamp, point.point_estimate);
//! }
//! # Ok::<(), price_forecast::ForecastError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod series;
pub mod split;
pub mod utils;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::data::{CsvDataSource, InMemorySource, Lookback, MarketDataSource, RawRow};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::AccuracyMetrics;
pub use crate::models::{
    DailySeasonality, ForecastBackend, ForecastPoint, ForecastResult, Horizon, SeasonalityOptions,
};
pub use crate::pipeline::{ForecastRequest, PipelineOrchestrator, PipelineResult};
pub use crate::series::{ObservedPoint, SeriesPreparer, TimeSeries};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
