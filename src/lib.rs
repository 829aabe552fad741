//! # Stock Forecast
//!
//! Umbrella crate for the workspace.
//!
//! - [`price_forecast`]: data sources, series preparation, the additive
//!   forecasting model, accuracy metrics and the end-to-end pipeline
//! - [`forecast_math`]: the numerical kernels behind the model
//!
//! ## Example
//!
//! ```
//! use stock_forecast_workspace::price_forecast::catalog::BIST50_SYMBOLS;
//! use stock_forecast_workspace::price_forecast::models::Horizon;
//!
//! assert!(BIST50_SYMBOLS.contains(&"THYAO.IS"));
//! assert!(Horizon::new(30).is_ok());
//! ```

pub use forecast_math;
pub use price_forecast;
