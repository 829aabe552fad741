//! Error types for the price_forecast crate

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the price_forecast crate
///
/// Every pipeline stage returns this type and the orchestrator hands it back
/// unchanged, so the variant names the stage that failed.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Acquisition failed: unknown symbol, unreadable source or no rows
    #[error("Data source error: {0}")]
    DataSourceError(String),

    /// No usable observations remained after preparation
    #[error("Empty series: no usable observations after filtering")]
    EmptySeries,

    /// Too few observations to estimate the seasonal model
    #[error("Insufficient history: need at least {required} observations, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// Requested horizon outside the accepted range
    #[error("Invalid horizon: {days} days (expected {min}..={max})")]
    InvalidHorizon { days: i64, min: u32, max: u32 },

    /// The backend could not fit the series or produced an invalid forecast
    #[error("Forecast fit error: {0}")]
    ForecastFitError(String),

    /// Evaluation found no common timestamps between series and fitted values
    #[error("No aligned points between observed series and historical forecast")]
    NoAlignedPoints,

    /// Error from invalid parameters or configuration values
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The request was cancelled before the fit step
    #[error("Forecast cancelled")]
    Cancelled,

    /// A date that could not be parsed
    #[error("Invalid date '{value}' in {context}")]
    InvalidDate { value: String, context: String },

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV decoding
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from configuration parsing
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from the numerical kernels
    #[error("Math error: {0}")]
    MathError(#[from] forecast_math::MathError),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Shorthand for a date parse failure
    pub fn invalid_date(value: &str, context: impl Into<String>) -> Self {
        ForecastError::InvalidDate {
            value: value.to_string(),
            context: context.into(),
        }
    }

    /// Shorthand for a backend failure that names the offending date
    pub fn fit_at(date: NaiveDate, reason: impl std::fmt::Display) -> Self {
        ForecastError::ForecastFitError(format!("{} at {}", reason, date))
    }
}
