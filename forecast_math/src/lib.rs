//! # Forecast Math
//!
//! Numerical building blocks for additive time series models.
//! This crate provides the design-matrix pieces (Fourier terms, changepoint
//! hinges), a regularised least-squares solver and a few descriptive
//! statistics used when deriving uncertainty bands.

use thiserror::Error;

pub mod fourier;
pub mod regression;
pub mod stats;
pub mod trend;

pub use crate::regression::{DesignMatrix, RidgeSolution};

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular system: pivot {pivot:.3e} at column {column}")]
    Singular { column: usize, pivot: f64 },
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
