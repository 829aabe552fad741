//! Forecasting backends and the forecast data they produce
//!
//! A backend is driven in three steps, each with its own type so that a
//! request owns every piece of mutable state it touches:
//!
//! 1. [`ForecastBackend::configure`] turns seasonality options into a handle,
//! 2. [`BackendHandle::fit`] consumes the handle and returns a fitted model,
//! 3. [`FittedModel::predict`] evaluates the model on an explicit date index.
//!
//! [`adapter::ForecastBackendAdapter`] wraps these calls with horizon
//! validation, index extension and output checks.

use crate::error::{ForecastError, Result};
use crate::series::TimeSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod adapter;
pub mod additive;

/// Smallest accepted forecast horizon in days
pub const MIN_HORIZON_DAYS: u32 = 1;
/// Largest accepted forecast horizon in days
pub const MAX_HORIZON_DAYS: u32 = 365;

/// Validated number of days to forecast past the last observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Horizon(u32);

impl Horizon {
    /// Accepts `MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS`
    pub fn new(days: i64) -> Result<Self> {
        if days < i64::from(MIN_HORIZON_DAYS) || days > i64::from(MAX_HORIZON_DAYS) {
            return Err(ForecastError::InvalidHorizon {
                days,
                min: MIN_HORIZON_DAYS,
                max: MAX_HORIZON_DAYS,
            });
        }
        Ok(Self(days as u32))
    }

    pub fn days(&self) -> usize {
        self.0 as usize
    }
}

/// Point estimate with its uncertainty band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    pub fn new(timestamp: NaiveDate, point_estimate: f64, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            timestamp,
            point_estimate,
            lower_bound,
            upper_bound,
        }
    }

    /// A point with a zero-width band
    pub fn exact(timestamp: NaiveDate, value: f64) -> Self {
        Self::new(timestamp, value, value, value)
    }

    /// `lower <= point <= upper` and all three finite
    pub fn is_consistent(&self) -> bool {
        self.point_estimate.is_finite()
            && self.lower_bound.is_finite()
            && self.upper_bound.is_finite()
            && self.lower_bound <= self.point_estimate
            && self.point_estimate <= self.upper_bound
    }

    /// Band width
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Additive contribution of one model term, aligned with the forecast points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub values: Vec<f64>,
}

impl Component {
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// Forecast covering the observed history followed by the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
    components: Vec<Component>,
}

impl ForecastResult {
    /// Create a forecast; every component must have one value per point
    pub fn new(points: Vec<ForecastPoint>, components: Vec<Component>) -> Result<Self> {
        if let Some(c) = components.iter().find(|c| c.values.len() != points.len()) {
            return Err(ForecastError::ForecastFitError(format!(
                "Component '{}' has {} values for {} points",
                c.name,
                c.values.len(),
                points.len()
            )));
        }

        Ok(Self { points, components })
    }

    /// Create a forecast without a component breakdown
    pub fn from_points(points: Vec<ForecastPoint>) -> Self {
        Self {
            points,
            components: Vec::new(),
        }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Look up a component by name
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Which daily-cycle term the backend fits; at most one is ever active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DailySeasonality {
    /// The backend's own daily component
    BuiltIn,
    /// A user-defined short-period Fourier term
    Custom { period_days: f64, fourier_order: usize },
    /// No daily-cycle term
    Disabled,
}

/// Default Fourier order of a custom short-period term
pub const DEFAULT_CUSTOM_FOURIER_ORDER: usize = 5;

/// User-facing seasonality switches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonalityOptions {
    /// Include the backend's built-in daily component
    pub daily_seasonality: bool,
    /// Period in days of a custom short-period term, used when the built-in one is off
    pub custom_daily_period: Option<f64>,
    /// Fourier order of the custom term
    pub custom_fourier_order: Option<usize>,
}

impl Default for SeasonalityOptions {
    fn default() -> Self {
        Self {
            daily_seasonality: true,
            custom_daily_period: None,
            custom_fourier_order: None,
        }
    }
}

impl SeasonalityOptions {
    /// Built-in daily component only
    pub fn built_in() -> Self {
        Self::default()
    }

    /// Custom short-period term replacing the built-in daily component
    pub fn custom(period_days: f64) -> Self {
        Self {
            daily_seasonality: false,
            custom_daily_period: Some(period_days),
            custom_fourier_order: None,
        }
    }

    /// No daily-cycle term at all
    pub fn disabled() -> Self {
        Self {
            daily_seasonality: false,
            custom_daily_period: None,
            custom_fourier_order: None,
        }
    }

    /// Resolve the switches into the single active daily strategy
    pub fn daily(&self) -> Result<DailySeasonality> {
        match (self.daily_seasonality, self.custom_daily_period) {
            (true, Some(period)) => Err(ForecastError::InvalidParameter(format!(
                "Built-in daily seasonality and a custom period ({}) cannot both be active",
                period
            ))),
            (true, None) => Ok(DailySeasonality::BuiltIn),
            (false, Some(period_days)) => {
                if !(period_days.is_finite() && period_days > 0.0) {
                    return Err(ForecastError::InvalidParameter(format!(
                        "Custom daily period must be positive, got {}",
                        period_days
                    )));
                }
                let fourier_order = self
                    .custom_fourier_order
                    .unwrap_or(DEFAULT_CUSTOM_FOURIER_ORDER);
                if fourier_order == 0 {
                    return Err(ForecastError::InvalidParameter(
                        "Custom Fourier order must be at least 1".to_string(),
                    ));
                }
                Ok(DailySeasonality::Custom {
                    period_days,
                    fourier_order,
                })
            }
            (false, None) => Ok(DailySeasonality::Disabled),
        }
    }
}

/// A forecasting capability that can be configured per request
pub trait ForecastBackend: Debug {
    /// Per-request configured state
    type Handle: BackendHandle;

    /// Resolve seasonality options into a fresh handle
    fn configure(&self, options: &SeasonalityOptions) -> Result<Self::Handle>;

    /// Name of the backend
    fn name(&self) -> &str;
}

/// A configured, not yet fitted, backend instance
pub trait BackendHandle: Debug {
    /// The fitted model produced
    type Model: FittedModel;

    /// Fit on the observed history
    fn fit(self, series: &TimeSeries) -> Result<Self::Model>;
}

/// A fitted model that can be evaluated on arbitrary dates
pub trait FittedModel: Debug {
    /// Point estimates, bands and components for every date of `index`, in order
    fn predict(&self, index: &[NaiveDate]) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}
