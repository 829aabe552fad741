//! Uniform driver around a [`ForecastBackend`]
//!
//! The adapter owns the date index a forecast is evaluated on: every observed
//! date followed by `horizon` consecutive calendar days. Whatever the backend
//! returns is checked against that index before it reaches the caller.

use super::{BackendHandle, FittedModel, ForecastBackend, ForecastResult, Horizon, SeasonalityOptions};
use crate::error::{ForecastError, Result};
use crate::series::TimeSeries;
use crate::utils::future_dates;
use chrono::NaiveDate;
use tracing::debug;

/// Configures, fits and extends any backend the same way
#[derive(Debug, Clone)]
pub struct ForecastBackendAdapter<B> {
    backend: B,
}

impl<B: ForecastBackend> ForecastBackendAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Produce a fresh handle with exactly one daily-cycle strategy active
    pub fn configure(&self, options: &SeasonalityOptions) -> Result<B::Handle> {
        let daily = options.daily()?;
        debug!(backend = self.backend.name(), ?daily, "configuring backend");
        self.backend.configure(options).map_err(as_fit_error)
    }

    /// Fit a configured handle on the observed series
    pub fn fit(
        &self,
        handle: B::Handle,
        series: &TimeSeries,
    ) -> Result<<B::Handle as BackendHandle>::Model> {
        if series.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        handle.fit(series).map_err(as_fit_error)
    }

    /// Observed dates followed by `horizon` consecutive days after the cutoff
    pub fn forecast_index(series: &TimeSeries, horizon: Horizon) -> Result<Vec<NaiveDate>> {
        let cutoff = series.cutoff().ok_or(ForecastError::EmptySeries)?;
        let mut index = series.timestamps();
        index.extend(future_dates(cutoff, horizon.days())?);
        Ok(index)
    }

    /// Evaluate a fitted model over history plus horizon and validate the output
    pub fn extend_and_predict<M: FittedModel>(
        &self,
        model: &M,
        series: &TimeSeries,
        horizon: Horizon,
    ) -> Result<ForecastResult> {
        let index = Self::forecast_index(series, horizon)?;
        let forecast = model.predict(&index).map_err(as_fit_error)?;
        validate_forecast(&forecast, &index)?;

        debug!(
            model = model.name(),
            points = forecast.len(),
            horizon = horizon.days(),
            "extended forecast"
        );
        Ok(forecast)
    }
}

/// Check that a forecast covers `index` exactly, in order, with consistent bands
pub fn validate_forecast(forecast: &ForecastResult, index: &[NaiveDate]) -> Result<()> {
    if forecast.len() != index.len() {
        return Err(ForecastError::ForecastFitError(format!(
            "Backend returned {} points for an index of {}",
            forecast.len(),
            index.len()
        )));
    }

    for (point, &expected) in forecast.points().iter().zip(index) {
        if point.timestamp != expected {
            return Err(ForecastError::fit_at(
                expected,
                format!("Unexpected timestamp {}", point.timestamp),
            ));
        }
        if !point.is_consistent() {
            return Err(ForecastError::fit_at(
                point.timestamp,
                format!(
                    "Inconsistent band {} <= {} <= {}",
                    point.lower_bound, point.point_estimate, point.upper_bound
                ),
            ));
        }
    }

    Ok(())
}

/// Keep stage-specific variants, report everything else as a fit failure
fn as_fit_error(err: ForecastError) -> ForecastError {
    match err {
        ForecastError::ForecastFitError(_)
        | ForecastError::InvalidParameter(_)
        | ForecastError::Cancelled => err,
        other => ForecastError::ForecastFitError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastPoint, MAX_HORIZON_DAYS};
    use crate::series::ObservedPoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_index_skips_gaps_in_history_only() {
        let series = TimeSeries::new(vec![
            ObservedPoint::new(d(2024, 1, 5), 1.0),
            ObservedPoint::new(d(2024, 1, 8), 2.0),
        ])
        .unwrap();
        let index = ForecastBackendAdapter::<crate::models::additive::AdditiveBackend>::forecast_index(
            &series,
            Horizon::new(3).unwrap(),
        )
        .unwrap();

        assert_eq!(
            index,
            vec![d(2024, 1, 5), d(2024, 1, 8), d(2024, 1, 9), d(2024, 1, 10), d(2024, 1, 11)]
        );
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let index = vec![d(2024, 1, 1)];
        let bad = ForecastResult::from_points(vec![ForecastPoint::new(d(2024, 1, 1), 1.0, 2.0, 3.0)]);
        assert!(matches!(
            validate_forecast(&bad, &index),
            Err(ForecastError::ForecastFitError(_))
        ));

        let short = ForecastResult::from_points(Vec::new());
        assert!(validate_forecast(&short, &index).is_err());
    }

    #[test]
    fn test_horizon_bounds() {
        assert!(Horizon::new(0).is_err());
        assert!(Horizon::new(1).is_ok());
        assert!(Horizon::new(i64::from(MAX_HORIZON_DAYS)).is_ok());
        assert!(matches!(
            Horizon::new(400),
            Err(ForecastError::InvalidHorizon { days: 400, .. })
        ));
    }
}
