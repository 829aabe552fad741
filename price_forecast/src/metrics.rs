//! In-sample accuracy of the fitted values

use crate::error::{ForecastError, Result};
use crate::models::ForecastPoint;
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};

/// Accuracy of the historical forecast against the observed series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean Squared Error over every aligned pair
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error; `None` when every observation is zero
    pub mape: Option<f64>,
    /// Pairs matched by timestamp
    pub aligned_pairs: usize,
    /// Pairs contributing to MAPE (non-zero observations)
    pub mape_pairs: usize,
}

/// Compare `historical` with `series`, pairing points by timestamp.
///
/// Zero observations are left out of MAPE only; MSE and RMSE use every pair.
pub fn evaluate(series: &TimeSeries, historical: &[ForecastPoint]) -> Result<AccuracyMetrics> {
    let mut squared_sum = 0.0;
    let mut pct_sum = 0.0;
    let mut aligned_pairs = 0usize;
    let mut mape_pairs = 0usize;

    for point in historical {
        let observed = match series.get(point.timestamp) {
            Some(obs) => obs.value,
            None => continue,
        };
        let residual = observed - point.point_estimate;

        squared_sum += residual * residual;
        aligned_pairs += 1;

        if observed != 0.0 {
            pct_sum += (residual / observed).abs();
            mape_pairs += 1;
        }
    }

    if aligned_pairs == 0 {
        return Err(ForecastError::NoAlignedPoints);
    }

    let mse = squared_sum / aligned_pairs as f64;
    let mape = if mape_pairs > 0 {
        Some(pct_sum / mape_pairs as f64 * 100.0)
    } else {
        None
    };

    Ok(AccuracyMetrics {
        mse,
        rmse: mse.sqrt(),
        mape,
        aligned_pairs,
        mape_pairs,
    })
}

impl std::fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MSE:     {:.4}", self.mse)?;
        writeln!(f, "  RMSE:    {:.4}", self.rmse)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:    {:.4}% ({} points)", mape, self.mape_pairs)?,
            None => writeln!(f, "  MAPE:    n/a (all observations are zero)")?,
        }
        writeln!(f, "  Aligned: {}", self.aligned_pairs)?;
        Ok(())
    }
}
