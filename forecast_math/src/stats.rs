//! Descriptive statistics

use crate::{MathError, Result};

/// Mean of absolute values, 0 for an empty slice
pub fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

/// Largest absolute value, 0 for an empty slice
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// `samples` is sorted in place.
pub fn quantile(samples: &mut [f64], q: f64) -> Result<f64> {
    if samples.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a quantile of an empty sample".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be in [0, 1], got {}",
            q
        )));
    }
    if samples.iter().any(|v| v.is_nan()) {
        return Err(MathError::InvalidInput(
            "Sample contains NaN values".to_string(),
        ));
    }

    samples.sort_by(f64::total_cmp);

    let pos = q * (samples.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Ok(samples[lo] + (samples[hi] - samples[lo]) * frac)
}
