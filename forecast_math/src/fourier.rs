//! Fourier features for periodic components
//!
//! A seasonal cycle of period `P` (in days) is approximated by the partial
//! Fourier sum `sum_k a_k sin(2 pi k t / P) + b_k cos(2 pi k t / P)` for
//! `k = 1..=order`. The coefficients are estimated by the regression; this
//! module only produces the columns.

use crate::{MathError, Result};
use std::f64::consts::PI;

/// Number of design columns produced for a given Fourier order
pub fn column_count(order: usize) -> usize {
    2 * order
}

/// Build the Fourier feature rows for the given time offsets (in days).
///
/// Each row holds `[sin_1, cos_1, sin_2, cos_2, ...]`.
pub fn fourier_series(t_days: &[f64], period: f64, order: usize) -> Result<Vec<Vec<f64>>> {
    if !(period.is_finite() && period > 0.0) {
        return Err(MathError::InvalidInput(format!(
            "Seasonal period must be positive, got {}",
            period
        )));
    }
    if order == 0 {
        return Err(MathError::InvalidInput(
            "Fourier order must be at least 1".to_string(),
        ));
    }

    let rows = t_days
        .iter()
        .map(|&t| {
            let mut row = Vec::with_capacity(column_count(order));
            for k in 1..=order {
                let angle = 2.0 * PI * k as f64 * t / period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
            row
        })
        .collect();

    Ok(rows)
}

/// Evaluate a fitted Fourier block: the dot product of each feature row with `coefficients`.
pub fn evaluate(t_days: &[f64], period: f64, coefficients: &[f64]) -> Result<Vec<f64>> {
    if coefficients.len() % 2 != 0 {
        return Err(MathError::InvalidInput(format!(
            "Fourier coefficients come in sin/cos pairs, got {}",
            coefficients.len()
        )));
    }
    let order = coefficients.len() / 2;
    if order == 0 {
        return Ok(vec![0.0; t_days.len()]);
    }

    let rows = fourier_series(t_days, period, order)?;
    Ok(rows
        .iter()
        .map(|row| row.iter().zip(coefficients).map(|(x, b)| x * b).sum())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fourier_shape() {
        let t = vec![0.0, 1.0, 2.0, 3.0];
        let rows = fourier_series(&t, 7.0, 3).unwrap();

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.len() == 6));

        // At t = 0 every sine is 0 and every cosine is 1
        assert_eq!(rows[0], vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_fourier_is_periodic() {
        let rows = fourier_series(&[1.5, 8.5], 7.0, 2).unwrap();
        for (a, b) in rows[0].iter().zip(&rows[1]) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_evaluate_matches_manual_sum() {
        let t = [0.25, 3.0];
        let coefficients = [2.0, -1.0];
        let values = evaluate(&t, 7.0, &coefficients).unwrap();

        for (i, &ti) in t.iter().enumerate() {
            let angle = 2.0 * PI * ti / 7.0;
            assert_abs_diff_eq!(values[i], 2.0 * angle.sin() - angle.cos(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(fourier_series(&[0.0], 0.0, 3).is_err());
        assert!(fourier_series(&[0.0], 7.0, 0).is_err());
        assert!(evaluate(&[0.0], 7.0, &[1.0]).is_err());
    }
}
