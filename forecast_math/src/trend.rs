//! Piecewise-linear trend with changepoints
//!
//! The trend is written in hinge form
//! `g(t) = m + k t + sum_j delta_j max(0, t - s_j)`, which is continuous at
//! every changepoint `s_j`. Time is expected on the model scale (history
//! mapped to `[0, 1]`), so slopes are per history span.

use crate::{MathError, Result};

/// Place up to `n_changepoints` changepoints uniformly (by index) over the
/// first `range` fraction of the sorted time values.
///
/// The first observation is never a changepoint. Fewer changepoints are
/// returned when the history is too short to hold the requested number.
pub fn changepoint_locations(t: &[f64], n_changepoints: usize, range: f64) -> Result<Vec<f64>> {
    if !(range > 0.0 && range <= 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Changepoint range must be in (0, 1], got {}",
            range
        )));
    }

    let hist_size = (t.len() as f64 * range).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Ok(Vec::new());
    }

    let last = (hist_size - 1) as f64;
    let locations = (1..=n)
        .map(|i| {
            let idx = (i as f64 * last / n as f64).round() as usize;
            t[idx.min(t.len() - 1)]
        })
        .collect();

    Ok(locations)
}

/// Hinge features `max(0, t - s_j)`, one row per time value.
pub fn hinge_features(t: &[f64], locations: &[f64]) -> Vec<Vec<f64>> {
    t.iter()
        .map(|&ti| locations.iter().map(|&s| (ti - s).max(0.0)).collect())
        .collect()
}

/// Evaluate the piecewise-linear trend.
pub fn piecewise_linear(
    t: &[f64],
    slope: f64,
    offset: f64,
    deltas: &[f64],
    locations: &[f64],
) -> Result<Vec<f64>> {
    if deltas.len() != locations.len() {
        return Err(MathError::InvalidInput(format!(
            "Got {} slope changes for {} changepoints",
            deltas.len(),
            locations.len()
        )));
    }

    Ok(t.iter()
        .map(|&ti| {
            let hinge: f64 = deltas
                .iter()
                .zip(locations)
                .map(|(d, &s)| d * (ti - s).max(0.0))
                .sum();
            offset + slope * ti + hinge
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_changepoints_within_range() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let cps = changepoint_locations(&t, 25, 0.8).unwrap();

        assert_eq!(cps.len(), 25);
        assert!(cps.iter().all(|&c| c > 0.0 && c <= 0.8));
        assert!(cps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_short_history_limits_changepoints() {
        let t = [0.0, 0.25, 0.5, 0.75, 1.0];
        let cps = changepoint_locations(&t, 25, 0.8).unwrap();
        assert_eq!(cps.len(), 3);

        assert!(changepoint_locations(&[0.0, 1.0], 25, 0.8).unwrap().is_empty());
        assert!(changepoint_locations(&t, 5, 0.0).is_err());
    }

    #[test]
    fn test_piecewise_linear_is_continuous() {
        let t = [0.0, 0.5, 1.0];
        let values = piecewise_linear(&t, 2.0, 1.0, &[-4.0], &[0.5]).unwrap();

        assert_abs_diff_eq!(values[0], 1.0);
        assert_abs_diff_eq!(values[1], 2.0);
        // slope drops from 2 to -2 after the changepoint
        assert_abs_diff_eq!(values[2], 1.0);
    }

    #[test]
    fn test_hinge_features() {
        let rows = hinge_features(&[0.2, 0.7], &[0.5]);
        assert_eq!(rows[0], vec![0.0]);
        assert_abs_diff_eq!(rows[1][0], 0.2, epsilon = 1e-12);
    }
}
