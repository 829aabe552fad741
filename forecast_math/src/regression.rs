//! Regularised least squares
//!
//! Solves `(X'X + diag(lambda)) beta = X'y` by Gaussian elimination with
//! partial pivoting. A per-column penalty is the Gaussian-prior (MAP) form of
//! ridge regression: a column with penalty `sigma^2 / s^2` has a zero-mean
//! prior with scale `s`.

use crate::{MathError, Result};
use std::ops::Range;

/// Relative pivot magnitude below which the system is treated as singular
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Column-major design matrix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignMatrix {
    rows: usize,
    columns: Vec<Vec<f64>>,
}

/// Fitted coefficients together with in-sample diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeSolution {
    /// Estimated coefficients, one per design column
    pub coefficients: Vec<f64>,
    /// In-sample fitted values `X beta`
    pub fitted: Vec<f64>,
    /// Mean squared residual of the fit
    pub residual_variance: f64,
}

impl DesignMatrix {
    /// Create an empty design with `rows` observations and no columns
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    /// Number of observations
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    /// Borrow a single column
    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Append one column and return its index
    pub fn push_column(&mut self, column: Vec<f64>) -> Result<usize> {
        if column.len() != self.rows {
            return Err(MathError::InvalidInput(format!(
                "Column length ({}) doesn't match row count ({})",
                column.len(),
                self.rows
            )));
        }
        self.columns.push(column);
        Ok(self.columns.len() - 1)
    }

    /// Append a block given as feature rows (one inner vector per observation)
    /// and return the column range it occupies.
    pub fn push_block(&mut self, block: &[Vec<f64>]) -> Result<Range<usize>> {
        if block.len() != self.rows {
            return Err(MathError::InvalidInput(format!(
                "Block has {} rows, design has {}",
                block.len(),
                self.rows
            )));
        }
        let width = block.first().map_or(0, Vec::len);
        if block.iter().any(|row| row.len() != width) {
            return Err(MathError::InvalidInput(
                "Block rows have inconsistent widths".to_string(),
            ));
        }

        let start = self.cols();
        for j in 0..width {
            self.columns.push(block.iter().map(|row| row[j]).collect());
        }
        Ok(start..self.cols())
    }

    /// Compute `X beta`
    pub fn multiply(&self, beta: &[f64]) -> Result<Vec<f64>> {
        if beta.len() != self.cols() {
            return Err(MathError::InvalidInput(format!(
                "Coefficient count ({}) doesn't match column count ({})",
                beta.len(),
                self.cols()
            )));
        }

        let mut out = vec![0.0; self.rows];
        for (column, &b) in self.columns.iter().zip(beta) {
            if b == 0.0 {
                continue;
            }
            for (o, &x) in out.iter_mut().zip(column) {
                *o += x * b;
            }
        }
        Ok(out)
    }
}

/// Fit `y ~ X` with per-column ridge penalties.
pub fn ridge_solve(x: &DesignMatrix, y: &[f64], penalties: &[f64]) -> Result<RidgeSolution> {
    let n = x.rows();
    let p = x.cols();

    if y.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Target length ({}) doesn't match row count ({})",
            y.len(),
            n
        )));
    }
    if penalties.len() != p {
        return Err(MathError::InvalidInput(format!(
            "Penalty count ({}) doesn't match column count ({})",
            penalties.len(),
            p
        )));
    }
    if n == 0 || p == 0 {
        return Err(MathError::InsufficientData(
            "Regression needs at least one row and one column".to_string(),
        ));
    }
    if penalties.iter().any(|l| !(l.is_finite() && *l >= 0.0)) {
        return Err(MathError::InvalidInput(
            "Penalties must be finite and non-negative".to_string(),
        ));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Target contains non-finite values".to_string(),
        ));
    }

    // Normal equations
    let mut a = vec![vec![0.0; p]; p];
    let mut b = vec![0.0; p];
    for i in 0..p {
        let ci = &x.columns[i];
        b[i] = dot(ci, y);
        for j in i..p {
            let v = dot(ci, &x.columns[j]);
            a[i][j] = v;
            a[j][i] = v;
        }
        a[i][i] += penalties[i];
    }

    let coefficients = solve_linear_system(a, b)?;
    let fitted = x.multiply(&coefficients)?;
    let residual_variance = y
        .iter()
        .zip(&fitted)
        .map(|(obs, fit)| (obs - fit).powi(2))
        .sum::<f64>()
        / n as f64;

    Ok(RidgeSolution {
        coefficients,
        fitted,
        residual_variance,
    })
}

/// Solve a dense square system in place
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let p = b.len();
    if a.len() != p || a.iter().any(|row| row.len() != p) {
        return Err(MathError::InvalidInput(
            "System matrix must be square and match the right-hand side".to_string(),
        ));
    }

    let scale = a
        .iter()
        .enumerate()
        .map(|(i, row)| row[i].abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if pivot_row != col {
            a.swap(col, pivot_row);
            b.swap(col, pivot_row);
        }

        let pivot = a[col][col];
        if !pivot.is_finite() || pivot.abs() < PIVOT_TOLERANCE * scale {
            return Err(MathError::Singular { column: col, pivot });
        }

        for row in (col + 1)..p {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..p {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0; p];
    for row in (0..p).rev() {
        let tail: f64 = ((row + 1)..p).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Solution contains non-finite coefficients".to_string(),
        ));
    }
    Ok(x)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
