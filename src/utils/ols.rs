//! Ordinary Least Squares (OLS) regression.
//!
//! Used by the augmented Dickey-Fuller regression, which needs both the
//! coefficients and their standard errors.

use crate::error::{ForecastError, Result};

/// OLS regression coefficients with their standard errors.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Intercept term.
    pub intercept: f64,
    /// Regression coefficients (one per regressor column).
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients, same order as `coefficients`.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OLSResult {
    /// Number of estimated parameters including the intercept.
    pub fn num_params(&self) -> usize {
        self.coefficients.len() + 1
    }

    /// Akaike information criterion of the Gaussian regression.
    pub fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        if self.rss <= 0.0 || n == 0.0 {
            return f64::NEG_INFINITY;
        }
        let ll = -0.5 * n * (1.0 + (2.0 * std::f64::consts::PI * self.rss / n).ln());
        -2.0 * ll + 2.0 * self.num_params() as f64
    }

    /// t-statistic of the coefficient at `index`.
    pub fn t_stat(&self, index: usize) -> Option<f64> {
        let coef = *self.coefficients.get(index)?;
        let se = *self.std_errors.get(index)?;
        if se > 0.0 && se.is_finite() {
            Some(coef / se)
        } else {
            None
        }
    }
}

/// Fit OLS regression: y = intercept + Σ columns[i] * coefficients[i].
///
/// Uses Cholesky decomposition to solve the normal equations.
///
/// # Arguments
/// * `y` - Target values (length n)
/// * `columns` - Regressor columns (each length n)
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len();
    let num_params = k + 1;

    if n <= num_params {
        return Err(ForecastError::InsufficientData {
            needed: num_params + 1,
            got: n,
        });
    }

    for col in columns {
        if col.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: col.len(),
            });
        }
    }

    // X'X and X'y with design rows [1, x1, x2, ...]
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];
    let mut row = vec![1.0; num_params];

    for obs in 0..n {
        for j in 0..k {
            row[j + 1] = columns[j][obs];
        }
        for i in 0..num_params {
            xty[i] += row[i] * y[obs];
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..num_params {
        for j in (i + 1)..num_params {
            xtx[i][j] = xtx[j][i];
        }
    }

    let l = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError(
            "OLS regression failed: matrix not positive definite".into(),
        )
    })?;
    let beta = cholesky_solve(&l, &xty);

    let rss: f64 = (0..n)
        .map(|obs| {
            let fitted = beta[0]
                + (0..k)
                    .map(|j| beta[j + 1] * columns[j][obs])
                    .sum::<f64>();
            (y[obs] - fitted).powi(2)
        })
        .sum();

    // Diagonal of (X'X)^-1 scaled by the residual variance
    let sigma_sq = rss / (n - num_params) as f64;
    let std_errors = (1..num_params)
        .map(|j| {
            let mut unit = vec![0.0; num_params];
            unit[j] = 1.0;
            let inv_col = cholesky_solve(&l, &unit);
            (sigma_sq * inv_col[j]).sqrt()
        })
        .collect();

    if !beta.iter().all(|b| b.is_finite()) || !rss.is_finite() {
        return Err(ForecastError::ComputationError(
            "OLS regression produced non-finite coefficients".into(),
        ));
    }

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        std_errors,
        rss,
        nobs: n,
    })
}

/// Cholesky decomposition A = L @ L' of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                // Relative pivot check rejects numerically singular systems
                if sum <= 1e-12 * a[i][i].abs().max(1.0) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve L @ L' @ x = b given the Cholesky factor L.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}
