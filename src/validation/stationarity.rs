//! Stationarity testing for daily demand series.
//!
//! The augmented Dickey-Fuller test decides whether the order search has to
//! consider differencing at all.

use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::stats::cdf_normal;

/// Default significance level for rejecting the unit-root null.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Result of a stationarity test.
#[derive(Debug, Clone)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// Approximate p-value
    pub p_value: f64,
    /// Number of lagged differences used
    pub lags: usize,
    /// Observations in the final regression
    pub nobs: usize,
    /// Whether the series appears stationary at the 5% level
    pub is_stationary: bool,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

impl StationarityResult {
    fn undefined(is_stationary: bool) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            nobs: 0,
            is_stationary,
            critical_values: CriticalValues::default(),
        }
    }

    /// Whether the unit-root null is rejected at `significance`.
    ///
    /// Constant series have no p-value but are trivially stationary.
    pub fn is_stationary_at(&self, significance: f64) -> bool {
        if self.p_value.is_nan() {
            self.is_stationary
        } else {
            self.p_value < significance
        }
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Default)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

impl CriticalValues {
    /// MacKinnon (2010) response-surface critical values, constant only.
    fn mackinnon(nobs: usize) -> Self {
        let n = nobs as f64;
        let surface = |b: [f64; 4]| b[0] + b[1] / n + b[2] / (n * n) + b[3] / (n * n * n);
        Self {
            cv_1pct: surface([-3.43035, -6.5393, -16.786, -79.433]),
            cv_5pct: surface([-2.86154, -2.8903, -4.234, -40.040]),
            cv_10pct: surface([-2.56677, -1.5384, -2.809, 0.0]),
        }
    }
}

/// Augmented Dickey-Fuller test for a unit root.
///
/// Regresses `Δy_t = α + β·y_{t-1} + Σγ_i·Δy_{t-i} + ε_t`. The null hypothesis
/// is a unit root (non-stationary); rejection implies stationarity.
///
/// # Arguments
/// * `series` - Time series data
/// * `max_lags` - Maximum lagged differences (default: 12·(n/100)^(1/4));
///   the lag actually used is chosen by AIC
///
/// # Returns
/// `StationarityResult` with the t-statistic of β and MacKinnon's p-value
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> StationarityResult {
    let n = series.len();

    if n < 4 {
        return StationarityResult::undefined(false);
    }

    let first = series[0];
    if series.iter().all(|&v| v == first) {
        return StationarityResult::undefined(true);
    }

    let default_lags = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    let max_lags = max_lags
        .unwrap_or(default_lags)
        .min((n / 2).saturating_sub(2));

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    // Lag selection on a common sample so the AIC values are comparable
    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=max_lags {
        if let Some(fit) = adf_regression(series, &diff, lag, max_lags) {
            let aic = fit.aic();
            if best.map_or(true, |(_, best_aic)| aic < best_aic) {
                best = Some((lag, aic));
            }
        }
    }

    let Some((lag, _)) = best else {
        return StationarityResult::undefined(false);
    };

    let Some(fit) = adf_regression(series, &diff, lag, lag) else {
        return StationarityResult::undefined(false);
    };

    let Some(statistic) = fit.t_stat(0) else {
        return StationarityResult::undefined(false);
    };

    let p_value = mackinnon_p_value(statistic);

    StationarityResult {
        statistic,
        p_value,
        lags: lag,
        nobs: fit.nobs,
        is_stationary: p_value < DEFAULT_SIGNIFICANCE,
        critical_values: CriticalValues::mackinnon(fit.nobs),
    }
}

/// Whether `series` is stationary at the given significance level.
pub fn is_stationary(series: &[f64], significance: f64) -> bool {
    adf_test(series, None).is_stationary_at(significance)
}

/// Fit the ADF regression with `lag` lagged differences, starting at `start`.
fn adf_regression(series: &[f64], diff: &[f64], lag: usize, start: usize) -> Option<OLSResult> {
    if start >= diff.len() {
        return None;
    }

    let target: Vec<f64> = diff[start..].to_vec();
    let mut columns = Vec::with_capacity(lag + 1);
    columns.push(series[start..diff.len()].to_vec());
    for i in 1..=lag {
        columns.push(diff[start - i..diff.len() - i].to_vec());
    }

    ols_fit(&target, &columns).ok()
}

/// MacKinnon (1994) approximate p-value, constant-only regression.
fn mackinnon_p_value(statistic: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;
    const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
    const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let coefficients: &[f64] = if statistic <= TAU_STAR {
        &SMALL_P
    } else {
        &LARGE_P
    };
    let poly = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * statistic + c);

    cdf_normal(poly)
}
