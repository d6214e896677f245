//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::{DemandSeries, Forecast};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate, poly_mul};
use crate::models::arima::ModelOrder;
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{quantile_normal, rms};

/// Bound on each AR and MA coefficient during estimation.
const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// Parameters are estimated by conditional sum of squares. A constant is
/// estimated only for undifferenced models (`d == 0`), so differenced models
/// carry no drift.
#[derive(Debug, Clone)]
pub struct ARIMA {
    /// Model order.
    order: ModelOrder,
    /// Optimizer settings used by `fit`.
    optimizer: NelderMeadConfig,
    /// AR coefficients.
    ar_coefficients: Vec<f64>,
    /// MA coefficients.
    ma_coefficients: Vec<f64>,
    /// Constant of the differenced series (zero when d > 0).
    intercept: f64,
    /// Original series (for integration).
    original: Option<Vec<f64>>,
    /// Differenced series.
    differenced: Option<Vec<f64>>,
    /// Fitted values on differenced scale.
    fitted_diff: Option<Vec<f64>>,
    /// Residuals.
    residuals: Option<Vec<f64>>,
    /// Residual variance.
    residual_variance: Option<f64>,
    /// AIC.
    aic: Option<f64>,
    /// BIC.
    bic: Option<f64>,
    /// Whether the optimizer converged within its iteration limit.
    converged: bool,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_order(ModelOrder::new(p, d, q))
    }

    /// Create a model for a given order.
    pub fn from_order(order: ModelOrder) -> Self {
        Self {
            order,
            optimizer: NelderMeadConfig::default(),
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
            converged: false,
        }
    }

    /// Use custom optimizer settings.
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Get the model order.
    pub fn order(&self) -> ModelOrder {
        self.order
    }

    /// Whether a constant term is estimated.
    pub fn has_intercept(&self) -> bool {
        self.order.d == 0
    }

    /// Number of estimated parameters, innovation variance included.
    pub fn num_params(&self) -> usize {
        self.order.p + self.order.q + usize::from(self.has_intercept()) + 1
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Get the intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Get the residual variance.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Get AIC. `None` before fitting or when the residual variance is zero.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Whether the last fit converged.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Fit the model to raw daily values.
    pub fn fit_values(&mut self, values: &[f64]) -> Result<()> {
        let ModelOrder { p, d, q } = self.order;
        let min_len = d + p.max(q) + 2;

        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "series contains non-finite values".to_string(),
            ));
        }

        let diff_series = difference(values, d);
        self.estimate_parameters(&diff_series)?;
        self.calculate_fitted(&diff_series)?;

        self.original = Some(values.to_vec());
        self.differenced = Some(diff_series);

        Ok(())
    }

    /// Conditional sum of squares on a (scaled) differenced series.
    fn calculate_css(series: &[f64], ar: &[f64], ma: &[f64], intercept: f64) -> f64 {
        let n = series.len();
        let start = ar.len().max(ma.len());

        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut css = 0.0;

        for t in start..n {
            let mut pred = intercept;
            for (i, a) in ar.iter().enumerate() {
                pred += a * (series[t - 1 - i] - intercept);
            }
            for (i, m) in ma.iter().enumerate() {
                pred += m * residuals[t - 1 - i];
            }

            let error = series[t] - pred;
            residuals[t] = error;
            css += error * error;
        }

        css / (n - start) as f64
    }

    /// Estimate parameters on the differenced series.
    ///
    /// The series is divided by its RMS so every parameter is O(1) for the
    /// simplex; the constant is rescaled afterwards.
    fn estimate_parameters(&mut self, diff_series: &[f64]) -> Result<()> {
        let ModelOrder { p, q, .. } = self.order;
        let with_intercept = self.has_intercept();
        let offset = usize::from(with_intercept);

        let scale = rms(diff_series);
        if !scale.is_finite() {
            return Err(ForecastError::ComputationError(
                "differenced series has no finite scale".to_string(),
            ));
        }

        let level = diff_series[0];
        if diff_series.iter().all(|&v| v == level) && (with_intercept || level == 0.0) {
            // Exact fit: the constant alone explains every value
            self.intercept = if with_intercept { level } else { 0.0 };
            self.ar_coefficients = vec![0.0; p];
            self.ma_coefficients = vec![0.0; q];
            self.converged = true;
            return Ok(());
        }

        let scaled: Vec<f64> = diff_series.iter().map(|v| v / scale).collect();
        let mean = scaled.iter().sum::<f64>() / scaled.len() as f64;

        let mut initial = Vec::with_capacity(offset + p + q);
        let mut bounds = Vec::with_capacity(offset + p + q);
        if with_intercept {
            initial.push(mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for i in 0..p {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
        }
        for i in 0..q {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
        }

        let result = nelder_mead(
            |params| {
                let intercept = if with_intercept { params[0] } else { 0.0 };
                let ar = &params[offset..offset + p];
                let ma = &params[offset + p..];
                Self::calculate_css(&scaled, ar, ma, intercept)
            },
            &initial,
            Some(bounds.as_slice()),
            self.optimizer.clone(),
        );

        if !result.optimal_value.is_finite() || result.optimal_point.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(format!(
                "ARIMA{} estimation produced non-finite parameters",
                self.order
            )));
        }

        let params = result.optimal_point;
        self.intercept = if with_intercept { params[0] * scale } else { 0.0 };
        self.ar_coefficients = params[offset..offset + p].to_vec();
        self.ma_coefficients = params[offset + p..].to_vec();
        self.converged = result.converged;

        Ok(())
    }

    /// Calculate fitted values, residuals and information criteria.
    fn calculate_fitted(&mut self, diff_series: &[f64]) -> Result<()> {
        let n = diff_series.len();
        let start = self.order.p.max(self.order.q);

        let mut fitted = vec![f64::NAN; n];
        let mut residuals = vec![0.0; n];

        for t in start..n {
            let mut pred = self.intercept;
            for (i, a) in self.ar_coefficients.iter().enumerate() {
                pred += a * (diff_series[t - 1 - i] - self.intercept);
            }
            for (i, m) in self.ma_coefficients.iter().enumerate() {
                pred += m * residuals[t - 1 - i];
            }

            fitted[t] = pred;
            residuals[t] = diff_series[t] - pred;
        }

        let valid = &residuals[start..];
        let n_eff = valid.len() as f64;
        let variance = valid.iter().map(|r| r * r).sum::<f64>() / n_eff;

        if !variance.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "ARIMA{} residual variance is not finite",
                self.order
            )));
        }

        self.residual_variance = Some(variance);
        if variance > 0.0 {
            let k = self.num_params() as f64;
            let ll = -0.5 * n_eff * (1.0 + (2.0 * std::f64::consts::PI * variance).ln());
            self.aic = Some(-2.0 * ll + 2.0 * k);
            self.bic = Some(-2.0 * ll + k * n_eff.ln());
        } else {
            self.aic = None;
            self.bic = None;
        }

        self.fitted_diff = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::from_order(ModelOrder::FALLBACK)
    }
}

/// MA(∞) weights ψ_0..ψ_{horizon-1} of an ARIMA model.
///
/// The AR operator is expanded with the `(1 - B)^d` unit roots, so the
/// h-step forecast variance is `σ² · Σ_{j<h} ψ_j²`.
pub fn psi_weights(ar: &[f64], ma: &[f64], d: usize, horizon: usize) -> Vec<f64> {
    if horizon == 0 {
        return Vec::new();
    }

    let mut ar_poly = vec![1.0];
    ar_poly.extend(ar.iter().map(|a| -a));
    for _ in 0..d {
        ar_poly = poly_mul(&ar_poly, &[1.0, -1.0]);
    }
    let phi: Vec<f64> = ar_poly[1..].iter().map(|c| -c).collect();

    let mut psi = vec![0.0; horizon];
    psi[0] = 1.0;
    for j in 1..horizon {
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for i in 1..=phi.len().min(j) {
            value += phi[i - 1] * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        self.fit_values(series.values())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let diff_series = self
            .differenced
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mut extended_diff = diff_series.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended_diff.len();
            let mut pred = self.intercept;

            for (i, a) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += a * (extended_diff[t - 1 - i] - self.intercept);
                }
            }

            // Future shocks are zero in expectation
            for (i, m) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += m * extended_residuals[t - 1 - i];
                }
            }

            extended_diff.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff = extended_diff[diff_series.len()..].to_vec();
        let predictions = integrate(&forecast_diff, original, self.order.d);

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(format!(
                "ARIMA{} produced non-finite forecasts",
                self.order
            )));
        }

        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }

        let forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }

        let variance = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);
        let psi = psi_weights(
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.order.d,
            horizon,
        );

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (pred, weight) in forecast.values().iter().zip(&psi) {
            cumulative += weight * weight;
            let half_width = z * (variance * cumulative).sqrt();
            lower.push(pred - half_width);
            upper.push(pred + half_width);
        }

        Forecast::from_values_with_intervals(forecast.values().to_vec(), lower, upper)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ar1_process(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut values = vec![0.0];
        for i in 1..n {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            values.push(phi * values[i - 1] + noise);
        }
        values.iter().map(|v| v + 20.0).collect()
    }

    #[test]
    fn arima_basic_fit() {
        let values: Vec<f64> = (0..50)
            .map(|i| 10.0 + 0.5 * i as f64 + (i as f64 * 0.3).sin())
            .collect();

        let mut model = ARIMA::new(1, 1, 1);
        model.fit_values(&values).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);
        assert_eq!(model.intercept(), 0.0);

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
    }

    #[test]
    fn arima_ar1_recovers_coefficient() {
        let values = ar1_process(300, 0.7, 42);

        let mut model = ARIMA::new(1, 0, 0);
        model.fit_values(&values).unwrap();

        assert!(model.converged());
        assert!((model.ar_coefficients()[0] - 0.7).abs() < 0.2);
        assert_relative_eq!(model.intercept(), 20.0, epsilon = 1.0);
    }

    #[test]
    fn arima_with_differencing_continues_level() {
        let values: Vec<f64> = (0..50).map(|i| 10.0 + 2.0 * i as f64).collect();

        let mut model = ARIMA::new(1, 1, 0);
        model.fit_values(&values).unwrap();

        let forecast = model.predict(5).unwrap();
        let last = *values.last().unwrap();
        assert!(forecast.values()[0] > last - 5.0);
    }

    #[test]
    fn arima_intervals_widen_with_horizon() {
        let values = ar1_process(120, 0.5, 3);

        let mut model = ARIMA::new(1, 1, 1);
        model.fit_values(&values).unwrap();

        let forecast = model.predict_with_intervals(10, 0.95).unwrap();
        let intervals = forecast.intervals();
        assert_eq!(intervals.len(), 10);

        for ((lo, hi), v) in intervals.iter().zip(forecast.values()) {
            assert!(lo.is_finite() && hi.is_finite());
            assert!(lo <= v && v <= hi);
        }
        let first_width = intervals[0].1 - intervals[0].0;
        let last_width = intervals[9].1 - intervals[9].0;
        assert!(last_width > first_width);
    }

    #[test]
    fn arima_rejects_invalid_level() {
        let mut model = ARIMA::new(1, 0, 0);
        model.fit_values(&ar1_process(40, 0.3, 1)).unwrap();
        assert!(matches!(
            model.predict_with_intervals(3, 1.5),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn arima_information_criteria() {
        let values = ar1_process(80, 0.4, 8);

        let mut model = ARIMA::new(1, 0, 1);
        model.fit_values(&values).unwrap();

        let aic = model.aic().unwrap();
        let bic = model.bic().unwrap();
        assert!(aic.is_finite());
        // BIC penalizes harder once ln(n) > 2
        assert!(bic > aic);
        assert_eq!(model.num_params(), 4);
    }

    #[test]
    fn arima_constant_series_has_no_aic() {
        let values = vec![10.0; 15];

        let mut model = ARIMA::new(1, 0, 1);
        model.fit_values(&values).unwrap();

        assert!(model.aic().is_none());
        let forecast = model.predict(3).unwrap();
        for v in forecast.values() {
            assert_relative_eq!(*v, 10.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn arima_flat_differenced_series_forecasts_last_value() {
        let values = vec![10.0; 15];

        let mut model = ARIMA::new(1, 1, 1);
        model.fit_values(&values).unwrap();

        let forecast = model.predict_with_intervals(4, 0.95).unwrap();
        assert_eq!(forecast.values(), &[10.0, 10.0, 10.0, 10.0]);
        assert_eq!(forecast.intervals()[3], (10.0, 10.0));
    }

    #[test]
    fn arima_insufficient_data() {
        let mut model = ARIMA::new(2, 1, 1);
        assert!(matches!(
            model.fit_values(&[1.0, 2.0, 3.0]),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn arima_rejects_non_finite_input() {
        let mut values = vec![1.0; 20];
        values[5] = f64::NAN;
        let mut model = ARIMA::new(1, 0, 0);
        assert!(matches!(
            model.fit_values(&values),
            Err(ForecastError::ComputationError(_))
        ));
    }

    #[test]
    fn arima_requires_fit() {
        let model = ARIMA::new(1, 1, 1);
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn arima_zero_horizon() {
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let mut model = ARIMA::new(1, 1, 1);
        model.fit_values(&values).unwrap();

        assert_eq!(model.predict(0).unwrap().horizon(), 0);
    }

    #[test]
    fn arima_fit_through_forecaster_trait() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = DemandSeries::new(start, ar1_process(60, 0.5, 4)).unwrap();

        let mut model = ARIMA::default();
        model.fit(&series).unwrap();

        assert!(model.is_fitted());
        assert!(model.residuals().is_some());
        assert_eq!(model.name(), "ARIMA");
        assert_eq!(model.order(), ModelOrder::FALLBACK);
    }

    #[test]
    fn psi_weights_random_walk() {
        // ARIMA(0,1,0): every weight is 1, variance grows linearly
        assert_eq!(psi_weights(&[], &[], 1, 4), vec![1.0; 4]);
    }

    #[test]
    fn psi_weights_ar1_decay_geometrically() {
        let psi = psi_weights(&[0.5], &[], 0, 4);
        assert_relative_eq!(psi[0], 1.0);
        assert_relative_eq!(psi[1], 0.5);
        assert_relative_eq!(psi[2], 0.25);
        assert_relative_eq!(psi[3], 0.125);
    }

    #[test]
    fn psi_weights_ma1() {
        let psi = psi_weights(&[], &[0.4], 0, 3);
        assert_eq!(psi, vec![1.0, 0.4, 0.0]);
        assert!(psi_weights(&[0.3], &[0.2], 1, 0).is_empty());
    }
}
