//! Automatic ARIMA order selection.
//!
//! Every `(p, d, q)` within the configured bounds is fitted independently and
//! scored by AIC. The differencing range is narrowed up front by a
//! stationarity test, so stationary demand is never over-differenced.

use std::fmt;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::models::arima::model::ARIMA;
use crate::utils::optimization::NelderMeadConfig;
use crate::validation::{is_stationary, DEFAULT_SIGNIFICANCE};

/// Simplex tolerance for candidate fits. Looser than the final fit.
const SELECTION_TOLERANCE: f64 = 1e-6;

/// Model order (p, d, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOrder {
    /// AR order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// MA order.
    pub q: usize,
}

impl ModelOrder {
    /// Order used when no candidate could be fitted.
    pub const FALLBACK: ModelOrder = ModelOrder::new(1, 1, 1);

    /// Create a new order.
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Whether the order has at least one AR or MA term.
    pub fn is_valid(&self) -> bool {
        self.p > 0 || self.q > 0
    }

    /// Shortest series a candidate of this order is fitted on.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + 5
    }
}

impl Default for ModelOrder {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

/// Configuration for AutoARIMA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoARIMAConfig {
    /// Maximum AR order to consider.
    pub max_p: usize,
    /// Maximum differencing order for non-stationary series.
    pub max_d: usize,
    /// Maximum MA order to consider.
    pub max_q: usize,
    /// Significance level of the stationarity test.
    pub significance: f64,
    /// Fit candidates on the rayon pool.
    pub parallel: bool,
    /// Optimizer iteration budget per candidate.
    pub max_iter: usize,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
            significance: DEFAULT_SIGNIFICANCE,
            parallel: true,
            max_iter: 1000,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set the stationarity significance level.
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    /// Set the per-candidate iteration budget.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Fit candidates one after another on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check the configuration for values the search cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_p == 0 && self.max_q == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_p and max_q cannot both be zero".to_string(),
            ));
        }
        if self.max_d == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_d must be at least 1".to_string(),
            ));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        if self.max_iter == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iter must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of fitting one candidate order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateFit {
    /// Candidate order.
    pub order: ModelOrder,
    /// AIC of the fit, NaN when the fit failed.
    pub aic: f64,
    /// Whether the fit produced a usable score.
    pub success: bool,
}

impl CandidateFit {
    fn succeeded(order: ModelOrder, aic: f64) -> Self {
        Self {
            order,
            aic,
            success: true,
        }
    }

    fn failed(order: ModelOrder) -> Self {
        Self {
            order,
            aic: f64::NAN,
            success: false,
        }
    }
}

/// Result of an order search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSelection {
    /// The selected order.
    pub order: ModelOrder,
    /// Stationarity decision that fixed the differencing range.
    pub is_stationary: bool,
    /// True when no candidate succeeded and the fallback order was used.
    pub fell_back: bool,
    /// Every candidate in enumeration order.
    pub candidates: Vec<CandidateFit>,
}

impl OrderSelection {
    /// Number of candidates that fitted successfully.
    pub fn successful(&self) -> usize {
        self.candidates.iter().filter(|c| c.success).count()
    }
}

/// Automatic ARIMA order selection.
///
/// Selects the ARIMA(p, d, q) specification with the lowest AIC. Ties go to
/// the candidate enumerated first (`p` outer, `d` middle, `q` inner).
#[derive(Debug, Clone, Default)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
}

impl AutoARIMA {
    /// Create a new AutoARIMA with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration.
    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Differencing orders searched for a series.
    pub fn d_range(&self, stationary: bool) -> Vec<usize> {
        if stationary {
            vec![0]
        } else {
            (1..=self.config.max_d).collect()
        }
    }

    /// Candidate orders in enumeration order.
    pub fn candidates(&self, stationary: bool) -> Vec<ModelOrder> {
        let d_range = self.d_range(stationary);
        let mut orders = Vec::new();
        for p in 0..=self.config.max_p {
            for &d in &d_range {
                for q in 0..=self.config.max_q {
                    let order = ModelOrder::new(p, d, q);
                    if order.is_valid() {
                        orders.push(order);
                    }
                }
            }
        }
        orders
    }

    fn selection_optimizer(&self) -> NelderMeadConfig {
        NelderMeadConfig {
            max_iter: self.config.max_iter,
            tolerance: SELECTION_TOLERANCE,
            ..NelderMeadConfig::default()
        }
    }

    /// Fit a single candidate. Never fails; problems mark the candidate failed.
    pub fn evaluate(&self, values: &[f64], order: ModelOrder) -> CandidateFit {
        if values.len() < order.min_observations() {
            debug!(
                "candidate {} skipped: {} observations, {} needed",
                order,
                values.len(),
                order.min_observations()
            );
            return CandidateFit::failed(order);
        }

        let mut model = ARIMA::from_order(order).with_optimizer(self.selection_optimizer());
        if let Err(e) = model.fit_values(values) {
            debug!("candidate {} failed: {}", order, e);
            return CandidateFit::failed(order);
        }
        if !model.converged() {
            debug!("candidate {} did not converge", order);
            return CandidateFit::failed(order);
        }

        match model.aic() {
            Some(aic) if aic.is_finite() => CandidateFit::succeeded(order, aic),
            _ => {
                debug!("candidate {} has no finite AIC", order);
                CandidateFit::failed(order)
            }
        }
    }

    /// Lowest-AIC successful candidate, earliest on ties.
    pub fn pick(fits: &[CandidateFit]) -> Option<&CandidateFit> {
        fits.iter()
            .enumerate()
            .filter(|(_, fit)| fit.success)
            .min_by(|(i, a), (j, b)| a.aic.total_cmp(&b.aic).then(i.cmp(j)))
            .map(|(_, fit)| fit)
    }

    /// Search the order grid for a daily demand series.
    pub fn select(&self, values: &[f64]) -> OrderSelection {
        let stationary = is_stationary(values, self.config.significance);
        debug!(
            "series of {} days is {}",
            values.len(),
            if stationary { "stationary" } else { "non-stationary" }
        );

        let orders = self.candidates(stationary);
        let candidates: Vec<CandidateFit> = if self.config.parallel {
            orders
                .par_iter()
                .map(|&order| self.evaluate(values, order))
                .collect()
        } else {
            orders
                .iter()
                .map(|&order| self.evaluate(values, order))
                .collect()
        };

        match Self::pick(&candidates) {
            Some(best) => {
                info!(
                    "selected ARIMA{} with AIC {:.3} ({} candidates)",
                    best.order,
                    best.aic,
                    candidates.len()
                );
                OrderSelection {
                    order: best.order,
                    is_stationary: stationary,
                    fell_back: false,
                    candidates,
                }
            }
            None => {
                warn!(
                    "no ARIMA candidate fitted out of {}; using ARIMA{}",
                    candidates.len(),
                    ModelOrder::FALLBACK
                );
                OrderSelection {
                    order: ModelOrder::FALLBACK,
                    is_stationary: stationary,
                    fell_back: true,
                    candidates,
                }
            }
        }
    }
}
