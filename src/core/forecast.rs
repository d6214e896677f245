//! Forecast result structures.

use crate::error::{ForecastError, Result};
use crate::models::arima::ModelOrder;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point predictions with optional prediction interval bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    /// Point predictions, one per step.
    point: Vec<f64>,
    /// Lower prediction interval bounds (optional)
    lower: Option<Vec<f64>>,
    /// Upper prediction interval bounds (optional)
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        if lower.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: lower.len(),
            });
        }
        if upper.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: upper.len(),
            });
        }
        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn values(&self) -> &[f64] {
        &self.point
    }

    /// Check if lower interval is available.
    pub fn has_lower(&self) -> bool {
        self.lower.is_some()
    }

    /// Check if upper interval is available.
    pub fn has_upper(&self) -> bool {
        self.upper.is_some()
    }

    /// Lower interval bounds.
    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    /// Upper interval bounds.
    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Interval bounds as `(lower, upper)` pairs, empty if no intervals.
    pub fn intervals(&self) -> Vec<(f64, f64)> {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => lower.iter().copied().zip(upper.iter().copied()).collect(),
            _ => Vec::new(),
        }
    }

    /// Clamp point predictions and interval bounds at a floor.
    ///
    /// Clamping is monotone, so `lower <= point <= upper` survives it.
    pub fn clamp_min(mut self, floor: f64) -> Self {
        let clamp = |v: &mut Vec<f64>| v.iter_mut().for_each(|x| *x = x.max(floor));
        clamp(&mut self.point);
        if let Some(lower) = self.lower.as_mut() {
            clamp(lower);
        }
        if let Some(upper) = self.upper.as_mut() {
            clamp(upper);
        }
        self
    }
}

/// Demand forecast for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    /// Model order used for the final fit.
    pub order: ModelOrder,
    /// Calendar date of each forecast step.
    pub dates: Vec<NaiveDate>,
    /// Non-negative point forecasts.
    pub values: Vec<f64>,
    /// `(lower, upper)` prediction interval per step.
    pub intervals: Vec<(f64, f64)>,
}

impl DemandForecast {
    /// Number of forecast steps.
    pub fn periods(&self) -> usize {
        self.values.len()
    }

    /// Sum of point forecasts over the horizon.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}
