//! Demand statistics over a zero-filled daily series.

use serde::{Deserialize, Serialize};

use crate::core::{DemandSeries, SalesObservation};
use crate::utils::stats::{mean, std_dev};

/// Mean and sample standard deviation of daily demand.
///
/// Idle days count as zero demand, so both figures describe the whole span
/// between the first and last sale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DemandStatistics {
    /// Mean units sold per day.
    pub avg_daily_demand: f64,
    /// Sample standard deviation (n - 1) of daily units sold.
    pub demand_std: f64,
    /// Days the statistics were computed over.
    pub days: usize,
}

impl DemandStatistics {
    /// Statistics of a daily series. Fewer than two days yields zeros.
    pub fn from_series(series: &DemandSeries) -> Self {
        let values = series.values();
        if values.len() < 2 {
            return Self {
                days: values.len(),
                ..Self::default()
            };
        }

        Self {
            avg_daily_demand: mean(values),
            demand_std: std_dev(values),
            days: values.len(),
        }
    }

    /// Statistics straight from raw observations.
    ///
    /// Fewer than `min_observations` raw observations yields zeros rather
    /// than an error.
    pub fn from_observations(observations: &[SalesObservation], min_observations: usize) -> Self {
        if observations.len() < min_observations {
            return Self::default();
        }
        match DemandSeries::from_observations(observations) {
            Ok(series) => Self::from_series(&series),
            Err(_) => Self::default(),
        }
    }

    /// Whether any demand was observed.
    pub fn has_demand(&self) -> bool {
        self.avg_daily_demand > 0.0
    }
}
