//! Daily demand series built from irregular sales observations.

use crate::core::SalesObservation;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A contiguous daily demand series.
///
/// Holds one value per calendar day from `start` onwards. Days without sales
/// carry an explicit zero, so the mean and any fitted model see idle days as
/// "no demand" rather than as missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDemandSeries")]
pub struct DemandSeries {
    start: NaiveDate,
    values: Vec<f64>,
}

/// Unchecked wire form, validated through [`DemandSeries::new`].
#[derive(Deserialize)]
struct RawDemandSeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl TryFrom<RawDemandSeries> for DemandSeries {
    type Error = ForecastError;

    fn try_from(raw: RawDemandSeries) -> Result<Self> {
        Self::new(raw.start, raw.values)
    }
}

impl DemandSeries {
    /// Create a series from a start date and one value per day.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok(Self { start, values })
    }

    /// Aggregate observations into a zero-filled daily series.
    ///
    /// Observations may arrive in any order. Quantities sharing a date are
    /// summed; every day between the earliest and latest date (inclusive) is
    /// emitted, defaulting to zero.
    ///
    /// # Example
    /// ```
    /// use anofox_inventory::core::{DemandSeries, SalesObservation};
    /// use chrono::NaiveDate;
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    /// let obs = vec![
    ///     SalesObservation::new(day(3), 4),
    ///     SalesObservation::new(day(1), 2),
    ///     SalesObservation::new(day(1), 1),
    /// ];
    /// let series = DemandSeries::from_observations(&obs).unwrap();
    /// assert_eq!(series.values(), &[3.0, 0.0, 4.0]);
    /// ```
    pub fn from_observations(observations: &[SalesObservation]) -> Result<Self> {
        let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for obs in observations {
            *by_date.entry(obs.date).or_insert(0) += u64::from(obs.quantity);
        }

        let (first, last) = match (by_date.keys().next(), by_date.keys().next_back()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(ForecastError::EmptyData),
        };

        let days = last.signed_duration_since(first).num_days() as usize + 1;
        let values = first
            .iter_days()
            .take(days)
            .map(|date| by_date.get(&date).copied().unwrap_or(0) as f64)
            .collect();

        Ok(Self {
            start: first,
            values,
        })
    }

    /// First day of the series.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the series.
    pub fn end(&self) -> NaiveDate {
        self.start
            .iter_days()
            .nth(self.values.len().saturating_sub(1))
            .unwrap_or(self.start)
    }

    /// Number of days covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: a series covers at least one day.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Daily quantities, oldest first.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Calendar date of every entry.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take(self.values.len()).collect()
    }

    /// Total quantity over the whole series.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// The `periods` calendar days following the last day of the series.
    pub fn forecast_dates(&self, periods: usize) -> Vec<NaiveDate> {
        self.end().iter_days().skip(1).take(periods).collect()
    }
}

/// Aggregate observations after checking the raw observation count.
///
/// The minimum applies to raw observations, not to aggregated days: two
/// sales on the same day count twice here.
pub fn aggregate_daily(
    observations: &[SalesObservation],
    min_required: usize,
) -> Result<DemandSeries> {
    if observations.len() < min_required {
        return Err(ForecastError::InsufficientData {
            needed: min_required,
            got: observations.len(),
        });
    }
    DemandSeries::from_observations(observations)
}
