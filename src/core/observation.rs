//! Raw sales observations as delivered by the persistence layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Quantity of a product sold on one calendar date.
///
/// Several observations may share a date; they are summed during
/// aggregation, never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SalesObservation {
    /// Calendar date of the sale.
    pub date: NaiveDate,
    /// Units sold.
    pub quantity: u32,
}

impl SalesObservation {
    /// Create a new observation.
    pub fn new(date: NaiveDate, quantity: u32) -> Self {
        Self { date, quantity }
    }
}

impl From<(NaiveDate, u32)> for SalesObservation {
    fn from((date, quantity): (NaiveDate, u32)) -> Self {
        Self::new(date, quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_from_tuple() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let obs: SalesObservation = (date, 7).into();
        assert_eq!(obs, SalesObservation::new(date, 7));
    }

    #[test]
    fn observation_deserializes_from_record() {
        let obs: SalesObservation =
            serde_json::from_str(r#"{"date":"2024-03-01","quantity":12}"#).unwrap();
        assert_eq!(obs.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(obs.quantity, 12);
    }
}
