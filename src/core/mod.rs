//! Core data structures: sales observations, daily demand series and forecasts.

mod demand_series;
mod forecast;
mod observation;

pub use demand_series::{aggregate_daily, DemandSeries};
pub use forecast::{DemandForecast, Forecast};
pub use observation::SalesObservation;
