//! Demand forecasting models.

mod traits;

pub mod arima;

pub use arima::{AutoARIMA, AutoARIMAConfig, ModelOrder, ARIMA};
pub use traits::{BoxedForecaster, Forecaster};
