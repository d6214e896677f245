//! # anofox-inventory
//!
//! Demand forecasting and inventory optimization.
//!
//! Irregular sales observations are aggregated into a zero-filled daily
//! series. An ARIMA order is selected by AIC over a bounded grid, with the
//! differencing range fixed by an augmented Dickey-Fuller test, and the
//! winning order forecasts demand with prediction intervals. The same series
//! drives the economic order quantity, safety stock and reorder point.
//!
//! # Example
//! ```
//! use anofox_inventory::prelude::*;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let observations: Vec<SalesObservation> = start
//!     .iter_days()
//!     .take(15)
//!     .map(|date| SalesObservation::new(date, 10))
//!     .collect();
//!
//! let engine = DemandEngine::new().unwrap();
//! let product = ProductConfig::new(100.0).with_lead_time_days(7);
//! let metrics = engine.compute_inventory_metrics(&observations, &product);
//!
//! assert_eq!(metrics.reorder_point, 70.0);
//! assert_eq!(metrics.safety_stock, 0.0);
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod models;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{DemandForecast, DemandSeries, Forecast, SalesObservation};
    pub use crate::engine::{DemandEngine, DemandReport, EngineConfig};
    pub use crate::error::{ForecastError, Result};
    pub use crate::inventory::{
        DemandStatistics, InventoryMetrics, InventoryPolicy, ProductConfig, StockHealth,
        StockStatus,
    };
    pub use crate::models::{AutoARIMA, AutoARIMAConfig, Forecaster, ModelOrder};
}
