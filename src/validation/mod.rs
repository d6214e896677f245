//! Statistical tests run on demand series before model selection.
//!
//! # Example
//!
//! ```
//! use anofox_inventory::validation::{adf_test, is_stationary};
//!
//! let series = vec![3.0, 0.0, 5.0, 1.0, 4.0, 0.0, 2.0, 6.0, 1.0, 3.0, 0.0, 4.0];
//! let adf = adf_test(&series, None);
//! println!("ADF statistic {:.3}, p = {:.3}", adf.statistic, adf.p_value);
//! let _ = is_stationary(&series, 0.05);
//! ```

pub mod stationarity;

pub use stationarity::{
    adf_test, is_stationary, CriticalValues, StationarityResult, DEFAULT_SIGNIFICANCE,
};
