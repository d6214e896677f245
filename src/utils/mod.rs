//! Numerical utilities shared by the models and the stationarity test.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{ols_fit, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{cdf_normal, quantile_normal, round_to};
