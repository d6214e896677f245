//! Error types for the anofox-inventory library.

use thiserror::Error;

/// Result type alias for forecasting and inventory operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while forecasting demand or deriving inventory metrics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Fewer observations than the operation requires.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Numerical failure inside a single model fit.
    #[error("computation error: {0}")]
    ComputationError(String),

    /// The final fit of the selected model failed.
    #[error("forecast failed: {0}")]
    ForecastFailure(String),
}

impl ForecastError {
    /// Whether the caller can expect a later request to succeed once more
    /// sales history has accrued.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ForecastError::InsufficientData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = ForecastError::InvalidParameter("periods must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid parameter: periods must be at least 1"
        );

        let err = ForecastError::ForecastFailure("non-finite residuals".to_string());
        assert_eq!(err.to_string(), "forecast failed: non-finite residuals");

        let err = ForecastError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn only_insufficient_data_is_retryable() {
        assert!(ForecastError::InsufficientData { needed: 10, got: 3 }.is_retryable());
        assert!(!ForecastError::ForecastFailure("x".into()).is_retryable());
        assert!(!ForecastError::ComputationError("x".into()).is_retryable());
        assert!(!ForecastError::EmptyData.is_retryable());
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
