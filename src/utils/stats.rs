//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

/// Quantile function of the standard normal distribution.
///
/// # Arguments
/// * `p` - Probability value (0.0 to 1.0)
///
/// # Returns
/// The z-score corresponding to the given probability.
///
/// # Example
/// ```
/// use anofox_inventory::utils::quantile_normal;
///
/// // 95% service level -> z ≈ 1.645
/// let z = quantile_normal(0.95);
/// assert!((z - 1.645).abs() < 0.001);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    Normal::standard().inverse_cdf(p)
}

/// Cumulative distribution function of the standard normal distribution.
pub fn cdf_normal(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Root mean square of a slice.
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    (values.iter().map(|x| x * x).sum::<f64>() / values.len() as f64).sqrt()
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 1e-9);
        assert_relative_eq!(quantile_normal(0.95), 1.644854, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.975), 1.959964, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.025), -1.959964, epsilon = 1e-5);
    }

    #[test]
    fn quantile_normal_boundary_values() {
        assert_eq!(quantile_normal(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile_normal(1.0), f64::INFINITY);
        assert!(quantile_normal(f64::NAN).is_nan());
    }

    #[test]
    fn cdf_inverts_quantile() {
        for p in [0.05, 0.3, 0.5, 0.9, 0.99] {
            assert_relative_eq!(cdf_normal(quantile_normal(p)), p, epsilon = 1e-9);
        }
    }

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variance_calculates_correctly() {
        // Sample variance of [1, 2, 3, 4, 5] = 2.5
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
        assert_relative_eq!(
            std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            2.5_f64.sqrt(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn rms_and_rounding() {
        assert_relative_eq!(rms(&[3.0, -4.0]), 12.5_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(rms(&[0.0, 0.0]), 0.0);
        assert_eq!(round_to(190.787_840_283, 2), 190.79);
        assert_eq!(round_to(-1.005_1, 2), -1.01);
        assert_eq!(round_to(70.0, 2), 70.0);
    }
}
