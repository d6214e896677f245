//! Differencing utilities for ARIMA models.

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series, `d` values shorter than the input.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate (reverse differencing) a forecast made on the differenced scale.
///
/// # Arguments
/// * `differenced` - Values on the `d`-times differenced scale
/// * `original` - The original series (supplies the starting level at each order)
/// * `d` - Differencing order used
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let init_value = difference(original, level).last().copied().unwrap_or(0.0);

        let mut cumsum = init_value;
        result = result
            .iter()
            .map(|&step| {
                cumsum += step;
                cumsum
            })
            .collect();
    }

    result
}

/// Multiply two polynomials given by ascending coefficients.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}
