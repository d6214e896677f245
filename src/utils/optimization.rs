//! Derivative-free optimization for model parameter estimation.

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex converged before the iteration limit.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance, relative to the magnitude of the best value.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.05).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

impl NelderMeadConfig {
    /// Configuration with a given iteration budget.
    pub fn with_max_iter(max_iter: usize) -> Self {
        Self {
            max_iter,
            ..Default::default()
        }
    }
}

/// Perform bounded Nelder-Mead simplex minimization.
///
/// Non-finite objective values are treated as `+inf`, so a region where the
/// model explodes is simply avoided. Convergence is declared when the spread
/// of objective values across the simplex falls below
/// `tolerance * (1 + |best|)`, or when the simplex collapses.
///
/// # Example
/// ```
/// use anofox_inventory::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let start = apply_bounds(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        // Step inwards if the bound swallowed the perturbation
        if let Some(b) = bounds {
            if i < b.len() && vertex[i] > b[i].1 {
                vertex[i] = start[i] - step;
            }
        }
        simplex.push(apply_bounds(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut indices: Vec<usize> = (0..=n).collect();
        indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

        let best_idx = indices[0];
        let worst_idx = indices[n];
        let second_worst_idx = indices[n - 1];

        let best_value = values[best_idx];
        let range = values[worst_idx] - best_value;
        if best_value.is_finite() && range <= config.tolerance * (1.0 + best_value.abs()) {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst_idx);
        let spread = simplex
            .iter()
            .map(|v| euclidean_distance(v, &centroid))
            .fold(0.0, f64::max);
        if best_value.is_finite() && spread < config.tolerance {
            converged = true;
            break;
        }

        let reflected = apply_bounds(&toward(&centroid, &simplex[worst_idx], -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < best_value {
            let expanded = apply_bounds(&toward(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            let (vertex, value) = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            simplex[worst_idx] = vertex;
            values[worst_idx] = value;
            continue;
        }

        if reflected_value < values[second_worst_idx] {
            simplex[worst_idx] = reflected;
            values[worst_idx] = reflected_value;
            continue;
        }

        // Contract towards whichever of reflected and worst is better
        let outside = reflected_value < values[worst_idx];
        let anchor = if outside { &reflected } else { &simplex[worst_idx] };
        let anchor_value = if outside { reflected_value } else { values[worst_idx] };
        let contracted = apply_bounds(&toward(&centroid, anchor, config.rho), bounds);
        let contracted_value = eval(&contracted);
        if contracted_value < anchor_value {
            simplex[worst_idx] = contracted;
            values[worst_idx] = contracted_value;
            continue;
        }

        // Shrink every vertex towards the best one
        let best = simplex[best_idx].clone();
        for (i, vertex) in simplex.iter_mut().enumerate() {
            if i != best_idx {
                *vertex = apply_bounds(&toward(&best, vertex, config.sigma), bounds);
                values[i] = eval(vertex.as_slice());
            }
        }
    }

    let best_idx = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best_idx].clone(),
        optimal_value: values[best_idx],
        iterations,
        converged,
    }
}

/// Mean of every vertex except `skip`.
fn centroid_without(simplex: &[Vec<f64>], skip: usize) -> Vec<f64> {
    let dim = simplex[0].len();
    let others = (simplex.len() - 1) as f64;
    (0..dim)
        .map(|j| {
            simplex
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, v)| v[j])
                .sum::<f64>()
                / others
        })
        .collect()
}

/// `origin + coeff * (point - origin)`.
///
/// Reflection uses a negative coefficient; expansion, contraction and
/// shrinkage use positive ones.
fn toward(origin: &[f64], point: &[f64], coeff: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + coeff * (p - o))
        .collect()
}

fn apply_bounds(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    let Some(bounds) = bounds else {
        return point.to_vec();
    };
    point
        .iter()
        .enumerate()
        .map(|(i, &x)| bounds.get(i).map_or(x, |&(lo, hi)| x.clamp(lo, hi)))
        .collect()
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_with_bounds() {
        // Minimum of (x-5)^2 on [0, 3] sits on the boundary
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn nelder_mead_start_on_upper_bound() {
        let result = nelder_mead(
            |x| (x[0] - 0.5).powi(2),
            &[0.99],
            Some(&[(-0.99, 0.99)]),
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 0.5, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_avoids_non_finite_region() {
        // Objective undefined for x < 0
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.2],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_reports_iteration_limit() {
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[-1.5, 2.0],
            None,
            NelderMeadConfig::with_max_iter(3),
        );

        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn nelder_mead_ar1_conditional_sum_of_squares() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        // x_t = 0.6 x_{t-1} + e_t
        let mut rng = StdRng::seed_from_u64(7);
        let mut x = vec![1.0];
        for t in 1..400 {
            let noise: f64 = rng.gen_range(-0.5..0.5);
            x.push(0.6 * x[t - 1] + noise);
        }
        let css = |params: &[f64]| {
            (1..x.len())
                .map(|t| (x[t] - params[0] * x[t - 1]).powi(2))
                .sum::<f64>()
        };

        let result = nelder_mead(css, &[0.1], Some(&[(-0.99, 0.99)]), NelderMeadConfig::default());

        assert!(result.converged);
        assert!((result.optimal_point[0] - 0.6).abs() < 0.2);
    }

    #[test]
    fn nelder_mead_empty_initial() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());

        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }
}
