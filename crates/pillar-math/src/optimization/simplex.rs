//! Nelder-Mead downhill simplex.

use crate::error::{MathError, MathResult};
use crate::optimization::{sanitize, OptimizationConfig, OptimizationResult};

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimizes `f` with the Nelder-Mead simplex method.
///
/// The initial simplex is `initial` plus `config.initial_step` along each
/// axis. Iteration stops when the spread of cost values over the simplex,
/// or the simplex diameter, falls below `config.tolerance`. Running out of
/// iterations is not an error: the best vertex is returned with
/// `converged == false`.
///
/// # Example
///
/// ```rust
/// use pillar_math::optimization::{nelder_mead, OptimizationConfig};
///
/// let f = |p: &[f64]| (p[0] - 1.0).powi(2) + (p[1] + 2.0).powi(2);
/// let config = OptimizationConfig::default().with_tolerance(1e-14);
/// let result = nelder_mead(f, &[0.0, 0.0], &config).unwrap();
/// assert!((result.parameters[0] - 1.0).abs() < 1e-5);
/// ```
pub fn nelder_mead<F>(
    f: F,
    initial: &[f64],
    config: &OptimizationConfig,
) -> MathResult<OptimizationResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::invalid_input("cannot optimize over zero parameters"));
    }
    let cost = |x: &[f64]| sanitize(f(x));

    let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    vertices.push(initial.to_vec());
    for i in 0..n {
        let mut v = initial.to_vec();
        v[i] += config.initial_step;
        vertices.push(v);
    }
    let mut values: Vec<f64> = vertices.iter().map(|v| cost(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        vertices = order.iter().map(|&i| vertices[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let spread = (values[n] - values[0]).abs();
        if spread <= config.tolerance || diameter(&vertices) <= config.tolerance {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| vertices[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&vertices[n])
                .map(|(c, w)| c + t * (c - w))
                .collect()
        };

        let reflected = along(REFLECT);
        let f_reflected = cost(&reflected);

        if f_reflected < values[0] {
            let expanded = along(EXPAND);
            let f_expanded = cost(&expanded);
            if f_expanded < f_reflected {
                vertices[n] = expanded;
                values[n] = f_expanded;
            } else {
                vertices[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }
        if f_reflected < values[n - 1] {
            vertices[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < values[n] {
            let p = along(CONTRACT * REFLECT);
            let fp = cost(&p);
            (p, fp)
        } else {
            let p = along(-CONTRACT);
            let fp = cost(&p);
            (p, fp)
        };
        if f_contracted < values[n].min(f_reflected) {
            vertices[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let best = vertices[0].clone();
        for i in 1..=n {
            for (x, b) in vertices[i].iter_mut().zip(&best) {
                *x = b + SHRINK * (*x - b);
            }
            values[i] = cost(&vertices[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);
    log::debug!(
        "nelder-mead finished after {iterations} iterations, cost {:.3e}, converged {converged}",
        values[best]
    );

    Ok(OptimizationResult {
        parameters: vertices[best].clone(),
        objective_value: values[best],
        iterations,
        converged,
    })
}

fn diameter(vertices: &[Vec<f64>]) -> f64 {
    let first = &vertices[0];
    vertices[1..]
        .iter()
        .map(|v| {
            v.iter()
                .zip(first)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max)
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_bowl() {
        let f = |p: &[f64]| (p[0] - 3.0).powi(2) + 2.0 * (p[1] - 0.5).powi(2) + 1.0;
        let config = OptimizationConfig::default().with_tolerance(1e-14);
        let result = nelder_mead(f, &[0.0, 0.0], &config).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.parameters[0], 3.0, epsilon = 1e-5);
        assert_relative_eq!(result.parameters[1], 0.5, epsilon = 1e-5);
        assert_relative_eq!(result.objective_value, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rosenbrock() {
        let f = |p: &[f64]| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2);
        let config = OptimizationConfig::default()
            .with_tolerance(1e-16)
            .with_max_iterations(5000)
            .with_initial_step(0.5);
        let result = nelder_mead(f, &[-1.2, 1.0], &config).unwrap();
        assert_relative_eq!(result.parameters[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.parameters[1], 1.0, epsilon = 2e-3);
    }

    #[test]
    fn test_iteration_budget_reports_not_converged() {
        let f = |p: &[f64]| p[0].powi(2) + p[1].powi(2);
        let config = OptimizationConfig::default().with_max_iterations(3);
        let result = nelder_mead(f, &[5.0, 5.0], &config).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
        assert!(result.objective_value < 50.0);
    }

    #[test]
    fn test_nan_costs_are_avoided() {
        let f = |p: &[f64]| if p[0] < 0.0 { f64::NAN } else { (p[0] - 1.0).powi(2) };
        let config = OptimizationConfig::default().with_tolerance(1e-14);
        let result = nelder_mead(f, &[0.5], &config).unwrap();
        assert_relative_eq!(result.parameters[0], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_parameters() {
        let f = |_: &[f64]| 0.0;
        assert!(nelder_mead(f, &[], &OptimizationConfig::default()).is_err());
    }
}
