//! Levenberg-Marquardt nonlinear least squares.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};
use crate::linear_algebra::solve_linear_system;
use crate::optimization::{sanitize, OptimizationConfig, OptimizationResult};

const INITIAL_DAMPING: f64 = 1e-3;
const MAX_DAMPING: f64 = 1e12;

fn sum_of_squares(r: &[f64]) -> f64 {
    sanitize(r.iter().map(|v| v * v).sum())
}

/// Minimizes `Σ r_k(p)²` over `p`.
///
/// The Jacobian is taken by forward differences with a relative step of
/// `config.initial_step * 1e-6`. The objective value reported is the sum of
/// squared residuals.
///
/// # Example
///
/// ```rust
/// use pillar_math::optimization::{levenberg_marquardt, OptimizationConfig};
///
/// // Fit y = a * exp(b t)
/// let ts: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
/// let ys: Vec<f64> = ts.iter().map(|t| 2.0 * (0.3 * t).exp()).collect();
/// let residuals = |p: &[f64]| {
///     ts.iter().zip(&ys).map(|(t, y)| p[0] * (p[1] * t).exp() - y).collect::<Vec<_>>()
/// };
/// let result = levenberg_marquardt(residuals, &[1.0, 0.1], &OptimizationConfig::default()).unwrap();
/// assert!((result.parameters[1] - 0.3).abs() < 1e-6);
/// ```
pub fn levenberg_marquardt<F>(
    residuals: F,
    initial: &[f64],
    config: &OptimizationConfig,
) -> MathResult<OptimizationResult>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::invalid_input("cannot optimize over zero parameters"));
    }

    let mut params = initial.to_vec();
    let mut r = residuals(&params);
    let m = r.len();
    if m < n {
        return Err(MathError::insufficient_data(n, m));
    }
    let mut cost = sum_of_squares(&r);
    if !cost.is_finite() {
        return Err(MathError::invalid_input("objective is not finite at the initial point"));
    }

    let rel_step = config.initial_step * 1e-6;
    let mut damping = INITIAL_DAMPING;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut jac = DMatrix::zeros(m, n);
        for j in 0..n {
            let h = rel_step * params[j].abs().max(1.0);
            let mut bumped = params.clone();
            bumped[j] += h;
            let rb = residuals(&bumped);
            if rb.len() != m {
                return Err(MathError::length_mismatch(m, rb.len()));
            }
            for k in 0..m {
                jac[(k, j)] = (rb[k] - r[k]) / h;
            }
        }

        let rv = DVector::from_column_slice(&r);
        let jtj = jac.transpose() * &jac;
        let gradient = jac.transpose() * rv;
        if gradient.amax() <= config.tolerance {
            converged = true;
            break;
        }

        let mut improved = false;
        while damping < MAX_DAMPING {
            let mut lhs = jtj.clone();
            for j in 0..n {
                lhs[(j, j)] += damping * jtj[(j, j)].max(1e-12);
            }
            let step = match solve_linear_system(&lhs, &(-&gradient)) {
                Ok(step) => step,
                Err(_) => {
                    damping *= 10.0;
                    continue;
                }
            };

            let trial: Vec<f64> = params.iter().zip(step.iter()).map(|(p, s)| p + s).collect();
            let r_trial = residuals(&trial);
            let trial_cost = if r_trial.len() == m {
                sum_of_squares(&r_trial)
            } else {
                f64::INFINITY
            };

            if trial_cost < cost {
                let step_norm = step.amax();
                let scale = params.iter().fold(0.0f64, |acc, p| acc.max(p.abs()));
                let decrease = cost - trial_cost;
                params = trial;
                r = r_trial;
                cost = trial_cost;
                damping = (damping / 10.0).max(1e-15);
                improved = true;
                if step_norm <= config.tolerance * (scale + config.tolerance)
                    || decrease <= config.tolerance * cost.max(config.tolerance)
                {
                    converged = true;
                }
                break;
            }
            damping *= 10.0;
        }

        if converged {
            break;
        }
        if !improved {
            // No damping makes progress: a local minimum to working precision.
            converged = true;
            break;
        }
    }

    log::debug!(
        "levenberg-marquardt finished after {iterations} iterations, cost {cost:.3e}"
    );

    Ok(OptimizationResult {
        parameters: params,
        objective_value: cost,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_regression() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.0, 3.1, 4.9, 7.2, 8.8];
        let residuals = |p: &[f64]| {
            xs.iter()
                .zip(&ys)
                .map(|(x, y)| p[0] + p[1] * x - y)
                .collect::<Vec<_>>()
        };
        let result =
            levenberg_marquardt(residuals, &[0.0, 0.0], &OptimizationConfig::default()).unwrap();
        // Ordinary least squares: slope 1.97, intercept 1.06
        assert_relative_eq!(result.parameters[1], 1.97, epsilon = 1e-6);
        assert_relative_eq!(result.parameters[0], 1.06, epsilon = 1e-6);
    }

    #[test]
    fn test_exponential_fit_exact() {
        let ts: [f64; 4] = [0.5, 1.0, 2.0, 5.0];
        let ys: Vec<f64> = ts.iter().map(|t| 0.97 * (-0.04 * t).exp()).collect();
        let residuals = |p: &[f64]| {
            ts.iter()
                .zip(&ys)
                .map(|(t, y)| p[0] * (p[1] * t).exp() - y)
                .collect::<Vec<_>>()
        };
        let result =
            levenberg_marquardt(residuals, &[1.0, 0.0], &OptimizationConfig::default()).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.parameters[0], 0.97, epsilon = 1e-7);
        assert_relative_eq!(result.parameters[1], -0.04, epsilon = 1e-7);
        assert!(result.objective_value < 1e-14);
    }

    #[test]
    fn test_underdetermined_rejected() {
        let residuals = |p: &[f64]| vec![p[0] + p[1]];
        assert!(matches!(
            levenberg_marquardt(residuals, &[0.0, 0.0], &OptimizationConfig::default()),
            Err(MathError::InsufficientData { .. })
        ));
    }
}
