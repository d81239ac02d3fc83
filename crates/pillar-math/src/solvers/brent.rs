//! Brent's root-finding algorithm.

use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Brent's root-finding algorithm.
///
/// Combines bisection with the secant method and inverse quadratic
/// interpolation. Convergence is declared when the bracket half-width
/// falls below `config.tolerance` or the function vanishes exactly.
///
/// Requires `f(a)` and `f(b)` of opposite sign (or one of them zero).
///
/// # Errors
///
/// - [`MathError::InvalidBracket`] if the endpoints do not bracket a root
/// - [`MathError::ConvergenceFailed`] if the iteration budget runs out
///
/// # Example
///
/// ```rust
/// use pillar_math::solvers::{brent, SolverConfig};
///
/// let f = |x: f64| x * x * x - x - 2.0;
/// let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();
/// assert!(f(result.root).abs() < 1e-9);
/// ```
pub fn brent<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let mut a = a;
    let mut b = b;
    let mut fa = f(a);
    let mut fb = f(b);

    if fa == 0.0 {
        return Ok(SolverResult {
            root: a,
            iterations: 0,
            residual: 0.0,
        });
    }
    if fb == 0.0 {
        return Ok(SolverResult {
            root: b,
            iterations: 0,
            residual: 0.0,
        });
    }
    if !fa.is_finite() || !fb.is_finite() || fa * fb > 0.0 {
        return Err(MathError::InvalidBracket { a, b, fa, fb });
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=config.max_iterations {
        // Keep the root between b and c.
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.tolerance;
        let m = 0.5 * (c - b);

        if m.abs() <= tol || fb == 0.0 {
            return Ok(SolverResult {
                root: b,
                iterations: iteration,
                residual: fb,
            });
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // Secant step
                (2.0 * m * s, 1.0 - s)
            } else {
                // Inverse quadratic interpolation
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * m * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = d;
            }
        } else {
            d = m;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(m) };
        fb = f(b);
        if !fb.is_finite() {
            return Err(MathError::convergence_failed(iteration, f64::NAN));
        }
    }

    Err(MathError::convergence_failed(config.max_iterations, fb.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_brent_sqrt2() {
        let f = |x: f64| x * x - 2.0;
        let result = brent(f, 0.0, 2.0, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, std::f64::consts::SQRT_2, epsilon = 1e-10);
    }

    #[test]
    fn test_brent_reversed_bracket() {
        let f = |x: f64| x.cos() - x;
        let result = brent(f, 1.0, 0.0, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, 0.739_085_133_215_160_6, epsilon = 1e-10);
    }

    #[test]
    fn test_brent_root_at_endpoint() {
        let f = |x: f64| x - 1.0;
        let result = brent(f, 1.0, 3.0, &SolverConfig::default()).unwrap();
        assert_eq!(result.root, 1.0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_brent_invalid_bracket() {
        let f = |x: f64| x * x + 1.0;
        let err = brent(f, -1.0, 1.0, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, MathError::InvalidBracket { .. }));
    }

    #[test]
    fn test_brent_iteration_budget() {
        let f = |x: f64| x.powi(3) - 0.3;
        let config = SolverConfig::new(1e-15, 2);
        assert!(matches!(
            brent(f, 0.0, 10.0, &config),
            Err(MathError::ConvergenceFailed { .. })
        ));
    }

    #[test]
    fn test_brent_tight_tolerance_discount() {
        // Discount factor giving 3% continuous over 10 years
        let target = (-0.3f64).exp();
        let f = |df: f64| -df.ln() / 10.0 - 0.03;
        let config = SolverConfig::default().with_tolerance(1e-14);
        let result = brent(f, 0.1, 1.0, &config).unwrap();
        assert_relative_eq!(result.root, target, epsilon = 1e-13);
    }
}
