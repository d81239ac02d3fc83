//! Log-linear interpolation.

use crate::error::MathResult;
use crate::interpolation::{log_values, Interpolator, LinearInterpolator};

/// Linear interpolation of `ln(y)`.
///
/// Applied to discount factors this gives piecewise flat instantaneous
/// forwards. All y values must be strictly positive.
#[derive(Debug, Clone)]
pub struct LogLinearInterpolator {
    log: LinearInterpolator,
    xs: Vec<f64>,
    ys: Vec<f64>,
    primitive_const: Vec<f64>,
}

impl LogLinearInterpolator {
    /// Creates a new log-linear interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid nodes or non-positive y values.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        let log = LinearInterpolator::new(xs.clone(), log_values(&ys)?)?;
        let mut primitive_const = vec![0.0; xs.len()];
        for i in 1..xs.len() {
            primitive_const[i] =
                primitive_const[i - 1] + piece_integral(xs[i - 1], ys[i - 1], xs[i], ys[i]);
        }
        Ok(Self {
            log,
            xs,
            ys,
            primitive_const,
        })
    }

    fn piece(&self, x: f64) -> usize {
        let above = self.xs.partition_point(|&v| v <= x);
        above.saturating_sub(1).min(self.xs.len() - 2)
    }
}

/// Integral of the exponential piece through `(x0, y0)` and `(x1, y1)` from
/// x0 to x1.
fn piece_integral(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let dx = x1 - x0;
    let b = (y1 / y0).ln();
    if b.abs() < 1e-12 {
        y0 * dx
    } else {
        y0 * dx * (b.exp() - 1.0) / b
    }
}

impl Interpolator for LogLinearInterpolator {
    fn interpolate(&self, x: f64) -> f64 {
        self.log.interpolate(x).exp()
    }

    fn derivative(&self, x: f64) -> f64 {
        self.interpolate(x) * self.log.derivative(x)
    }

    fn primitive(&self, x: f64) -> f64 {
        let i = self.piece(x);
        let rate = self.log.derivative(x);
        let dx = x - self.xs[i];
        let partial = if (rate * dx).abs() < 1e-12 {
            self.ys[i] * dx
        } else {
            self.ys[i] * ((rate * dx).exp() - 1.0) / rate
        };
        self.primitive_const[i] + partial
    }

    fn min_x(&self) -> f64 {
        self.log.min_x()
    }

    fn max_x(&self) -> f64 {
        self.log.max_x()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_linear_flat_forward() {
        let r: f64 = 0.03;
        let xs = vec![0.0, 1.0, 5.0];
        let ys: Vec<f64> = xs.iter().map(|t| (-r * t).exp()).collect();
        let interp = LogLinearInterpolator::new(xs, ys).unwrap();

        for t in [0.25, 2.0, 4.5, 7.0] {
            assert_relative_eq!(interp.interpolate(t), (-r * t).exp(), epsilon = 1e-12);
            assert_relative_eq!(
                interp.derivative(t) / interp.interpolate(t),
                -r,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_log_linear_primitive() {
        let r: f64 = 0.05;
        let xs = vec![0.0, 2.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|t| (-r * t).exp()).collect();
        let interp = LogLinearInterpolator::new(xs, ys).unwrap();
        let exact = |t: f64| (1.0 - (-r * t).exp()) / r;
        assert_relative_eq!(interp.primitive(3.0), exact(3.0), epsilon = 1e-12);
        assert_relative_eq!(interp.primitive(2.0), exact(2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_log_linear_rejects_non_positive() {
        assert!(LogLinearInterpolator::new(vec![0.0, 1.0], vec![1.0, -0.5]).is_err());
    }
}
