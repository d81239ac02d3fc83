//! Linear interpolation.

use crate::error::MathResult;
use crate::interpolation::{Interpolator, Nodes};

/// Linear interpolation between data points.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{Interpolator, LinearInterpolator};
///
/// let interp = LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]).unwrap();
/// assert_eq!(interp.interpolate(1.5), 2.5);
/// assert_eq!(interp.interpolate(3.0), 7.0); // extends the last piece
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    nodes: Nodes,
    primitive_const: Vec<f64>,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 2 points, lengths differ or
    /// the x values are not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        let nodes = Nodes::new(xs, ys)?;
        let mut primitive_const = vec![0.0; nodes.len()];
        for i in 1..nodes.len() {
            let dx = nodes.xs[i] - nodes.xs[i - 1];
            primitive_const[i] =
                primitive_const[i - 1] + 0.5 * dx * (nodes.ys[i - 1] + nodes.ys[i]);
        }
        Ok(Self {
            nodes,
            primitive_const,
        })
    }

    fn slope(&self, i: usize) -> f64 {
        (self.nodes.ys[i + 1] - self.nodes.ys[i]) / (self.nodes.xs[i + 1] - self.nodes.xs[i])
    }
}

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        self.nodes.ys[i] + (x - self.nodes.xs[i]) * self.slope(i)
    }

    fn derivative(&self, x: f64) -> f64 {
        self.slope(self.nodes.locate(x))
    }

    fn primitive(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let dx = x - self.nodes.xs[i];
        self.primitive_const[i] + dx * (self.nodes.ys[i] + 0.5 * dx * self.slope(i))
    }

    fn min_x(&self) -> f64 {
        self.nodes.min_x()
    }

    fn max_x(&self) -> f64 {
        self.nodes.max_x()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_basic() {
        let interp = LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 4.0]).unwrap();

        assert_relative_eq!(interp.interpolate(0.5), 1.0, epsilon = 1e-12);
        assert_relative_eq!(interp.interpolate(1.0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(interp.derivative(1.5), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_extrapolates_boundary_piece() {
        let interp = LinearInterpolator::new(vec![1.0, 2.0], vec![1.0, 3.0]).unwrap();
        assert_relative_eq!(interp.interpolate(0.0), -1.0, epsilon = 1e-12);
        assert_relative_eq!(interp.interpolate(3.0), 5.0, epsilon = 1e-12);
        assert!(!interp.in_range(3.0));
    }

    #[test]
    fn test_linear_primitive() {
        // y = x on [0, 1], y = 1 on [1, 2]
        let interp =
            LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 1.0]).unwrap();
        assert_relative_eq!(interp.primitive(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(interp.primitive(1.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(interp.primitive(1.5), 1.0, epsilon = 1e-12);
        assert_relative_eq!(interp.primitive(2.0), 1.5, epsilon = 1e-12);
    }
}
