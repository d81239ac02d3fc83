//! Interpolation methods for pillar-based curves.
//!
//! A bootstrapped curve stores one value per pillar and fills the gaps with
//! one of these schemes. Every interpolator here extends its first and last
//! piece beyond the node range: the bootstrap prices the next instrument
//! before its pillar is solved, so extrapolation is always needed while a
//! curve is under construction. Range policy for finished curves lives with
//! the curve.
//!
//! # Available Methods
//!
//! | Method | Smoothness | Notes |
//! |--------|------------|-------|
//! | [`LinearInterpolator`] | C0 | |
//! | [`LogLinearInterpolator`] | C0 | positive values only |
//! | [`CubicInterpolator`] | C1 / C2 | spline, Kruger, parabolic, optional Hyman filter |
//! | [`MonotoneConvex`] | C1 | Hagan-West, preserves monotonicity of slopes |
//! | [`QuadraticInterpolator`] | C1 | |
//! | [`LogQuadraticInterpolator`] | C1 | positive values only |

mod cubic;
mod linear;
mod log_linear;
mod monotone_convex;
mod quadratic;

pub use cubic::{CubicBoundary, CubicInterpolator, CubicScheme};
pub use linear::LinearInterpolator;
pub use log_linear::LogLinearInterpolator;
pub use monotone_convex::MonotoneConvex;
pub use quadratic::{LogQuadraticInterpolator, QuadraticInterpolator};

use crate::error::{MathError, MathResult};

/// Trait for interpolation methods.
///
/// Evaluation never fails: points outside `[min_x, max_x]` are served by the
/// boundary piece.
pub trait Interpolator: Send + Sync {
    /// Returns the interpolated value at x.
    fn interpolate(&self, x: f64) -> f64;

    /// Returns the first derivative at x.
    fn derivative(&self, x: f64) -> f64;

    /// Returns the integral of the interpolant from the first node to x.
    fn primitive(&self, x: f64) -> f64;

    /// Returns the minimum x value in the data.
    fn min_x(&self) -> f64;

    /// Returns the maximum x value in the data.
    fn max_x(&self) -> f64;

    /// Checks if x is within the interpolation range.
    fn in_range(&self, x: f64) -> bool {
        x >= self.min_x() && x <= self.max_x()
    }
}

/// Validated interpolation nodes shared by the implementations.
#[derive(Debug, Clone)]
pub(crate) struct Nodes {
    pub(crate) xs: Vec<f64>,
    pub(crate) ys: Vec<f64>,
}

impl Nodes {
    pub(crate) fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        if xs.len() < 2 {
            return Err(MathError::insufficient_data(2, xs.len()));
        }
        if xs.len() != ys.len() {
            return Err(MathError::invalid_input(format!(
                "xs and ys must have same length: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MathError::invalid_input(
                "x values must be strictly increasing",
            ));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::invalid_input("x and y values must be finite"));
        }
        Ok(Self { xs, ys })
    }

    pub(crate) fn len(&self) -> usize {
        self.xs.len()
    }

    /// Index i of the piece `[xs[i], xs[i+1]]` serving x, clamped to the
    /// first and last piece.
    pub(crate) fn locate(&self, x: f64) -> usize {
        let above = self.xs.partition_point(|&v| v <= x);
        above.saturating_sub(1).min(self.xs.len() - 2)
    }

    pub(crate) fn min_x(&self) -> f64 {
        self.xs[0]
    }

    pub(crate) fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Interval widths.
    pub(crate) fn dx(&self) -> Vec<f64> {
        self.xs.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Interval slopes of y.
    pub(crate) fn slopes(&self) -> Vec<f64> {
        self.xs
            .windows(2)
            .zip(self.ys.windows(2))
            .map(|(x, y)| (y[1] - y[0]) / (x[1] - x[0]))
            .collect()
    }
}

/// Takes logarithms of strictly positive values.
pub(crate) fn log_values(ys: &[f64]) -> MathResult<Vec<f64>> {
    if let Some(bad) = ys.iter().find(|&&y| y <= 0.0) {
        return Err(MathError::invalid_input(format!(
            "log interpolation requires positive values, got {bad}"
        )));
    }
    Ok(ys.iter().map(|y| y.ln()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_validation() {
        assert!(matches!(
            Nodes::new(vec![1.0], vec![1.0]),
            Err(MathError::InsufficientData { .. })
        ));
        assert!(Nodes::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(Nodes::new(vec![0.0, 0.0], vec![1.0, 2.0]).is_err());
        assert!(Nodes::new(vec![0.0, 1.0], vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_locate_clamps() {
        let nodes = Nodes::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0; 4]).unwrap();
        assert_eq!(nodes.locate(-5.0), 0);
        assert_eq!(nodes.locate(0.0), 0);
        assert_eq!(nodes.locate(1.0), 1);
        assert_eq!(nodes.locate(2.5), 2);
        assert_eq!(nodes.locate(3.0), 2);
        assert_eq!(nodes.locate(10.0), 2);
    }

    #[test]
    fn test_log_values_rejects_non_positive() {
        assert!(log_values(&[1.0, 0.0]).is_err());
        assert!(log_values(&[1.0, 0.5]).is_ok());
    }
}
