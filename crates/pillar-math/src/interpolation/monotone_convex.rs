//! Monotone convex interpolation (Hagan & West).
//!
//! The interpolant is built from its derivative: the interval slopes
//! `Δy / h` play the role of discrete forwards, node derivatives are blended
//! from neighbouring slopes, and within each interval a piecewise quadratic
//! correction `g` is chosen from the Hagan-West sectors so that the
//! derivative averages exactly to the interval slope. Integrating back gives
//! a C1 curve through every node that does not oscillate between them.
//!
//! Reference: Hagan, P. & West, G. (2006), "Interpolation Methods for Curve
//! Construction", Applied Mathematical Finance 13(2).

use crate::error::MathResult;
use crate::interpolation::{Interpolator, Nodes};

const TINY: f64 = 1e-14;

/// Shape of the derivative correction on one interval, in local coordinates
/// `u ∈ [0, 1]`.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Zero,
    /// `g0 (1 - 4u + 3u²) + g1 (3u² - 2u)`
    Quadratic { g0: f64, g1: f64 },
    /// Flat at `g0` up to `eta`, then rising to `g1`.
    FlatThenBend { g0: f64, g1: f64, eta: f64 },
    /// Bending from `g0` to `g1` by `eta`, flat afterwards.
    BendThenFlat { g0: f64, g1: f64, eta: f64 },
    /// Two quadratics meeting at the extremum `a` at `eta`.
    Bowl { g0: f64, g1: f64, eta: f64, a: f64 },
}

impl Shape {
    fn classify(g0: f64, g1: f64) -> Self {
        if g0.abs() < TINY && g1.abs() < TINY {
            Shape::Zero
        } else if g0 * g1 > 0.0 {
            let eta = g1 / (g1 + g0);
            let a = -g0 * g1 / (g0 + g1);
            Shape::Bowl { g0, g1, eta, a }
        } else if g0 == 0.0
            || g1 == 0.0
            || (g0 < 0.0 && g1 >= -0.5 * g0 && g1 <= -2.0 * g0)
            || (g0 > 0.0 && g1 <= -0.5 * g0 && g1 >= -2.0 * g0)
        {
            Shape::Quadratic { g0, g1 }
        } else if (g0 < 0.0 && g1 > -2.0 * g0) || (g0 > 0.0 && g1 < -2.0 * g0) {
            let eta = (g1 + 2.0 * g0) / (g1 - g0);
            Shape::FlatThenBend { g0, g1, eta }
        } else {
            let eta = 3.0 * g1 / (g1 - g0);
            Shape::BendThenFlat { g0, g1, eta }
        }
    }

    /// Correction at local coordinate u.
    fn value(self, u: f64) -> f64 {
        match self {
            Shape::Zero => 0.0,
            Shape::Quadratic { g0, g1 } => {
                g0 * (1.0 - 4.0 * u + 3.0 * u * u) + g1 * (3.0 * u * u - 2.0 * u)
            }
            Shape::FlatThenBend { g0, g1, eta } => {
                if u <= eta {
                    g0
                } else {
                    let r = (u - eta) / (1.0 - eta);
                    g0 + (g1 - g0) * r * r
                }
            }
            Shape::BendThenFlat { g0, g1, eta } => {
                if u < eta {
                    let r = (eta - u) / eta;
                    g1 + (g0 - g1) * r * r
                } else {
                    g1
                }
            }
            Shape::Bowl { g0, g1, eta, a } => {
                if u <= eta {
                    let r = (eta - u) / eta;
                    a + (g0 - a) * r * r
                } else {
                    let r = (u - eta) / (1.0 - eta);
                    a + (g1 - a) * r * r
                }
            }
        }
    }

    /// Integral of the correction from 0 to u.
    fn integral(self, u: f64) -> f64 {
        match self {
            Shape::Zero => 0.0,
            Shape::Quadratic { g0, g1 } => {
                g0 * (u - 2.0 * u * u + u * u * u) + g1 * (u * u * u - u * u)
            }
            Shape::FlatThenBend { g0, g1, eta } => {
                if u <= eta {
                    g0 * u
                } else {
                    let w = 1.0 - eta;
                    g0 * u + (g1 - g0) * (u - eta).powi(3) / (3.0 * w * w)
                }
            }
            Shape::BendThenFlat { g0, g1, eta } => {
                let r = if u < eta { (eta - u) / eta } else { 0.0 };
                g1 * u + (g0 - g1) * eta / 3.0 * (1.0 - r.powi(3))
            }
            Shape::Bowl { g0, g1, eta, a } => {
                if u <= eta {
                    let r = (eta - u) / eta;
                    a * u + (g0 - a) * eta / 3.0 * (1.0 - r.powi(3))
                } else {
                    let w = 1.0 - eta;
                    a * u + (g0 - a) * eta / 3.0 + (g1 - a) * (u - eta).powi(3) / (3.0 * w * w)
                }
            }
        }
    }

    fn breakpoint(self) -> Option<f64> {
        match self {
            Shape::FlatThenBend { eta, .. }
            | Shape::BendThenFlat { eta, .. }
            | Shape::Bowl { eta, .. } => Some(eta),
            _ => None,
        }
    }
}

/// Hagan-West monotone convex interpolator.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{Interpolator, MonotoneConvex};
///
/// let times = vec![0.0, 1.0, 2.0, 5.0, 10.0];
/// let zero_times_rate = vec![0.0, 0.02, 0.045, 0.125, 0.28];
/// let mc = MonotoneConvex::new(times, zero_times_rate).unwrap();
/// assert!((mc.interpolate(5.0) - 0.125).abs() < 1e-14);
/// ```
#[derive(Debug, Clone)]
pub struct MonotoneConvex {
    nodes: Nodes,
    slopes: Vec<f64>,
    shapes: Vec<Shape>,
    left_derivative: f64,
    right_derivative: f64,
    primitive_const: Vec<f64>,
}

impl MonotoneConvex {
    /// Creates a monotone convex interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid nodes.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        let nodes = Nodes::new(xs, ys)?;
        let dx = nodes.dx();
        let slopes = nodes.slopes();
        let m = slopes.len();

        let mut f = vec![0.0; m + 1];
        if m == 1 {
            f[0] = slopes[0];
            f[1] = slopes[0];
        } else {
            for i in 1..m {
                f[i] = (dx[i - 1] * slopes[i] + dx[i] * slopes[i - 1]) / (dx[i - 1] + dx[i]);
            }
            f[0] = slopes[0] - 0.5 * (f[1] - slopes[0]);
            f[m] = slopes[m - 1] - 0.5 * (f[m - 1] - slopes[m - 1]);
        }

        let shapes: Vec<Shape> = (0..m)
            .map(|i| Shape::classify(f[i] - slopes[i], f[i + 1] - slopes[i]))
            .collect();

        let mut interp = Self {
            nodes,
            slopes,
            shapes,
            left_derivative: f[0],
            right_derivative: f[m],
            primitive_const: vec![0.0; m + 1],
        };
        for i in 1..=m {
            interp.primitive_const[i] =
                interp.primitive_const[i - 1] + interp.piece_area(i - 1, 0.0, 1.0);
        }
        Ok(interp)
    }

    fn width(&self, i: usize) -> f64 {
        self.nodes.xs[i + 1] - self.nodes.xs[i]
    }

    fn piece_value(&self, i: usize, u: f64) -> f64 {
        let h = self.width(i);
        self.nodes.ys[i] + h * (self.slopes[i] * u + self.shapes[i].integral(u))
    }

    /// Area under piece i between local coordinates u0 and u1.
    ///
    /// The piece is cubic on each side of its breakpoint, so Simpson's rule
    /// on each side is exact.
    fn piece_area(&self, i: usize, u0: f64, u1: f64) -> f64 {
        let h = self.width(i);
        let simpson = |a: f64, b: f64| {
            (b - a) / 6.0
                * (self.piece_value(i, a)
                    + 4.0 * self.piece_value(i, 0.5 * (a + b))
                    + self.piece_value(i, b))
        };
        let area = match self.shapes[i].breakpoint() {
            Some(eta) if eta > u0 && eta < u1 => simpson(u0, eta) + simpson(eta, u1),
            _ => simpson(u0, u1),
        };
        h * area
    }
}

impl Interpolator for MonotoneConvex {
    fn interpolate(&self, x: f64) -> f64 {
        let n = self.nodes.len();
        if x < self.nodes.xs[0] {
            return self.nodes.ys[0] + self.left_derivative * (x - self.nodes.xs[0]);
        }
        if x > self.nodes.xs[n - 1] {
            return self.nodes.ys[n - 1] + self.right_derivative * (x - self.nodes.xs[n - 1]);
        }
        let i = self.nodes.locate(x);
        self.piece_value(i, (x - self.nodes.xs[i]) / self.width(i))
    }

    fn derivative(&self, x: f64) -> f64 {
        let n = self.nodes.len();
        if x < self.nodes.xs[0] {
            return self.left_derivative;
        }
        if x > self.nodes.xs[n - 1] {
            return self.right_derivative;
        }
        let i = self.nodes.locate(x);
        let u = (x - self.nodes.xs[i]) / self.width(i);
        self.slopes[i] + self.shapes[i].value(u)
    }

    fn primitive(&self, x: f64) -> f64 {
        let n = self.nodes.len();
        if x < self.nodes.xs[0] {
            let d = x - self.nodes.xs[0];
            return d * (self.nodes.ys[0] + 0.5 * self.left_derivative * d);
        }
        if x > self.nodes.xs[n - 1] {
            let d = x - self.nodes.xs[n - 1];
            return self.primitive_const[n - 1]
                + d * (self.nodes.ys[n - 1] + 0.5 * self.right_derivative * d);
        }
        let i = self.nodes.locate(x);
        let u = (x - self.nodes.xs[i]) / self.width(i);
        self.primitive_const[i] + self.piece_area(i, 0.0, u)
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

    fn sample() -> MonotoneConvex {
        // Integrated forwards r(t) * t of an upward sloping curve
        let xs = vec![0.0, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0];
        let rates = [0.0, 0.020, 0.022, 0.025, 0.030, 0.034, 0.036];
        let ys = xs.iter().zip(rates).map(|(t, r)| t * r).collect();
        MonotoneConvex::new(xs, ys).unwrap()
    }

    #[test]
    fn test_passes_through_nodes() {
        let mc = sample();
        assert_relative_eq!(mc.interpolate(0.0), 0.0, epsilon = 1e-15);
        assert_relative_eq!(mc.interpolate(2.0), 0.05, epsilon = 1e-14);
        assert_relative_eq!(mc.interpolate(10.0), 0.34, epsilon = 1e-14);
        assert_relative_eq!(mc.interpolate(30.0), 1.08, epsilon = 1e-14);
    }

    #[test]
    fn test_derivative_is_continuous_at_nodes() {
        let mc = sample();
        for x in [0.5, 1.0, 2.0, 5.0, 10.0] {
            let left = mc.derivative(x - 1e-9);
            let right = mc.derivative(x + 1e-9);
            assert_relative_eq!(left, right, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_derivative_averages_to_slope() {
        let mc = sample();
        // y(5) - y(2) equals the integral of the derivative
        let n = 10_000;
        let h = 3.0 / f64::from(n);
        let integral: f64 = (0..n)
            .map(|k| mc.derivative(2.0 + (f64::from(k) + 0.5) * h) * h)
            .sum();
        assert_relative_eq!(integral, 0.15 - 0.05, epsilon = 1e-8);
    }

    #[test]
    fn test_forwards_stay_positive() {
        let mc = sample();
        for k in 0..=600 {
            assert!(mc.derivative(f64::from(k) * 0.05) > 0.0);
        }
    }

    #[test]
    fn test_linear_data_is_reproduced() {
        let xs = vec![0.0, 1.0, 3.0, 7.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.03 * x).collect();
        let mc = MonotoneConvex::new(xs, ys).unwrap();
        assert_relative_eq!(mc.interpolate(2.2), 0.066, epsilon = 1e-15);
        assert_relative_eq!(mc.derivative(5.0), 0.03, epsilon = 1e-15);
        assert_relative_eq!(mc.primitive(7.0), 0.015 * 49.0, epsilon = 1e-14);
    }

    #[test]
    fn test_extrapolation_is_linear() {
        let mc = sample();
        let slope = mc.derivative(30.0);
        assert_relative_eq!(mc.interpolate(40.0), 1.08 + 10.0 * slope, epsilon = 1e-12);
    }

    #[test]
    fn test_primitive_matches_quadrature() {
        let mc = sample();
        let n = 20_000;
        let h = 10.0 / f64::from(n);
        let sum: f64 = (0..n)
            .map(|k| mc.interpolate((f64::from(k) + 0.5) * h) * h)
            .sum();
        assert_relative_eq!(mc.primitive(10.0), sum, epsilon = 1e-7);
    }

    #[test]
    fn test_sector_integrals_match_values() {
        for (g0, g1) in [(1.0, 0.5), (-1.0, 1.0), (1.0, -3.0), (1.0, -0.2), (-0.3, -0.1)] {
            let shape = Shape::classify(g0, g1);
            assert_relative_eq!(shape.value(0.0), g0, epsilon = 1e-12);
            assert_relative_eq!(shape.value(1.0), g1, epsilon = 1e-12);
            assert_relative_eq!(shape.integral(1.0), 0.0, epsilon = 1e-12);
        }
    }
}
