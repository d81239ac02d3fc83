//! Piecewise cubic interpolation.
//!
//! Each piece is a cubic Hermite polynomial determined by the node values and
//! the first derivatives at the nodes. The derivative scheme decides how
//! those derivatives are obtained:
//!
//! - [`CubicScheme::Spline`]: global C2 spline with explicit boundary conditions
//! - [`CubicScheme::Kruger`]: local harmonic-mean estimate, no overshoot on
//!   monotone data
//! - [`CubicScheme::Parabolic`]: local three-point parabola (Hermite)
//!
//! The local schemes estimate the end derivatives from the adjacent
//! slopes. [`CubicInterpolator::with_end_conditions`] replaces either end
//! estimate by a prescribed first or second derivative.
//!
//! An optional Hyman filter clips the derivatives so that monotone data gives
//! a monotone interpolant.

use crate::error::{MathError, MathResult};
use crate::interpolation::{Interpolator, Nodes};
use crate::linear_algebra::solve_tridiagonal;

/// Boundary condition for a cubic spline end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CubicBoundary {
    /// Prescribed second derivative (zero gives the natural spline).
    SecondDerivative(f64),
    /// Prescribed first derivative.
    FirstDerivative(f64),
}

impl Default for CubicBoundary {
    fn default() -> Self {
        CubicBoundary::SecondDerivative(0.0)
    }
}

/// How node derivatives are determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CubicScheme {
    /// Global spline with the given left and right boundary conditions.
    Spline {
        /// Condition at the first node.
        left: CubicBoundary,
        /// Condition at the last node.
        right: CubicBoundary,
    },
    /// Kruger's constrained cubic.
    Kruger,
    /// Three-point parabolic estimate.
    Parabolic,
}

impl CubicScheme {
    /// Natural spline (zero second derivative at both ends).
    #[must_use]
    pub fn natural_spline() -> Self {
        CubicScheme::Spline {
            left: CubicBoundary::default(),
            right: CubicBoundary::default(),
        }
    }
}

/// Piecewise cubic interpolator.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{CubicInterpolator, CubicScheme, Interpolator};
///
/// let xs = vec![0.0, 1.0, 2.0, 3.0];
/// let ys = vec![0.0, 1.0, 8.0, 27.0];
/// let spline = CubicInterpolator::new(xs, ys, CubicScheme::natural_spline(), false).unwrap();
/// assert!((spline.interpolate(2.0) - 8.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CubicInterpolator {
    nodes: Nodes,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    primitive_const: Vec<f64>,
    adjusted: Vec<bool>,
}

impl CubicInterpolator {
    /// Creates a cubic interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid nodes or a singular spline system.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, scheme: CubicScheme, monotonic: bool) -> MathResult<Self> {
        Self::with_end_conditions(xs, ys, scheme, monotonic, None, None)
    }

    /// Creates a local-scheme cubic whose end derivatives are overridden.
    ///
    /// `None` keeps the scheme's own estimate at that end. The monotonicity
    /// filter runs after the overrides. Spline schemes carry their boundary
    /// conditions already and reject overrides.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid nodes, a singular spline system, or an
    /// override passed with [`CubicScheme::Spline`].
    pub fn with_end_conditions(
        xs: Vec<f64>,
        ys: Vec<f64>,
        scheme: CubicScheme,
        monotonic: bool,
        left: Option<CubicBoundary>,
        right: Option<CubicBoundary>,
    ) -> MathResult<Self> {
        if matches!(scheme, CubicScheme::Spline { .. }) && (left.is_some() || right.is_some()) {
            return Err(MathError::invalid_input(
                "Spline schemes take their boundary conditions in the scheme",
            ));
        }
        let nodes = Nodes::new(xs, ys)?;
        let n = nodes.len();
        let dx = nodes.dx();
        let s = nodes.slopes();

        let mut tmp = match scheme {
            CubicScheme::Spline { left, right } => spline_derivatives(&dx, &s, left, right)?,
            CubicScheme::Kruger if n == 2 => vec![s[0], s[0]],
            CubicScheme::Parabolic if n == 2 => vec![s[0], s[0]],
            CubicScheme::Kruger => kruger_derivatives(&s),
            CubicScheme::Parabolic => parabolic_derivatives(&dx, &s),
        };
        apply_end_conditions(&dx, &s, &mut tmp, left, right);

        let mut adjusted = vec![false; n];
        if monotonic {
            hyman_filter(&dx, &s, &mut tmp, &mut adjusted);
        }

        let mut a = vec![0.0; n - 1];
        let mut b = vec![0.0; n - 1];
        let mut c = vec![0.0; n - 1];
        for i in 0..n - 1 {
            a[i] = tmp[i];
            b[i] = (3.0 * s[i] - tmp[i + 1] - 2.0 * tmp[i]) / dx[i];
            c[i] = (tmp[i + 1] + tmp[i] - 2.0 * s[i]) / (dx[i] * dx[i]);
        }

        let mut primitive_const = vec![0.0; n];
        for i in 1..n {
            let h = dx[i - 1];
            primitive_const[i] = primitive_const[i - 1]
                + h * (nodes.ys[i - 1]
                    + h * (a[i - 1] / 2.0 + h * (b[i - 1] / 3.0 + h * c[i - 1] / 4.0)));
        }

        Ok(Self {
            nodes,
            a,
            b,
            c,
            primitive_const,
            adjusted,
        })
    }

    /// Whether the monotonicity filter changed the derivative at each node.
    pub fn monotonicity_adjustments(&self) -> &[bool] {
        &self.adjusted
    }

    /// Second derivative at x.
    pub fn second_derivative(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let d = x - self.nodes.xs[i];
        2.0 * self.b[i] + 6.0 * self.c[i] * d
    }
}

fn spline_derivatives(
    dx: &[f64],
    s: &[f64],
    left: CubicBoundary,
    right: CubicBoundary,
) -> MathResult<Vec<f64>> {
    let n = s.len() + 1;
    let mut lower = vec![0.0; n - 1];
    let mut diag = vec![0.0; n];
    let mut upper = vec![0.0; n - 1];
    let mut rhs = vec![0.0; n];

    for i in 1..n - 1 {
        lower[i - 1] = dx[i];
        diag[i] = 2.0 * (dx[i] + dx[i - 1]);
        upper[i] = dx[i - 1];
        rhs[i] = 3.0 * (dx[i] * s[i - 1] + dx[i - 1] * s[i]);
    }

    match left {
        CubicBoundary::SecondDerivative(v) => {
            diag[0] = 2.0;
            upper[0] = 1.0;
            rhs[0] = 3.0 * s[0] - v * dx[0] / 2.0;
        }
        CubicBoundary::FirstDerivative(v) => {
            diag[0] = 1.0;
            upper[0] = 0.0;
            rhs[0] = v;
        }
    }
    match right {
        CubicBoundary::SecondDerivative(v) => {
            lower[n - 2] = 1.0;
            diag[n - 1] = 2.0;
            rhs[n - 1] = 3.0 * s[n - 2] + v * dx[n - 2] / 2.0;
        }
        CubicBoundary::FirstDerivative(v) => {
            lower[n - 2] = 0.0;
            diag[n - 1] = 1.0;
            rhs[n - 1] = v;
        }
    }

    solve_tridiagonal(&lower, &diag, &upper, &rhs)
}

/// Second derivative `v` at the first node fixes `tmp[0]` given `tmp[1]`.
fn left_from_second(v: f64, h: f64, s: f64, next: f64) -> f64 {
    (3.0 * s - next - v * h / 2.0) / 2.0
}

/// Second derivative `v` at the last node fixes `tmp[n-1]` given `tmp[n-2]`.
fn right_from_second(v: f64, h: f64, s: f64, prev: f64) -> f64 {
    (3.0 * s - prev + v * h / 2.0) / 2.0
}

fn apply_end_conditions(
    dx: &[f64],
    s: &[f64],
    tmp: &mut [f64],
    left: Option<CubicBoundary>,
    right: Option<CubicBoundary>,
) {
    let n = tmp.len();
    let (h0, s0) = (dx[0], s[0]);
    let (hn, sn) = (dx[n - 2], s[n - 2]);

    // Prescribed slopes first, second derivative ends read their neighbour.
    if let Some(CubicBoundary::FirstDerivative(v)) = left {
        tmp[0] = v;
    }
    if let Some(CubicBoundary::FirstDerivative(v)) = right {
        tmp[n - 1] = v;
    }

    match (left, right) {
        // With a single piece both ends are coupled.
        (Some(CubicBoundary::SecondDerivative(vl)), Some(CubicBoundary::SecondDerivative(vr)))
            if n == 2 =>
        {
            let r0 = 3.0 * s0 - vl * h0 / 2.0;
            let r1 = 3.0 * s0 + vr * h0 / 2.0;
            tmp[0] = (2.0 * r0 - r1) / 3.0;
            tmp[1] = (2.0 * r1 - r0) / 3.0;
        }
        _ => {
            if let Some(CubicBoundary::SecondDerivative(v)) = left {
                tmp[0] = left_from_second(v, h0, s0, tmp[1]);
            }
            if let Some(CubicBoundary::SecondDerivative(v)) = right {
                tmp[n - 1] = right_from_second(v, hn, sn, tmp[n - 2]);
            }
        }
    }
}

fn kruger_derivatives(s: &[f64]) -> Vec<f64> {
    let n = s.len() + 1;
    let mut tmp = vec![0.0; n];
    for i in 1..n - 1 {
        tmp[i] = if s[i - 1] * s[i] <= 0.0 {
            0.0
        } else {
            2.0 / (1.0 / s[i - 1] + 1.0 / s[i])
        };
    }
    tmp[0] = (3.0 * s[0] - tmp[1]) / 2.0;
    tmp[n - 1] = (3.0 * s[n - 2] - tmp[n - 2]) / 2.0;
    tmp
}

fn parabolic_derivatives(dx: &[f64], s: &[f64]) -> Vec<f64> {
    let n = s.len() + 1;
    let mut tmp = vec![0.0; n];
    for i in 1..n - 1 {
        tmp[i] = (dx[i - 1] * s[i] + dx[i] * s[i - 1]) / (dx[i] + dx[i - 1]);
    }
    tmp[0] = ((2.0 * dx[0] + dx[1]) * s[0] - dx[0] * s[1]) / (dx[0] + dx[1]);
    tmp[n - 1] = ((2.0 * dx[n - 2] + dx[n - 3]) * s[n - 2] - dx[n - 2] * s[n - 3])
        / (dx[n - 2] + dx[n - 3]);
    tmp
}

fn clip(value: f64, bound: f64) -> f64 {
    value.signum() * value.abs().min(bound)
}

fn hyman_filter(dx: &[f64], s: &[f64], tmp: &mut [f64], adjusted: &mut [bool]) {
    let n = tmp.len();
    for i in 0..n {
        let correction = if i == 0 {
            if tmp[i] * s[0] > 0.0 {
                clip(tmp[i], (3.0 * s[0]).abs())
            } else {
                0.0
            }
        } else if i == n - 1 {
            if tmp[i] * s[n - 2] > 0.0 {
                clip(tmp[i], (3.0 * s[n - 2]).abs())
            } else {
                0.0
            }
        } else {
            let pm = (s[i - 1] * dx[i] + s[i] * dx[i - 1]) / (dx[i - 1] + dx[i]);
            let mut m = 3.0 * s[i - 1].abs().min(s[i].abs()).min(pm.abs());
            if i > 1 && (s[i - 1] - s[i - 2]) * (s[i] - s[i - 1]) > 0.0 {
                let pd = (s[i - 1] * (2.0 * dx[i - 1] + dx[i - 2]) - s[i - 2] * dx[i - 1])
                    / (dx[i - 2] + dx[i - 1]);
                if pm * pd > 0.0 && pm * (s[i - 1] - s[i - 2]) > 0.0 {
                    m = m.max(1.5 * pm.abs().min(pd.abs()));
                }
            }
            if i < n - 2 && (s[i] - s[i - 1]) * (s[i + 1] - s[i]) > 0.0 {
                let pu = (s[i] * (2.0 * dx[i] + dx[i + 1]) - s[i + 1] * dx[i])
                    / (dx[i] + dx[i + 1]);
                if pm * pu > 0.0 && -pm * (s[i] - s[i - 1]) > 0.0 {
                    m = m.max(1.5 * pm.abs().min(pu.abs()));
                }
            }
            if tmp[i] * pm > 0.0 {
                clip(tmp[i], m)
            } else {
                0.0
            }
        };
        if correction != tmp[i] {
            tmp[i] = correction;
            adjusted[i] = true;
        }
    }
}

impl Interpolator for CubicInterpolator {
    fn interpolate(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let d = x - self.nodes.xs[i];
        self.nodes.ys[i] + d * (self.a[i] + d * (self.b[i] + d * self.c[i]))
    }

    fn derivative(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let d = x - self.nodes.xs[i];
        self.a[i] + (2.0 * self.b[i] + 3.0 * self.c[i] * d) * d
    }

    fn primitive(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let d = x - self.nodes.xs[i];
        self.primitive_const[i]
            + d * (self.nodes.ys[i]
                + d * (self.a[i] / 2.0 + d * (self.b[i] / 3.0 + d * self.c[i] / 4.0)))
    }

    fn min_x(&self) -> f64 {
        self.nodes.min_x()
    }

    fn max_x(&self) -> f64 {
        self.nodes.max_x()
    }
}
