//! C1 piecewise quadratic interpolation.
//!
//! Each piece is `y_i + d_i (x - x_i) + c_i (x - x_i)²`. The derivative at
//! the first node equals the first interval slope; every later piece starts
//! with the end derivative of its predecessor, which makes the curve C1.

use crate::error::MathResult;
use crate::interpolation::{log_values, Interpolator, Nodes};

/// Five-point Gauss-Legendre abscissae on [-1, 1].
const GL_NODES: [f64; 5] = [
    0.0,
    -0.538_469_310_105_683_1,
    0.538_469_310_105_683_1,
    -0.906_179_845_938_664,
    0.906_179_845_938_664,
];

/// Five-point Gauss-Legendre weights.
const GL_WEIGHTS: [f64; 5] = [
    0.568_888_888_888_888_9,
    0.478_628_670_499_366_5,
    0.478_628_670_499_366_5,
    0.236_926_885_056_189_1,
    0.236_926_885_056_189_1,
];

/// C1 piecewise quadratic interpolator.
#[derive(Debug, Clone)]
pub struct QuadraticInterpolator {
    nodes: Nodes,
    d: Vec<f64>,
    c: Vec<f64>,
    primitive_const: Vec<f64>,
}

impl QuadraticInterpolator {
    /// Creates a quadratic interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid nodes.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        let nodes = Nodes::new(xs, ys)?;
        let dx = nodes.dx();
        let s = nodes.slopes();
        let m = s.len();

        let mut d = vec![0.0; m];
        let mut c = vec![0.0; m];
        let mut start = s[0];
        for i in 0..m {
            d[i] = start;
            c[i] = (s[i] - start) / dx[i];
            start = 2.0 * s[i] - start;
        }

        let mut primitive_const = vec![0.0; m + 1];
        for i in 0..m {
            let h = dx[i];
            primitive_const[i + 1] =
                primitive_const[i] + h * (nodes.ys[i] + h * (d[i] / 2.0 + h * c[i] / 3.0));
        }

        Ok(Self {
            nodes,
            d,
            c,
            primitive_const,
        })
    }
}

impl Interpolator for QuadraticInterpolator {
    fn interpolate(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let h = x - self.nodes.xs[i];
        self.nodes.ys[i] + h * (self.d[i] + h * self.c[i])
    }

    fn derivative(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let h = x - self.nodes.xs[i];
        self.d[i] + 2.0 * self.c[i] * h
    }

    fn primitive(&self, x: f64) -> f64 {
        let i = self.nodes.locate(x);
        let h = x - self.nodes.xs[i];
        self.primitive_const[i] + h * (self.nodes.ys[i] + h * (self.d[i] / 2.0 + h * self.c[i] / 3.0))
    }

    fn min_x(&self) -> f64 {
        self.nodes.min_x()
    }

    fn max_x(&self) -> f64 {
        self.nodes.max_x()
    }
}

/// Quadratic interpolation of `ln(y)`; y values must be positive.
#[derive(Debug, Clone)]
pub struct LogQuadraticInterpolator {
    log: QuadraticInterpolator,
    primitive_const: Vec<f64>,
}

impl LogQuadraticInterpolator {
    /// Creates a log-quadratic interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid nodes or non-positive y values.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        let log = QuadraticInterpolator::new(xs, log_values(&ys)?)?;
        let mut interp = Self {
            log,
            primitive_const: Vec::new(),
        };
        let xs = &interp.log.nodes.xs;
        let mut primitive_const = vec![0.0; xs.len()];
        for i in 1..xs.len() {
            primitive_const[i] = primitive_const[i - 1] + interp.area(xs[i - 1], xs[i]);
        }
        interp.primitive_const = primitive_const;
        Ok(interp)
    }

    fn area(&self, a: f64, b: f64) -> f64 {
        let mid = 0.5 * (a + b);
        let half = 0.5 * (b - a);
        GL_NODES
            .iter()
            .zip(GL_WEIGHTS)
            .map(|(z, w)| w * self.interpolate(mid + half * z))
            .sum::<f64>()
            * half
    }
}

impl Interpolator for LogQuadraticInterpolator {
    fn interpolate(&self, x: f64) -> f64 {
        self.log.interpolate(x).exp()
    }

    fn derivative(&self, x: f64) -> f64 {
        self.interpolate(x) * self.log.derivative(x)
    }

    fn primitive(&self, x: f64) -> f64 {
        let i = self.log.nodes.locate(x);
        self.primitive_const[i] + self.area(self.log.nodes.xs[i], x)
    }

    fn min_x(&self) -> f64 {
        self.log.min_x()
    }

    fn max_x(&self) -> f64 {
        self.log.max_x()
    }
}
