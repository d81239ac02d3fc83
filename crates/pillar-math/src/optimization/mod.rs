//! Optimization algorithms.
//!
//! Used by parametric curve fitting:
//!
//! - [`nelder_mead`]: derivative-free simplex search on a scalar cost
//! - [`levenberg_marquardt`]: damped Gauss-Newton on a residual vector

mod levenberg_marquardt;
mod simplex;

pub use levenberg_marquardt::levenberg_marquardt;
pub use simplex::nelder_mead;

/// Configuration for optimization algorithms.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationConfig {
    /// Tolerance for convergence.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
    /// Size of the initial simplex, or the finite-difference step for
    /// numerical Jacobians.
    pub initial_step: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 1000,
            initial_step: 0.01,
        }
    }
}

impl OptimizationConfig {
    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the initial step.
    #[must_use]
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Optimal parameters found.
    pub parameters: Vec<f64>,
    /// Final objective function value.
    pub objective_value: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Whether the optimization converged.
    pub converged: bool,
}

/// Maps NaN and infinite costs to `+inf` so they lose every comparison.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}
