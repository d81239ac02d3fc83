//! Root-finding algorithms.
//!
//! The curve engine solves one unknown per pillar, always inside a bracket
//! it widens itself, so a single bracketing solver covers every use:
//!
//! - [`brent`]: inverse quadratic interpolation with bisection fallback
//!
//! # Example
//!
//! ```rust
//! use pillar_math::solvers::{brent, SolverConfig};
//!
//! // Discount factor that reprices a one-year 5% simple deposit
//! let f = |df: f64| (1.0 / df - 1.0) - 0.05;
//! let result = brent(f, 0.5, 1.0, &SolverConfig::default()).unwrap();
//! assert!((result.root - 1.0 / 1.05).abs() < 1e-10);
//! ```

mod brent;

pub use brent::brent;

/// Default tolerance for root-finding algorithms.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default maximum iterations for root-finding algorithms.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Configuration for root-finding algorithms.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Accuracy on the root (half-width of the final bracket).
    pub tolerance: f64,
    /// Maximum number of function evaluations after the endpoints.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

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
}

/// Result of a root-finding operation.
#[derive(Debug, Clone, Copy)]
pub struct SolverResult {
    /// The root found.
    pub root: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Function value at the root.
    pub residual: f64,
}
