//! Errors raised by the numerical routines.

use thiserror::Error;

/// Result alias for pillar-math routines.
pub type MathResult<T> = Result<T, MathError>;

/// Failures of solvers, interpolators, optimisers and linear solves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// An iterative routine ran out of iterations.
    #[error("No convergence within {iterations} iterations (residual {residual:.2e})")]
    ConvergenceFailed {
        /// Iterations performed.
        iterations: u32,
        /// Residual at the last iterate.
        residual: f64,
    },

    /// The root finder was given endpoints with function values of equal sign.
    #[error("Root not bracketed: f({a}) = {fa:.2e}, f({b}) = {fb:.2e}")]
    InvalidBracket {
        /// Left endpoint.
        a: f64,
        /// Right endpoint.
        b: f64,
        /// Value at the left endpoint.
        fa: f64,
        /// Value at the right endpoint.
        fb: f64,
    },

    /// A linear system has no unique solution.
    #[error("Singular system")]
    SingularMatrix,

    /// A vector does not have the length the routine expects.
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// Too few points for the routine.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum number of points.
        required: usize,
        /// Points supplied.
        actual: usize,
    },

    /// Any other rejected argument.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What was wrong.
        reason: String,
    },
}

impl MathError {
    /// Creates a convergence failed error.
    #[must_use]
    pub fn convergence_failed(iterations: u32, residual: f64) -> Self {
        Self::ConvergenceFailed {
            iterations,
            residual,
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Creates a length mismatch error.
    #[must_use]
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::convergence_failed(100, 1e-6);
        assert!(err.to_string().contains("100 iterations"));

        let err = MathError::insufficient_data(2, 1);
        assert_eq!(err.to_string(), "Insufficient data: need at least 2, got 1");

        let err = MathError::length_mismatch(3, 2);
        assert_eq!(err.to_string(), "Length mismatch: expected 3, got 2");
    }
}
