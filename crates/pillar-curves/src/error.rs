//! Error types for curve construction.
//!
//! Every fatal condition met while building a curve maps to one of the
//! variants below. The facade catches whatever a build raises and re-raises
//! it once as [`CurveError::BuildFailure`], keeping the original text.

use pillar_core::{CoreError, Date};
use pillar_math::MathError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve construction.
#[derive(Error, Debug, Clone)]
pub enum CurveError {
    /// Missing or invalid configuration.
    #[error("{message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A convention exists but belongs to a different instrument family.
    #[error("Conventions ID does not give {family} conventions.")]
    ConventionTypeMismatch {
        /// Convention ID that was looked up.
        id: String,
        /// Family the caller expected, in words.
        family: &'static str,
    },

    /// A curve this build depends on is not in the pool.
    #[error("{message}")]
    DependencyNotFound {
        /// Name or ID of the missing curve.
        missing: String,
        /// Full diagnostic text.
        message: String,
    },

    /// Inconsistent or unusable market data.
    #[error("{message}")]
    Data {
        /// Description of the problem.
        message: String,
    },

    /// A present quote carries the wrong instrument or quote type.
    #[error("Market quote {key} not of type {expected}.")]
    QuoteTypeMismatch {
        /// Key of the offending quote.
        key: String,
        /// Expected type, in words.
        expected: String,
    },

    /// No usable quotes were found.
    #[error("{message}")]
    EmptyCurveData {
        /// Description naming the curve and date.
        message: String,
    },

    /// Bootstrap or fit missed its tolerance.
    #[error("{message}")]
    Convergence {
        /// Description of the failure.
        message: String,
    },

    /// Evaluation outside the curve domain, or an unusable interpolation setup.
    #[error("Interpolation error: {reason}")]
    Interpolation {
        /// Description of the error.
        reason: String,
    },

    /// A string could not be decoded.
    #[error("Cannot parse {what} from '{input}'")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// The rejected input.
        input: String,
    },

    /// Reading a file failed.
    #[error("Cannot read {path}: {reason}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error text.
        reason: String,
    },

    /// Numerical error from the math layer.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Date or convention error from the core layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Terminal error raised by the facade for any failed build.
    #[error("yield curve building failed for curve {curve} on date {as_of}: {message}")]
    BuildFailure {
        /// Curve configuration ID.
        curve: String,
        /// As-of date of the build.
        as_of: Date,
        /// Message of the underlying error.
        message: String,
    },
}

impl CurveError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a data error.
    #[must_use]
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Creates a dependency error.
    #[must_use]
    pub fn dependency(missing: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DependencyNotFound {
            missing: missing.into(),
            message: message.into(),
        }
    }

    /// Creates a quote type mismatch error.
    #[must_use]
    pub fn quote_type(key: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::QuoteTypeMismatch {
            key: key.into(),
            expected: expected.into(),
        }
    }

    /// Creates an empty data error.
    #[must_use]
    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyCurveData {
            message: message.into(),
        }
    }

    /// Creates a convergence error.
    #[must_use]
    pub fn convergence(message: impl Into<String>) -> Self {
        Self::Convergence {
            message: message.into(),
        }
    }

    /// Creates an interpolation error.
    #[must_use]
    pub fn interpolation(reason: impl Into<String>) -> Self {
        Self::Interpolation {
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(what: &'static str, input: impl Into<String>) -> Self {
        Self::Parse {
            what,
            input: input.into(),
        }
    }

    /// Creates a "No conventions found" configuration error.
    #[must_use]
    pub fn missing_convention(id: &str) -> Self {
        Self::configuration(format!("No conventions found with ID: {id}"))
    }

    /// Wraps this error as the terminal build failure of a curve.
    ///
    /// A build failure is not wrapped twice.
    #[must_use]
    pub fn into_build_failure(self, curve: &str, as_of: Date) -> Self {
        match self {
            e @ Self::BuildFailure { .. } => e,
            other => Self::BuildFailure {
                curve: curve.to_string(),
                as_of,
                message: other.to_string(),
            },
        }
    }

    /// Returns true for the terminal build failure.
    #[must_use]
    pub fn is_build_failure(&self) -> bool {
        matches!(self, Self::BuildFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failure_message() {
        let as_of = Date::from_ymd(2024, 1, 15).unwrap();
        let err = CurveError::data("boom").into_build_failure("EUR-EONIA", as_of);
        assert_eq!(
            err.to_string(),
            "yield curve building failed for curve EUR-EONIA on date 2024-01-15: boom"
        );
        let again = err.clone().into_build_failure("other", as_of);
        assert_eq!(again.to_string(), err.to_string());
    }

    #[test]
    fn test_convention_mismatch_text() {
        let err = CurveError::ConventionTypeMismatch {
            id: "EUR-DEP".into(),
            family: "deposit rate",
        };
        assert_eq!(err.to_string(), "Conventions ID does not give deposit rate conventions.");
    }

    #[test]
    fn test_core_error_converts() {
        let core = CoreError::invalid_period("7X");
        let err: CurveError = core.into();
        assert!(matches!(err, CurveError::Core(_)));
    }
}
