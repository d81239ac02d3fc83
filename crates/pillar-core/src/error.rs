//! Error types for the core date and convention layer.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The error type for date, period and convention handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A period string could not be parsed.
    #[error("Invalid period: '{input}'")]
    InvalidPeriod {
        /// The rejected input.
        input: String,
    },

    /// Unknown day count convention name.
    #[error("Unknown day count convention: '{name}'")]
    UnknownDayCount {
        /// The rejected name.
        name: String,
    },

    /// Unknown calendar name.
    #[error("Unknown calendar: '{name}'")]
    UnknownCalendar {
        /// The rejected name.
        name: String,
    },

    /// Unknown or malformed currency code.
    #[error("Unknown currency code: '{code}'")]
    UnknownCurrency {
        /// The rejected code.
        code: String,
    },

    /// Schedule generation failed.
    #[error("Schedule error: {reason}")]
    Schedule {
        /// Description of the failure.
        reason: String,
    },

    /// Generic parse failure for enumerated conventions.
    #[error("Cannot parse {what} from '{input}'")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// The rejected input.
        input: String,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid period error.
    #[must_use]
    pub fn invalid_period(input: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            input: input.into(),
        }
    }

    /// Creates a schedule error.
    #[must_use]
    pub fn schedule(reason: impl Into<String>) -> Self {
        Self::Schedule {
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
}
