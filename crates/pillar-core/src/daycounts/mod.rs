//! Day count conventions.
//!
//! Day counts turn a pair of dates into an accrual year fraction. Curve
//! times, zero-rate quotes and every helper leg are measured with one of
//! these conventions.
//!
//! # Supported Conventions
//!
//! - [`Act360`]: Actual/360, money markets and most floating legs
//! - [`Act365Fixed`]: Actual/365 (Fixed), GBP markets and curve time
//! - [`ActActIsda`]: Actual/Actual (ISDA), bond yields
//! - [`Thirty360US`]: 30/360 (US bond basis), USD fixed legs
//! - [`Thirty360E`]: 30E/360 (Eurobond basis), EUR fixed legs
//!
//! # Usage
//!
//! ```rust
//! use pillar_core::daycounts::{DayCount, DayCountConvention};
//! use pillar_core::types::Date;
//!
//! let dc: DayCountConvention = "A360".parse().unwrap();
//! let start = Date::from_ymd(2025, 1, 1).unwrap();
//! let end = Date::from_ymd(2025, 4, 1).unwrap();
//! assert_eq!(dc.year_fraction_f64(start, end), 0.25);
//! ```

mod act360;
mod act365;
mod actact;
mod thirty360;

pub use act360::Act360;
pub use act365::Act365Fixed;
pub use actact::ActActIsda;
pub use thirty360::{Thirty360E, Thirty360US};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Date;

/// Trait for day count conventions.
///
/// Year fractions are signed: `year_fraction(a, b) == -year_fraction(b, a)`.
pub trait DayCount: Send + Sync {
    /// Returns the name of the day count convention.
    fn name(&self) -> &'static str;

    /// Calculates the year fraction between two dates.
    fn year_fraction(&self, start: Date, end: Date) -> Decimal;

    /// Calculates the day count between two dates.
    fn day_count(&self, start: Date, end: Date) -> i64;

    /// Year fraction as `f64`, the form curve arithmetic works in.
    fn year_fraction_f64(&self, start: Date, end: Date) -> f64 {
        self.year_fraction(start, end).to_f64().unwrap_or(0.0)
    }
}

/// Runtime-selectable day count convention.
///
/// Parsed from the usual market spellings (`A360`, `ACT/365`, `30/360`,
/// `ActActISDA`, ...) and serialised by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayCountConvention {
    /// Actual/360
    Act360,
    /// Actual/365 (Fixed)
    Act365Fixed,
    /// Actual/Actual (ISDA)
    ActActIsda,
    /// 30/360 (US)
    Thirty360US,
    /// 30E/360
    Thirty360E,
}

impl DayCountConvention {
    fn inner(self) -> &'static dyn DayCount {
        match self {
            DayCountConvention::Act360 => &Act360,
            DayCountConvention::Act365Fixed => &Act365Fixed,
            DayCountConvention::ActActIsda => &ActActIsda,
            DayCountConvention::Thirty360US => &Thirty360US,
            DayCountConvention::Thirty360E => &Thirty360E,
        }
    }

    /// Returns all available day count conventions.
    #[must_use]
    pub fn all() -> &'static [DayCountConvention] {
        &[
            DayCountConvention::Act360,
            DayCountConvention::Act365Fixed,
            DayCountConvention::ActActIsda,
            DayCountConvention::Thirty360US,
            DayCountConvention::Thirty360E,
        ]
    }
}

impl DayCount for DayCountConvention {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        self.inner().year_fraction(start, end)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        self.inner().day_count(start, end)
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayCountConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        match normalized.as_str() {
            "A360" | "ACT/360" | "ACTUAL/360" | "ACT360" => Ok(DayCountConvention::Act360),
            "A365" | "A365F" | "ACT/365" | "ACT/365F" | "ACT/365 (FIXED)" | "ACTUAL/365"
            | "ACTUAL/365 (FIXED)" | "ACT365" => Ok(DayCountConvention::Act365Fixed),
            "ACTACT" | "ACT/ACT" | "ACTACTISDA" | "ACT/ACT (ISDA)" | "ACTUAL/ACTUAL"
            | "ACTUAL/ACTUAL (ISDA)" => Ok(DayCountConvention::ActActIsda),
            "30/360" | "30/360 (US)" | "30U/360" | "BOND BASIS" | "30/360 US" => {
                Ok(DayCountConvention::Thirty360US)
            }
            "30E/360" | "30E/360 (EUROBOND BASIS)" | "EUROBOND BASIS" | "30/360 (EUROBOND)" => {
                Ok(DayCountConvention::Thirty360E)
            }
            _ => Err(CoreError::UnknownDayCount {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DayCountConvention {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayCountConvention> for String {
    fn from(value: DayCountConvention) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_aliases() {
        assert_eq!(
            "ACT/360".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::Act360
        );
        assert_eq!(
            "a365".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::Act365Fixed
        );
        assert_eq!(
            "ActActISDA".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::ActActIsda
        );
        assert_eq!(
            "30E/360".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::Thirty360E
        );
        assert!("ACT/252".parse::<DayCountConvention>().is_err());
    }

    #[test]
    fn test_name_round_trip() {
        for dc in DayCountConvention::all() {
            assert_eq!(dc.name().parse::<DayCountConvention>().unwrap(), *dc);
        }
    }

    #[test]
    fn test_half_year_everywhere() {
        for dc in DayCountConvention::all() {
            let yf = dc.year_fraction_f64(d(2025, 1, 1), d(2025, 7, 1));
            assert!(yf > 0.4 && yf < 0.6, "{dc}: {yf}");
        }
    }

    #[test]
    fn test_reversed_dates_are_negative() {
        for dc in DayCountConvention::all() {
            let fwd = dc.year_fraction_f64(d(2024, 3, 15), d(2026, 9, 30));
            let back = dc.year_fraction_f64(d(2026, 9, 30), d(2024, 3, 15));
            assert_relative_eq!(fwd, -back, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_serde_by_name() {
        let json = serde_json::to_string(&DayCountConvention::Act360).unwrap();
        assert_eq!(json, "\"Actual/360\"");
        let back: DayCountConvention = serde_json::from_str("\"A365F\"").unwrap();
        assert_eq!(back, DayCountConvention::Act365Fixed);
    }
}
