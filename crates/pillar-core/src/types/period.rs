//! Tenor periods such as `3M`, `10Y` or `1Y6M`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use crate::error::CoreError;

/// Unit of a [`Period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Calendar (or business, depending on context) days.
    Days,
    /// Weeks of seven days.
    Weeks,
    /// Calendar months.
    Months,
    /// Calendar years.
    Years,
}

impl TimeUnit {
    fn suffix(self) -> char {
        match self {
            TimeUnit::Days => 'D',
            TimeUnit::Weeks => 'W',
            TimeUnit::Months => 'M',
            TimeUnit::Years => 'Y',
        }
    }
}

/// A signed length of time in a single unit.
///
/// Composite strings are normalised on parse: `1Y6M` becomes `18M` and
/// `1W2D` becomes `9D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    length: i32,
    unit: TimeUnit,
}

impl Period {
    /// Creates a period.
    #[must_use]
    pub const fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// Shorthand for a number of days.
    #[must_use]
    pub const fn days(n: i32) -> Self {
        Self::new(n, TimeUnit::Days)
    }

    /// Shorthand for a number of weeks.
    #[must_use]
    pub const fn weeks(n: i32) -> Self {
        Self::new(n, TimeUnit::Weeks)
    }

    /// Shorthand for a number of months.
    #[must_use]
    pub const fn months(n: i32) -> Self {
        Self::new(n, TimeUnit::Months)
    }

    /// Shorthand for a number of years.
    #[must_use]
    pub const fn years(n: i32) -> Self {
        Self::new(n, TimeUnit::Years)
    }

    /// Returns the signed length.
    #[must_use]
    pub const fn length(&self) -> i32 {
        self.length
    }

    /// Returns the unit.
    #[must_use]
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Returns true for a zero-length period.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.length == 0
    }

    /// Length in months for month/year periods.
    #[must_use]
    pub fn total_months(&self) -> Option<i32> {
        match self.unit {
            TimeUnit::Months => Some(self.length),
            TimeUnit::Years => Some(12 * self.length),
            _ => None,
        }
    }

    /// Approximate length in years, used for ordering and for period-based year fractions.
    #[must_use]
    pub fn years_approx(&self) -> f64 {
        let n = f64::from(self.length);
        match self.unit {
            TimeUnit::Days => n / 365.0,
            TimeUnit::Weeks => 7.0 * n / 365.0,
            TimeUnit::Months => n / 12.0,
            TimeUnit::Years => n,
        }
    }

    /// Compact display that folds whole years, e.g. `12M` renders as `1Y`.
    #[must_use]
    pub fn short_name(&self) -> String {
        match self.unit {
            TimeUnit::Months if self.length != 0 && self.length % 12 == 0 => {
                format!("{}Y", self.length / 12)
            }
            TimeUnit::Days if self.length != 0 && self.length % 7 == 0 => {
                format!("{}W", self.length / 7)
            }
            _ => self.to_string(),
        }
    }
}

impl Neg for Period {
    type Output = Period;

    fn neg(self) -> Self::Output {
        Period::new(-self.length, self.unit)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length, self.unit.suffix())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_uppercase();
        if input.is_empty() {
            return Err(CoreError::invalid_period(s));
        }

        let mut parts: Vec<(i32, TimeUnit)> = Vec::new();
        let mut digits = String::new();
        for ch in input.chars() {
            if ch.is_ascii_digit() || (ch == '-' && digits.is_empty()) {
                digits.push(ch);
                continue;
            }
            let unit = match ch {
                'D' => TimeUnit::Days,
                'W' => TimeUnit::Weeks,
                'M' => TimeUnit::Months,
                'Y' => TimeUnit::Years,
                _ => return Err(CoreError::invalid_period(s)),
            };
            let n: i32 = digits.parse().map_err(|_| CoreError::invalid_period(s))?;
            parts.push((n, unit));
            digits.clear();
        }
        if !digits.is_empty() || parts.is_empty() {
            return Err(CoreError::invalid_period(s));
        }

        if let [(n, unit)] = parts.as_slice() {
            return Ok(Period::new(*n, *unit));
        }

        let day_based = parts
            .iter()
            .all(|(_, u)| matches!(u, TimeUnit::Days | TimeUnit::Weeks));
        let month_based = parts
            .iter()
            .all(|(_, u)| matches!(u, TimeUnit::Months | TimeUnit::Years));
        if day_based {
            let days = parts
                .iter()
                .map(|(n, u)| if *u == TimeUnit::Weeks { 7 * n } else { *n })
                .sum();
            Ok(Period::days(days))
        } else if month_based {
            let months = parts
                .iter()
                .map(|(n, u)| if *u == TimeUnit::Years { 12 * n } else { *n })
                .sum();
            Ok(Period::months(months))
        } else {
            Err(CoreError::invalid_period(s))
        }
    }
}

impl TryFrom<String> for Period {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}
