//! Frequency and compounding types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::period::Period;
use crate::error::CoreError;

/// Payment or compounding frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// Single payment at maturity.
    Once,
    /// Once a year.
    #[default]
    Annual,
    /// Twice a year.
    Semiannual,
    /// Every four months.
    EveryFourthMonth,
    /// Four times a year.
    Quarterly,
    /// Every two months.
    Bimonthly,
    /// Twelve times a year.
    Monthly,
    /// Every four weeks.
    EveryFourthWeek,
    /// Every two weeks.
    Biweekly,
    /// Every week.
    Weekly,
    /// Every day.
    Daily,
}

impl Frequency {
    /// Number of periods per year, `None` for `Once`.
    #[must_use]
    pub fn periods_per_year(&self) -> Option<u32> {
        match self {
            Frequency::Once => None,
            Frequency::Annual => Some(1),
            Frequency::Semiannual => Some(2),
            Frequency::EveryFourthMonth => Some(3),
            Frequency::Quarterly => Some(4),
            Frequency::Bimonthly => Some(6),
            Frequency::Monthly => Some(12),
            Frequency::EveryFourthWeek => Some(13),
            Frequency::Biweekly => Some(26),
            Frequency::Weekly => Some(52),
            Frequency::Daily => Some(365),
        }
    }

    /// The tenor of one period, `None` for `Once`.
    #[must_use]
    pub fn to_period(&self) -> Option<Period> {
        match self {
            Frequency::Once => None,
            Frequency::Annual => Some(Period::years(1)),
            Frequency::Semiannual => Some(Period::months(6)),
            Frequency::EveryFourthMonth => Some(Period::months(4)),
            Frequency::Quarterly => Some(Period::months(3)),
            Frequency::Bimonthly => Some(Period::months(2)),
            Frequency::Monthly => Some(Period::months(1)),
            Frequency::EveryFourthWeek => Some(Period::weeks(4)),
            Frequency::Biweekly => Some(Period::weeks(2)),
            Frequency::Weekly => Some(Period::weeks(1)),
            Frequency::Daily => Some(Period::days(1)),
        }
    }

    /// Maps a tenor back to a frequency, if it is one of the standard ones.
    #[must_use]
    pub fn from_period(period: Period) -> Option<Self> {
        if let Some(months) = period.total_months() {
            return match months {
                12 => Some(Frequency::Annual),
                6 => Some(Frequency::Semiannual),
                4 => Some(Frequency::EveryFourthMonth),
                3 => Some(Frequency::Quarterly),
                2 => Some(Frequency::Bimonthly),
                1 => Some(Frequency::Monthly),
                _ => None,
            };
        }
        let days = match period.unit() {
            super::TimeUnit::Weeks => 7 * period.length(),
            _ => period.length(),
        };
        match days {
            28 => Some(Frequency::EveryFourthWeek),
            14 => Some(Frequency::Biweekly),
            7 => Some(Frequency::Weekly),
            1 => Some(Frequency::Daily),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Frequency::Once => "Once",
            Frequency::Annual => "Annual",
            Frequency::Semiannual => "Semiannual",
            Frequency::EveryFourthMonth => "EveryFourthMonth",
            Frequency::Quarterly => "Quarterly",
            Frequency::Bimonthly => "Bimonthly",
            Frequency::Monthly => "Monthly",
            Frequency::EveryFourthWeek => "EveryFourthWeek",
            Frequency::Biweekly => "Biweekly",
            Frequency::Weekly => "Weekly",
            Frequency::Daily => "Daily",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Z" | "ONCE" | "ZERO" => Ok(Frequency::Once),
            "A" | "ANNUAL" | "1Y" => Ok(Frequency::Annual),
            "S" | "SEMIANNUAL" | "SEMI-ANNUAL" | "6M" => Ok(Frequency::Semiannual),
            "EVERYFOURTHMONTH" | "4M" => Ok(Frequency::EveryFourthMonth),
            "Q" | "QUARTERLY" | "3M" => Ok(Frequency::Quarterly),
            "B" | "BIMONTHLY" | "2M" => Ok(Frequency::Bimonthly),
            "M" | "MONTHLY" | "1M" => Ok(Frequency::Monthly),
            "L" | "EVERYFOURTHWEEK" | "4W" => Ok(Frequency::EveryFourthWeek),
            "BIWEEKLY" | "2W" => Ok(Frequency::Biweekly),
            "W" | "WEEKLY" | "1W" => Ok(Frequency::Weekly),
            "D" | "DAILY" | "1D" => Ok(Frequency::Daily),
            _ => Err(CoreError::parse("frequency", s)),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.name().to_string()
    }
}

/// Interest compounding convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Compounding {
    /// `1 + r t`
    Simple,
    /// `(1 + r / f)^(f t)`
    Compounded,
    /// `exp(r t)`
    #[default]
    Continuous,
    /// Simple up to one period, compounded beyond.
    SimpleThenCompounded,
}

impl fmt::Display for Compounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compounding::Simple => "Simple",
            Compounding::Compounded => "Compounded",
            Compounding::Continuous => "Continuous",
            Compounding::SimpleThenCompounded => "SimpleThenCompounded",
        };
        f.write_str(name)
    }
}

impl FromStr for Compounding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Simple" => Ok(Compounding::Simple),
            "Compounded" => Ok(Compounding::Compounded),
            "Continuous" => Ok(Compounding::Continuous),
            "SimpleThenCompounded" => Ok(Compounding::SimpleThenCompounded),
            _ => Err(CoreError::parse("compounding", s)),
        }
    }
}

impl TryFrom<String> for Compounding {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Compounding> for String {
    fn from(value: Compounding) -> Self {
        value.to_string()
    }
}
