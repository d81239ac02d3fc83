//! Business day adjustment conventions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Calendar;
use crate::error::CoreError;
use crate::types::Date;

/// How a date falling on a non-business day is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum BusinessDayConvention {
    /// Keep the date even if it is a holiday.
    Unadjusted,

    /// Next business day.
    #[default]
    Following,

    /// Next business day unless that crosses into the next month, in which
    /// case the preceding business day.
    ModifiedFollowing,

    /// Preceding business day.
    Preceding,

    /// Preceding business day unless that crosses into the previous month,
    /// in which case the following business day.
    ModifiedPreceding,

    /// Closest business day, following on ties.
    Nearest,
}

impl fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "ModifiedFollowing",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::ModifiedPreceding => "ModifiedPreceding",
            BusinessDayConvention::Nearest => "Nearest",
        };
        f.write_str(name)
    }
}

impl FromStr for BusinessDayConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace([' ', '_'], "").as_str() {
            "U" | "UNADJUSTED" | "NONE" => Ok(BusinessDayConvention::Unadjusted),
            "F" | "FOL" | "FOLLOWING" => Ok(BusinessDayConvention::Following),
            "MF" | "MODFOL" | "MODIFIEDFOLLOWING" => {
                Ok(BusinessDayConvention::ModifiedFollowing)
            }
            "P" | "PRE" | "PRECEDING" => Ok(BusinessDayConvention::Preceding),
            "MP" | "MODPRE" | "MODIFIEDPRECEDING" => Ok(BusinessDayConvention::ModifiedPreceding),
            "NEAREST" | "NR" => Ok(BusinessDayConvention::Nearest),
            _ => Err(CoreError::parse("business day convention", s)),
        }
    }
}

impl TryFrom<String> for BusinessDayConvention {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BusinessDayConvention> for String {
    fn from(value: BusinessDayConvention) -> Self {
        value.to_string()
    }
}

/// Adjusts a date according to the given business day convention.
pub fn adjust<C: Calendar + ?Sized>(date: Date, convention: BusinessDayConvention, calendar: &C) -> Date {
    if convention == BusinessDayConvention::Unadjusted || calendar.is_business_day(date) {
        return date;
    }

    match convention {
        BusinessDayConvention::Unadjusted => date,
        BusinessDayConvention::Following => following(date, calendar),
        BusinessDayConvention::ModifiedFollowing => {
            let adjusted = following(date, calendar);
            if adjusted.month() == date.month() {
                adjusted
            } else {
                preceding(date, calendar)
            }
        }
        BusinessDayConvention::Preceding => preceding(date, calendar),
        BusinessDayConvention::ModifiedPreceding => {
            let adjusted = preceding(date, calendar);
            if adjusted.month() == date.month() {
                adjusted
            } else {
                following(date, calendar)
            }
        }
        BusinessDayConvention::Nearest => {
            let fwd = following(date, calendar);
            let back = preceding(date, calendar);
            if date.days_between(&fwd) <= back.days_between(&date) {
                fwd
            } else {
                back
            }
        }
    }
}

fn following<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(1);
    }
    date
}

fn preceding<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(-1);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::WeekendsOnly;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_following_and_preceding() {
        let saturday = d(2025, 1, 4);
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Following, &WeekendsOnly),
            d(2025, 1, 6)
        );
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Preceding, &WeekendsOnly),
            d(2025, 1, 3)
        );
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Unadjusted, &WeekendsOnly),
            saturday
        );
    }

    #[test]
    fn test_modified_following_stays_in_month() {
        // 2025-05-31 is a Saturday
        let adjusted = adjust(d(2025, 5, 31), BusinessDayConvention::ModifiedFollowing, &WeekendsOnly);
        assert_eq!(adjusted, d(2025, 5, 30));
    }

    #[test]
    fn test_modified_preceding_stays_in_month() {
        // 2025-06-01 is a Sunday
        let adjusted = adjust(d(2025, 6, 1), BusinessDayConvention::ModifiedPreceding, &WeekendsOnly);
        assert_eq!(adjusted, d(2025, 6, 2));
    }

    #[test]
    fn test_parse_short_codes() {
        assert_eq!(
            "MF".parse::<BusinessDayConvention>().unwrap(),
            BusinessDayConvention::ModifiedFollowing
        );
        assert_eq!(
            "Modified Following".parse::<BusinessDayConvention>().unwrap(),
            BusinessDayConvention::ModifiedFollowing
        );
        assert_eq!(
            "U".parse::<BusinessDayConvention>().unwrap(),
            BusinessDayConvention::Unadjusted
        );
        assert!("Sideways".parse::<BusinessDayConvention>().is_err());
    }
}
