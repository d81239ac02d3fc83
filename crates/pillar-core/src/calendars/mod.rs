//! Business day calendars and conventions.
//!
//! This module provides:
//! - The [`Calendar`] trait with adjustment and tenor arithmetic
//! - Rule-based market calendars backed by a holiday bitmap
//! - [`CalendarId`], the serialisable calendar name used in conventions

mod bitmap;
mod brazil;
mod conventions;
mod target;
mod united_kingdom;
mod united_states;

pub use bitmap::{easter_sunday, HolidayBitmap, HolidayCalendarBuilder};
pub use brazil::BrazilCalendar;
pub use conventions::{adjust, BusinessDayConvention};
pub use target::TargetCalendar;
pub use united_kingdom::UnitedKingdomCalendar;
pub use united_states::UnitedStatesCalendar;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::types::{Date, Period, TimeUnit};

/// Trait for business day calendars.
pub trait Calendar: Send + Sync {
    /// Returns the name of the calendar.
    fn name(&self) -> &'static str;

    /// Returns true if the date is a business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Returns true if the date is a weekend day or holiday.
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Adjusts a date according to the given business day convention.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> Date {
        conventions::adjust(date, convention, self)
    }

    /// Moves `days` business days forward (or backward when negative).
    ///
    /// Zero days returns the date rolled to the following business day.
    fn advance_business_days(&self, date: Date, days: i32) -> Date {
        if days == 0 {
            return self.adjust(date, BusinessDayConvention::Following);
        }
        let step: i64 = if days > 0 { 1 } else { -1 };
        let mut result = date;
        let mut remaining = days.unsigned_abs();
        while remaining > 0 {
            result = result.add_days(step);
            while !self.is_business_day(result) {
                result = result.add_days(step);
            }
            remaining -= 1;
        }
        result
    }

    /// Advances a date by a tenor.
    ///
    /// Day tenors count business days. Week, month and year tenors move in
    /// calendar time and are then adjusted with `convention`; with
    /// `end_of_month` set, a start on the last business day of its month
    /// lands on the last business day of the target month.
    fn advance(
        &self,
        date: Date,
        period: Period,
        convention: BusinessDayConvention,
        end_of_month: bool,
    ) -> CoreResult<Date> {
        if period.is_zero() {
            return Ok(self.adjust(date, convention));
        }
        if period.unit() == TimeUnit::Days {
            return Ok(self.advance_business_days(date, period.length()));
        }
        let shifted = date.add_period(period, false)?;
        if end_of_month
            && period.unit() != TimeUnit::Weeks
            && self.is_end_of_month(date)
        {
            return Ok(self.end_of_month(shifted));
        }
        Ok(self.adjust(shifted, convention))
    }

    /// True if `date` is the last business day of its month.
    fn is_end_of_month(&self, date: Date) -> bool {
        let next = self.adjust(date.add_days(1), BusinessDayConvention::Following);
        next.month() != date.month()
    }

    /// Last business day of the date's month.
    fn end_of_month(&self, date: Date) -> Date {
        self.adjust(date.end_of_month(), BusinessDayConvention::Preceding)
    }

    /// Business days in `[start, end)`, negative when `end < start`.
    fn business_days_between(&self, start: Date, end: Date) -> i64 {
        if end < start {
            return -self.business_days_between(end, start);
        }
        let mut count = 0;
        let mut current = start;
        while current < end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current.add_days(1);
        }
        count
    }
}

/// Calendar whose only holidays are Saturdays and Sundays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendsOnly;

impl Calendar for WeekendsOnly {
    fn name(&self) -> &'static str {
        "WeekendsOnly"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend()
    }
}

/// Calendar on which every day is a business day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCalendar;

impl Calendar for NullCalendar {
    fn name(&self) -> &'static str {
        "NullCalendar"
    }

    fn is_business_day(&self, _date: Date) -> bool {
        true
    }
}

/// Calendar named in a convention or configuration.
///
/// Parsed from the market or currency name (`TARGET`, `EUR`, `US`, `UK`,
/// `BRL`, ...). A comma separated list parses to a joint calendar whose
/// holidays are the union of its members'.
///
/// # Example
///
/// ```rust
/// use pillar_core::calendars::{Calendar, CalendarId};
/// use pillar_core::types::Date;
///
/// let cal: CalendarId = "TARGET,UK".parse().unwrap();
/// // Easter Monday 2025 closes both
/// assert!(!cal.is_business_day(Date::from_ymd(2025, 4, 21).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum CalendarId {
    /// TARGET (euro).
    Target,
    /// US settlement.
    UnitedStates,
    /// UK settlement.
    UnitedKingdom,
    /// Brazil.
    Brazil,
    /// Saturday/Sunday only.
    #[default]
    WeekendsOnly,
    /// No holidays at all.
    NullCalendar,
    /// Union of holidays of several calendars.
    Joint(Vec<CalendarId>),
}

impl CalendarId {
    fn as_calendar(&self) -> &dyn Calendar {
        match self {
            CalendarId::Target => TargetCalendar::global(),
            CalendarId::UnitedStates => UnitedStatesCalendar::global(),
            CalendarId::UnitedKingdom => UnitedKingdomCalendar::global(),
            CalendarId::Brazil => BrazilCalendar::global(),
            CalendarId::WeekendsOnly => &WeekendsOnly,
            CalendarId::NullCalendar | CalendarId::Joint(_) => &NullCalendar,
        }
    }

    fn parse_single(name: &str) -> CoreResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "TARGET" | "TARGET2" | "EUR" => Ok(CalendarId::Target),
            "US" | "USD" | "US-SET" | "US SETTLEMENT" | "UNITEDSTATES" => {
                Ok(CalendarId::UnitedStates)
            }
            "UK" | "GBP" | "UK SETTLEMENT" | "UNITEDKINGDOM" | "GB" => Ok(CalendarId::UnitedKingdom),
            "BRL" | "BRAZIL" | "BR" => Ok(CalendarId::Brazil),
            "WEEKENDSONLY" | "CHF" | "JPY" => Ok(CalendarId::WeekendsOnly),
            "NULLCALENDAR" | "NULL" => Ok(CalendarId::NullCalendar),
            _ => Err(CoreError::UnknownCalendar {
                name: name.to_string(),
            }),
        }
    }
}

impl Calendar for CalendarId {
    fn name(&self) -> &'static str {
        match self {
            CalendarId::Joint(_) => "Joint",
            other => other.as_calendar().name(),
        }
    }

    fn is_business_day(&self, date: Date) -> bool {
        match self {
            CalendarId::Joint(members) => members.iter().all(|c| c.is_business_day(date)),
            other => other.as_calendar().is_business_day(date),
        }
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarId::Joint(members) => {
                let names: Vec<String> = members.iter().map(ToString::to_string).collect();
                f.write_str(&names.join(","))
            }
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for CalendarId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').filter(|p| !p.trim().is_empty()).collect();
        match parts.as_slice() {
            [] => Err(CoreError::UnknownCalendar {
                name: s.to_string(),
            }),
            [single] => CalendarId::parse_single(single),
            many => many
                .iter()
                .map(|p| CalendarId::parse_single(p))
                .collect::<CoreResult<Vec<_>>>()
                .map(CalendarId::Joint),
        }
    }
}

impl TryFrom<String> for CalendarId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CalendarId> for String {
    fn from(value: CalendarId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_weekends_only() {
        assert!(WeekendsOnly.is_business_day(d(2025, 1, 6)));
        assert!(!WeekendsOnly.is_business_day(d(2025, 1, 4)));
        assert!(NullCalendar.is_business_day(d(2025, 1, 4)));
    }

    #[test]
    fn test_advance_business_days() {
        let friday = d(2025, 1, 3);
        assert_eq!(WeekendsOnly.advance_business_days(friday, 1), d(2025, 1, 6));
        assert_eq!(WeekendsOnly.advance_business_days(d(2025, 1, 6), -1), friday);
        assert_eq!(WeekendsOnly.advance_business_days(d(2025, 1, 4), 0), d(2025, 1, 6));
    }

    #[test]
    fn test_advance_end_of_month() {
        // 2025-02-28 is the last business day of February
        let start = d(2025, 2, 28);
        let one_month = Period::months(1);
        let eom = WeekendsOnly
            .advance(start, one_month, BusinessDayConvention::ModifiedFollowing, true)
            .unwrap();
        assert_eq!(eom, d(2025, 3, 31));
        let plain = WeekendsOnly
            .advance(start, one_month, BusinessDayConvention::ModifiedFollowing, false)
            .unwrap();
        assert_eq!(plain, d(2025, 3, 28));
    }

    #[test]
    fn test_advance_days_counts_business_days() {
        let cal = CalendarId::Target;
        // Thursday 2025-04-17 + 2 business days skips Good Friday and Easter Monday
        let spot = cal
            .advance(d(2025, 4, 17), Period::days(2), BusinessDayConvention::Following, false)
            .unwrap();
        assert_eq!(spot, d(2025, 4, 23));
    }

    #[test]
    fn test_business_days_between_half_open() {
        // Mon..Mon: five business days
        assert_eq!(WeekendsOnly.business_days_between(d(2025, 1, 6), d(2025, 1, 13)), 5);
        assert_eq!(WeekendsOnly.business_days_between(d(2025, 1, 13), d(2025, 1, 6)), -5);
        assert_eq!(WeekendsOnly.business_days_between(d(2025, 1, 6), d(2025, 1, 6)), 0);
    }

    #[test]
    fn test_calendar_id_parse() {
        assert_eq!("EUR".parse::<CalendarId>().unwrap(), CalendarId::Target);
        assert_eq!("usd".parse::<CalendarId>().unwrap(), CalendarId::UnitedStates);
        assert_eq!(
            "US,UK".parse::<CalendarId>().unwrap(),
            CalendarId::Joint(vec![CalendarId::UnitedStates, CalendarId::UnitedKingdom])
        );
        assert!("Narnia".parse::<CalendarId>().is_err());
    }

    #[test]
    fn test_joint_calendar_union() {
        let joint: CalendarId = "US,UK".parse().unwrap();
        // Thanksgiving is a US-only holiday
        assert!(!joint.is_business_day(d(2025, 11, 27)));
        assert!(CalendarId::UnitedKingdom.is_business_day(d(2025, 11, 27)));
        assert_eq!(joint.to_string(), "US settlement,UK settlement");
    }

    #[test]
    fn test_calendar_id_serde() {
        let id: CalendarId = serde_json::from_str("\"TARGET\"").unwrap();
        assert_eq!(id, CalendarId::Target);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"TARGET\"");
    }
}
