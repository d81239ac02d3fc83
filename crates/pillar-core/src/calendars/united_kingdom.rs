//! United Kingdom settlement calendar.

use chrono::{Datelike, NaiveDate, Weekday};

use super::bitmap::{last_weekday_of_month, nth_weekday_of_month, HolidayBitmap, HolidayCalendarBuilder};
use super::Calendar;
use crate::types::Date;
use std::sync::OnceLock;

static UK_CALENDAR: OnceLock<UnitedKingdomCalendar> = OnceLock::new();

/// England and Wales bank holidays, used by GBP conventions.
///
/// New Year, Christmas and Boxing Day roll to the next free weekday when
/// they fall on a weekend. One-off royal holidays are included.
#[derive(Debug, Clone)]
pub struct UnitedKingdomCalendar {
    bitmap: HolidayBitmap,
}

impl UnitedKingdomCalendar {
    /// Builds the calendar.
    pub fn new() -> Self {
        Self {
            bitmap: HolidayCalendarBuilder::new("UK settlement")
                .add_custom_holidays(new_years_day)
                .add_easter_holiday(-2)
                .add_easter_holiday(1)
                .add_custom_holidays(early_may)
                .add_custom_holidays(spring_bank)
                .add_last_weekday_holiday(8, Weekday::Mon)
                .add_custom_holidays(christmas)
                .add_custom_holidays(special)
                .build(),
        }
    }

    /// The shared instance.
    pub fn global() -> &'static UnitedKingdomCalendar {
        UK_CALENDAR.get_or_init(UnitedKingdomCalendar::new)
    }
}

impl Default for UnitedKingdomCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Calendar for UnitedKingdomCalendar {
    fn name(&self) -> &'static str {
        "UK settlement"
    }

    fn is_business_day(&self, date: Date) -> bool {
        self.bitmap.is_business_day(date.as_naive_date())
    }
}

fn new_years_day(year: i32) -> Vec<NaiveDate> {
    let day = match NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.weekday()) {
        Some(Weekday::Sat) => 3,
        Some(Weekday::Sun) => 2,
        _ => 1,
    };
    NaiveDate::from_ymd_opt(year, 1, day).into_iter().collect()
}

fn early_may(year: i32) -> Vec<NaiveDate> {
    // VE day 75th anniversary
    if year == 2020 {
        return NaiveDate::from_ymd_opt(2020, 5, 8).into_iter().collect();
    }
    nth_weekday_of_month(year, 5, Weekday::Mon, 1).into_iter().collect()
}

fn spring_bank(year: i32) -> Vec<NaiveDate> {
    // Platinum Jubilee
    if year == 2022 {
        return NaiveDate::from_ymd_opt(2022, 6, 2).into_iter().collect();
    }
    last_weekday_of_month(year, 5, Weekday::Mon).into_iter().collect()
}

fn christmas(year: i32) -> Vec<NaiveDate> {
    let days: [u32; 2] = match NaiveDate::from_ymd_opt(year, 12, 25).map(|d| d.weekday()) {
        Some(Weekday::Fri) => [25, 28],
        Some(Weekday::Sat) => [27, 28],
        Some(Weekday::Sun) => [26, 27],
        _ => [25, 26],
    };
    days.iter()
        .filter_map(|&d| NaiveDate::from_ymd_opt(year, 12, d))
        .collect()
}

fn special(year: i32) -> Vec<NaiveDate> {
    let dates: &[(u32, u32)] = match year {
        1999 => &[(12, 31)],
        2002 => &[(6, 3), (6, 4)],
        2011 => &[(4, 29)],
        2012 => &[(6, 4), (6, 5)],
        2022 => &[(6, 3), (9, 19)],
        2023 => &[(5, 8)],
        _ => &[],
    };
    dates
        .iter()
        .filter_map(|&(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_uk_christmas_substitutes() {
        let cal = UnitedKingdomCalendar::global();
        // 2021: Christmas Saturday, Boxing Day Sunday
        assert!(!cal.is_business_day(d(2021, 12, 27)));
        assert!(!cal.is_business_day(d(2021, 12, 28)));
        assert!(cal.is_business_day(d(2021, 12, 29)));
    }

    #[test]
    fn test_uk_bank_holidays_2025() {
        let cal = UnitedKingdomCalendar::global();
        assert!(!cal.is_business_day(d(2025, 5, 5)));
        assert!(!cal.is_business_day(d(2025, 5, 26)));
        assert!(!cal.is_business_day(d(2025, 8, 25)));
    }

    #[test]
    fn test_uk_coronation() {
        let cal = UnitedKingdomCalendar::global();
        assert!(!cal.is_business_day(d(2023, 5, 8)));
    }
}
