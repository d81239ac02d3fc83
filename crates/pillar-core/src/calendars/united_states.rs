//! United States settlement calendar.

use chrono::Weekday;

use super::bitmap::{HolidayBitmap, HolidayCalendarBuilder};
use super::Calendar;
use crate::types::Date;
use std::sync::OnceLock;

static US_CALENDAR: OnceLock<UnitedStatesCalendar> = OnceLock::new();

/// US settlement calendar (federal holidays with weekend observation).
///
/// Used by USD Libor, SOFR and SIFMA conventions.
#[derive(Debug, Clone)]
pub struct UnitedStatesCalendar {
    bitmap: HolidayBitmap,
}

impl UnitedStatesCalendar {
    /// Builds the calendar.
    pub fn new() -> Self {
        Self {
            bitmap: HolidayCalendarBuilder::new("US Settlement")
                // New Year's Day; a Saturday holiday is observed on Dec 31
                .add_fixed_holiday(1, 1, true)
                .add_nth_weekday_holiday(1, Weekday::Mon, 3)
                .add_nth_weekday_holiday(2, Weekday::Mon, 3)
                .add_last_weekday_holiday(5, Weekday::Mon)
                // Juneteenth
                .add_fixed_holiday_from(6, 19, 2022, true)
                .add_fixed_holiday(7, 4, true)
                .add_nth_weekday_holiday(9, Weekday::Mon, 1)
                .add_nth_weekday_holiday(10, Weekday::Mon, 2)
                .add_fixed_holiday(11, 11, true)
                // Thanksgiving
                .add_nth_weekday_holiday(11, Weekday::Thu, 4)
                .add_fixed_holiday(12, 25, true)
                .build(),
        }
    }

    /// The shared instance.
    pub fn global() -> &'static UnitedStatesCalendar {
        US_CALENDAR.get_or_init(UnitedStatesCalendar::new)
    }
}

impl Default for UnitedStatesCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Calendar for UnitedStatesCalendar {
    fn name(&self) -> &'static str {
        "US settlement"
    }

    fn is_business_day(&self, date: Date) -> bool {
        self.bitmap.is_business_day(date.as_naive_date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_us_floating_holidays_2025() {
        let cal = UnitedStatesCalendar::global();
        assert!(!cal.is_business_day(d(2025, 1, 20))); // MLK
        assert!(!cal.is_business_day(d(2025, 5, 26))); // Memorial Day
        assert!(!cal.is_business_day(d(2025, 9, 1))); // Labor Day
        assert!(!cal.is_business_day(d(2025, 11, 27))); // Thanksgiving
    }

    #[test]
    fn test_us_observed() {
        let cal = UnitedStatesCalendar::global();
        // July 4, 2026 is a Saturday
        assert!(!cal.is_business_day(d(2026, 7, 3)));
        // Jan 1, 2022 is a Saturday
        assert!(!cal.is_business_day(d(2021, 12, 31)));
    }
}
