//! TARGET calendar for euro settlement.

use super::bitmap::{HolidayBitmap, HolidayCalendarBuilder};
use super::Calendar;
use crate::types::Date;
use std::sync::OnceLock;

static TARGET_CALENDAR: OnceLock<TargetCalendar> = OnceLock::new();

/// TARGET (Trans-European Automated Real-time Gross settlement Express
/// Transfer) calendar, used by every EUR index and swap convention.
///
/// ## Holidays
///
/// - New Year's Day (January 1)
/// - Good Friday
/// - Easter Monday
/// - Labour Day (May 1)
/// - Christmas Day (December 25)
/// - Boxing Day (December 26)
///
/// Holidays falling on a weekend are not moved.
#[derive(Debug, Clone)]
pub struct TargetCalendar {
    bitmap: HolidayBitmap,
}

impl TargetCalendar {
    /// Builds the calendar.
    pub fn new() -> Self {
        Self {
            bitmap: HolidayCalendarBuilder::new("TARGET")
                .add_fixed_holiday(1, 1, false)
                .add_easter_holiday(-2)
                .add_easter_holiday(1)
                .add_fixed_holiday_from(5, 1, 2000, false)
                .add_fixed_holiday(12, 25, false)
                .add_fixed_holiday_from(12, 26, 2000, false)
                .build(),
        }
    }

    /// The shared instance.
    pub fn global() -> &'static TargetCalendar {
        TARGET_CALENDAR.get_or_init(TargetCalendar::new)
    }
}

impl Default for TargetCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Calendar for TargetCalendar {
    fn name(&self) -> &'static str {
        "TARGET"
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
    fn test_target_easter_2025() {
        let cal = TargetCalendar::global();
        assert!(!cal.is_business_day(d(2025, 4, 18)));
        assert!(!cal.is_business_day(d(2025, 4, 21)));
        assert!(cal.is_business_day(d(2025, 4, 22)));
    }

    #[test]
    fn test_target_weekend_holiday_not_moved() {
        let cal = TargetCalendar::global();
        // 2028-01-01 is a Saturday; Friday stays open
        assert!(cal.is_business_day(d(2027, 12, 31)));
        assert!(cal.is_business_day(d(2028, 1, 3)));
    }

    #[test]
    fn test_target_christmas() {
        let cal = TargetCalendar::global();
        assert!(!cal.is_business_day(d(2024, 12, 25)));
        assert!(!cal.is_business_day(d(2024, 12, 26)));
        assert!(cal.is_business_day(d(2024, 12, 27)));
    }
}
