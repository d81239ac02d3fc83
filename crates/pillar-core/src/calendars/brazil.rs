//! Brazil settlement calendar, used for CDI business-day accrual.

use super::bitmap::{HolidayBitmap, HolidayCalendarBuilder};
use super::Calendar;
use crate::types::Date;
use std::sync::OnceLock;

static BRAZIL_CALENDAR: OnceLock<BrazilCalendar> = OnceLock::new();

/// Brazilian national holidays.
///
/// CDI rates compound over business days of this calendar on a 252-day
/// year, so the holiday list feeds directly into CDI pricing.
#[derive(Debug, Clone)]
pub struct BrazilCalendar {
    bitmap: HolidayBitmap,
}

impl BrazilCalendar {
    /// Builds the calendar.
    pub fn new() -> Self {
        Self {
            bitmap: HolidayCalendarBuilder::new("Brazil")
                .add_fixed_holiday(1, 1, false)
                // Carnival Monday and Tuesday
                .add_easter_holiday(-48)
                .add_easter_holiday(-47)
                .add_easter_holiday(-2)
                // Tiradentes
                .add_fixed_holiday(4, 21, false)
                .add_fixed_holiday(5, 1, false)
                // Corpus Christi
                .add_easter_holiday(60)
                .add_fixed_holiday(9, 7, false)
                .add_fixed_holiday(10, 12, false)
                .add_fixed_holiday(11, 2, false)
                .add_fixed_holiday(11, 15, false)
                // Black Consciousness Day
                .add_fixed_holiday_from(11, 20, 2024, false)
                .add_fixed_holiday(12, 25, false)
                .build(),
        }
    }

    /// The shared instance.
    pub fn global() -> &'static BrazilCalendar {
        BRAZIL_CALENDAR.get_or_init(BrazilCalendar::new)
    }
}

impl Default for BrazilCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Calendar for BrazilCalendar {
    fn name(&self) -> &'static str {
        "Brazil"
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
    fn test_brazil_carnival_2025() {
        // Easter 2025-04-20
        let cal = BrazilCalendar::global();
        assert!(!cal.is_business_day(d(2025, 3, 3)));
        assert!(!cal.is_business_day(d(2025, 3, 4)));
        assert!(cal.is_business_day(d(2025, 3, 5)));
        assert!(!cal.is_business_day(d(2025, 6, 19)));
    }

    #[test]
    fn test_black_consciousness_day() {
        let cal = BrazilCalendar::global();
        assert!(cal.is_business_day(d(2023, 11, 20)));
        assert!(!cal.is_business_day(d(2024, 11, 20)));
    }
}
