//! Actual/Actual (ISDA) day count convention.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

/// Actual/Actual (ISDA).
///
/// The accrual period is split at calendar-year boundaries; days falling in
/// a leap year are divided by 366, all others by 365.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "Actual/Actual (ISDA)"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        if start == end {
            return Decimal::ZERO;
        }
        if start > end {
            return -self.year_fraction(end, start);
        }

        let y1 = start.year();
        let y2 = end.year();
        let basis1 = Decimal::from(start.days_in_year());
        let basis2 = Decimal::from(end.days_in_year());

        // Days from start to Jan 1 of the following year, and from Jan 1 of
        // the end year to the end date.
        let next_jan1 = Date::from_ymd(y1 + 1, 1, 1).map_or(0, |d| start.days_between(&d));
        let end_jan1 = Date::from_ymd(y2, 1, 1).map_or(0, |d| d.days_between(&end));

        if y1 == y2 {
            return Decimal::from(start.days_between(&end)) / basis1;
        }

        Decimal::from(next_jan1) / basis1
            + Decimal::from(y2 - y1 - 1)
            + Decimal::from(end_jan1) / basis2
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}
