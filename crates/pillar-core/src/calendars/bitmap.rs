//! Bitmap-backed holiday storage.
//!
//! Rule-based calendars expand their holiday rules once, at construction,
//! into a bitmap covering [`MIN_YEAR`, `MAX_YEAR`]. Lookups are then a
//! single word probe.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

/// Minimum year supported by rule-based calendars.
pub const MIN_YEAR: i32 = 1970;
/// Maximum year supported by rule-based calendars.
pub const MAX_YEAR: i32 = 2120;

const YEAR_COUNT: usize = (MAX_YEAR - MIN_YEAR + 1) as usize;
const MAX_DAYS_PER_YEAR: usize = 366;
const WORD_COUNT: usize = (YEAR_COUNT * MAX_DAYS_PER_YEAR).div_ceil(64);

/// Holiday set stored one bit per day.
///
/// Weekends are not stored; every bitmap calendar here uses a
/// Saturday/Sunday weekend.
#[derive(Clone)]
pub struct HolidayBitmap {
    name: &'static str,
    bits: Box<[u64]>,
}

impl std::fmt::Debug for HolidayBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HolidayBitmap")
            .field("name", &self.name)
            .field("holiday_count", &self.count_holidays())
            .finish()
    }
}

impl HolidayBitmap {
    /// Creates an empty bitmap.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            bits: vec![0u64; WORD_COUNT].into_boxed_slice(),
        }
    }

    /// Name of the calendar the bitmap belongs to.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Marks a date as a holiday. Dates outside the supported range are ignored.
    pub fn add_holiday(&mut self, date: NaiveDate) {
        if let Some((word, bit)) = Self::indices(date) {
            self.bits[word] |= 1u64 << bit;
        }
    }

    /// True if the date is a listed holiday (weekends excluded).
    #[inline]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        Self::indices(date).is_some_and(|(word, bit)| self.bits[word] & (1u64 << bit) != 0)
    }

    /// True if the date is neither a weekend nor a holiday.
    #[inline]
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// Number of holidays stored.
    pub fn count_holidays(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    fn indices(date: NaiveDate) -> Option<(usize, usize)> {
        let year = date.year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return None;
        }
        let position = (year - MIN_YEAR) as usize * MAX_DAYS_PER_YEAR + date.ordinal0() as usize;
        Some((position / 64, position % 64))
    }
}

/// Builder expanding holiday rules into a [`HolidayBitmap`].
pub struct HolidayCalendarBuilder {
    name: &'static str,
    holidays: HashSet<NaiveDate>,
    start_year: i32,
    end_year: i32,
}

impl HolidayCalendarBuilder {
    /// Creates a builder covering the full supported range.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            holidays: HashSet::new(),
            start_year: MIN_YEAR,
            end_year: MAX_YEAR,
        }
    }

    /// Restricts the years for which rules are expanded.
    pub fn year_range(mut self, start: i32, end: i32) -> Self {
        self.start_year = start.max(MIN_YEAR);
        self.end_year = end.min(MAX_YEAR);
        self
    }

    /// Same month and day every year, optionally moved off weekends
    /// (Saturday to Friday, Sunday to Monday).
    pub fn add_fixed_holiday(self, month: u32, day: u32, observe_weekend: bool) -> Self {
        let from = self.start_year;
        self.add_fixed_holiday_from(month, day, from, observe_weekend)
    }

    /// Fixed holiday that only exists from `from_year` onwards.
    pub fn add_fixed_holiday_from(
        mut self,
        month: u32,
        day: u32,
        from_year: i32,
        observe_weekend: bool,
    ) -> Self {
        for year in from_year.max(self.start_year)..=self.end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(if observe_weekend {
                    observed_date(date)
                } else {
                    date
                });
            }
        }
        self
    }

    /// The `occurrence`-th `weekday` of `month`.
    pub fn add_nth_weekday_holiday(mut self, month: u32, weekday: Weekday, occurrence: u32) -> Self {
        for year in self.start_year..=self.end_year {
            if let Some(date) = nth_weekday_of_month(year, month, weekday, occurrence) {
                self.holidays.insert(date);
            }
        }
        self
    }

    /// The last `weekday` of `month`.
    pub fn add_last_weekday_holiday(mut self, month: u32, weekday: Weekday) -> Self {
        for year in self.start_year..=self.end_year {
            if let Some(date) = last_weekday_of_month(year, month, weekday) {
                self.holidays.insert(date);
            }
        }
        self
    }

    /// A day at `offset_days` from Easter Sunday.
    pub fn add_easter_holiday(mut self, offset_days: i64) -> Self {
        for year in self.start_year..=self.end_year {
            if let Some(date) = easter_sunday(year)
                .and_then(|e| e.checked_add_signed(chrono::Duration::days(offset_days)))
            {
                self.holidays.insert(date);
            }
        }
        self
    }

    /// Holidays produced per year by an arbitrary rule.
    pub fn add_custom_holidays<F>(mut self, generator: F) -> Self
    where
        F: Fn(i32) -> Vec<NaiveDate>,
    {
        for year in self.start_year..=self.end_year {
            self.holidays.extend(generator(year));
        }
        self
    }

    /// Expands the rules into a bitmap.
    pub fn build(self) -> HolidayBitmap {
        let mut bitmap = HolidayBitmap::new(self.name);
        for date in self.holidays {
            bitmap.add_holiday(date);
        }
        bitmap
    }
}

/// Saturday holidays are observed on Friday, Sunday holidays on Monday.
pub fn observed_date(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date.pred_opt().unwrap_or(date),
        Weekday::Sun => date.succ_opt().unwrap_or(date),
        _ => date,
    }
}

/// The `n`-th occurrence of a weekday in a month.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, u8::try_from(n).ok()?)
}

/// The last occurrence of a weekday in a month.
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last_day = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?.pred_opt()?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()?
    };
    let back = (last_day.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    last_day.checked_sub_signed(chrono::Duration::days(i64::from(back)))
}

/// Easter Sunday, anonymous Gregorian algorithm.
#[allow(clippy::many_single_char_names)]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
