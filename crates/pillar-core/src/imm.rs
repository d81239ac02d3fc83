//! IMM date arithmetic.
//!
//! IMM dates are the third Wednesday of a month. The main cycle is March,
//! June, September and December; serial contracts use every month.

use chrono::{NaiveDate, Weekday};

use crate::error::{CoreError, CoreResult};
use crate::types::Date;

/// Third Wednesday of the given month.
pub fn imm_date(year: i32, month: u32) -> CoreResult<Date> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Wed, 3)
        .map(Date::from)
        .ok_or_else(|| CoreError::invalid_date(format!("no IMM date in {year}-{month:02}")))
}

/// True if `date` is an IMM date, restricted to the main cycle when
/// `main_cycle` is set.
#[must_use]
pub fn is_imm_date(date: Date, main_cycle: bool) -> bool {
    if date.weekday() != Weekday::Wed || !(15..=21).contains(&date.day()) {
        return false;
    }
    !main_cycle || date.month() % 3 == 0
}

/// First IMM date strictly after `date`.
///
/// # Example
///
/// ```rust
/// use pillar_core::imm::next_imm_date;
/// use pillar_core::types::Date;
///
/// let d = Date::from_ymd(2025, 3, 19).unwrap(); // itself an IMM date
/// assert_eq!(next_imm_date(d, true).unwrap(), Date::from_ymd(2025, 6, 18).unwrap());
/// assert_eq!(next_imm_date(d, false).unwrap(), Date::from_ymd(2025, 4, 16).unwrap());
/// ```
pub fn next_imm_date(date: Date, main_cycle: bool) -> CoreResult<Date> {
    let offset: u32 = if main_cycle { 3 } else { 1 };
    let mut year = date.year();
    let mut month = date.month();
    let skip = offset - month % offset;
    if skip != offset || date.day() > 21 {
        month += skip;
        if month > 12 {
            month -= 12;
            year += 1;
        }
    }

    let candidate = imm_date(year, month)?;
    if candidate <= date {
        return next_imm_date(Date::from_ymd(year, month, 22)?, main_cycle);
    }
    Ok(candidate)
}

/// The `n`-th IMM date after `date` (`n = 1` is [`next_imm_date`]).
pub fn nth_imm_date(date: Date, n: u32, main_cycle: bool) -> CoreResult<Date> {
    let mut current = date;
    for _ in 0..n.max(1) {
        current = next_imm_date(current, main_cycle)?;
    }
    Ok(current)
}
