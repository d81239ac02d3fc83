//! Schedule generation for swap legs and bond coupons.
//!
//! Dates are generated from an anchor (the termination date for
//! [`DateGenerationRule::Backward`], the effective date for
//! [`DateGenerationRule::Forward`]) by whole multiples of the tenor, so a
//! month-end clamp in one period never drifts into the next. Any stub is
//! short and sits at the far end from the anchor.
//!
//! # Example
//!
//! ```rust
//! use pillar_core::calendars::{BusinessDayConvention, CalendarId};
//! use pillar_core::schedule::{Schedule, ScheduleConfig};
//! use pillar_core::types::{Date, Period};
//!
//! let config = ScheduleConfig::new(
//!     Date::from_ymd(2025, 1, 15).unwrap(),
//!     Date::from_ymd(2026, 1, 15).unwrap(),
//!     Period::months(3),
//! )
//! .with_calendar(CalendarId::Target);
//!
//! let schedule = Schedule::generate(&config).unwrap();
//! assert_eq!(schedule.len(), 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::calendars::{BusinessDayConvention, Calendar, CalendarId};
use crate::error::{CoreError, CoreResult};
use crate::types::{Date, Period};

/// Direction in which schedule dates are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateGenerationRule {
    /// From the termination date backwards; stub at the front.
    #[default]
    Backward,
    /// From the effective date forwards; stub at the back.
    Forward,
    /// Effective and termination dates only.
    Zero,
}

/// Inputs to [`Schedule::generate`].
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Effective date.
    pub start_date: Date,
    /// Termination date.
    pub end_date: Date,
    /// Period between regular dates.
    pub tenor: Period,
    /// Calendar for adjustments.
    pub calendar: CalendarId,
    /// Convention for every date except the termination date.
    pub convention: BusinessDayConvention,
    /// Convention for the termination date.
    pub termination_convention: BusinessDayConvention,
    /// Generation direction.
    pub rule: DateGenerationRule,
    /// Month-end rolling.
    pub end_of_month: bool,
}

impl ScheduleConfig {
    /// Creates a backward schedule configuration with modified following
    /// adjustment on a weekends-only calendar.
    #[must_use]
    pub fn new(start_date: Date, end_date: Date, tenor: Period) -> Self {
        Self {
            start_date,
            end_date,
            tenor,
            calendar: CalendarId::WeekendsOnly,
            convention: BusinessDayConvention::ModifiedFollowing,
            termination_convention: BusinessDayConvention::ModifiedFollowing,
            rule: DateGenerationRule::Backward,
            end_of_month: false,
        }
    }

    /// Sets the calendar.
    #[must_use]
    pub fn with_calendar(mut self, calendar: CalendarId) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets both the regular and termination conventions.
    #[must_use]
    pub fn with_convention(mut self, convention: BusinessDayConvention) -> Self {
        self.convention = convention;
        self.termination_convention = convention;
        self
    }

    /// Sets the termination date convention only.
    #[must_use]
    pub fn with_termination_convention(mut self, convention: BusinessDayConvention) -> Self {
        self.termination_convention = convention;
        self
    }

    /// Sets the generation rule.
    #[must_use]
    pub fn with_rule(mut self, rule: DateGenerationRule) -> Self {
        self.rule = rule;
        self
    }

    /// Sets the end-of-month flag.
    #[must_use]
    pub fn with_end_of_month(mut self, eom: bool) -> Self {
        self.end_of_month = eom;
        self
    }
}

/// Adjusted schedule dates, in increasing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    dates: Vec<Date>,
}

impl Schedule {
    /// Generates the schedule.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Schedule` if the termination date is not after
    /// the effective date or the tenor is negative.
    pub fn generate(config: &ScheduleConfig) -> CoreResult<Self> {
        if config.end_date <= config.start_date {
            return Err(CoreError::schedule(format!(
                "termination date {} must be after effective date {}",
                config.end_date, config.start_date
            )));
        }
        if config.tenor.length() < 0 {
            return Err(CoreError::schedule(format!(
                "negative tenor {}",
                config.tenor
            )));
        }

        let cal = &config.calendar;
        let rule = if config.tenor.is_zero() {
            DateGenerationRule::Zero
        } else {
            config.rule
        };

        let unadjusted = match rule {
            DateGenerationRule::Zero => vec![config.start_date, config.end_date],
            DateGenerationRule::Backward => {
                let mut dates = vec![config.end_date];
                let mut i = 1;
                loop {
                    let d = config.end_date.sub_period(scaled(config.tenor, i), false)?;
                    if d <= config.start_date {
                        break;
                    }
                    dates.push(d);
                    i += 1;
                }
                dates.push(config.start_date);
                dates.reverse();
                dates
            }
            DateGenerationRule::Forward => {
                let mut dates = vec![config.start_date];
                let mut i = 1;
                loop {
                    let d = config.start_date.add_period(scaled(config.tenor, i), false)?;
                    if d >= config.end_date {
                        break;
                    }
                    dates.push(d);
                    i += 1;
                }
                dates.push(config.end_date);
                dates
            }
        };

        let anchor = match rule {
            DateGenerationRule::Forward => config.start_date,
            _ => config.end_date,
        };
        let roll_to_month_end = config.end_of_month
            && config.tenor.total_months().is_some()
            && cal.is_end_of_month(anchor);

        let last = unadjusted.len() - 1;
        let mut dates: Vec<Date> = unadjusted
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let convention = if i == last {
                    config.termination_convention
                } else {
                    config.convention
                };
                let is_boundary = i == 0 || i == last;
                if roll_to_month_end && !is_boundary {
                    cal.end_of_month(d)
                } else {
                    cal.adjust(d, convention)
                }
            })
            .collect();
        dates.dedup();

        if dates.len() < 2 {
            return Err(CoreError::schedule(format!(
                "schedule from {} to {} collapses to a single date",
                config.start_date, config.end_date
            )));
        }

        Ok(Self { dates })
    }

    /// Builds a schedule from explicit dates.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Schedule` unless at least two strictly increasing
    /// dates are given.
    pub fn from_dates(dates: Vec<Date>) -> CoreResult<Self> {
        if dates.len() < 2 || dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CoreError::schedule(
                "explicit schedule needs at least two increasing dates",
            ));
        }
        Ok(Self { dates })
    }

    /// All dates including effective and termination.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Never true for a generated schedule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First date.
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.dates[0]
    }

    /// Last date.
    #[must_use]
    pub fn end_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Accrual periods as `(start, end)` pairs.
    pub fn periods(&self) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.dates.windows(2).map(|w| (w[0], w[1]))
    }
}

fn scaled(tenor: Period, n: i32) -> Period {
    Period::new(tenor.length() * n, tenor.unit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_backward_front_stub() {
        let config = ScheduleConfig::new(d(2025, 2, 10), d(2026, 1, 15), Period::months(6));
        let schedule = Schedule::generate(&config).unwrap();
        assert_eq!(
            schedule.dates(),
            &[d(2025, 2, 10), d(2025, 7, 15), d(2026, 1, 15)]
        );
    }

    #[test]
    fn test_forward_back_stub() {
        let config = ScheduleConfig::new(d(2025, 1, 15), d(2025, 12, 10), Period::months(6))
            .with_rule(DateGenerationRule::Forward);
        let schedule = Schedule::generate(&config).unwrap();
        assert_eq!(
            schedule.dates(),
            &[d(2025, 1, 15), d(2025, 7, 15), d(2025, 12, 10)]
        );
    }

    #[test]
    fn test_adjusts_weekends() {
        // 2025-03-15 is a Saturday
        let config = ScheduleConfig::new(d(2024, 9, 16), d(2025, 9, 15), Period::months(6))
            .with_calendar(CalendarId::Target);
        let schedule = Schedule::generate(&config).unwrap();
        assert_eq!(schedule.dates()[1], d(2025, 3, 17));
    }

    #[test]
    fn test_end_of_month_rolls() {
        let config = ScheduleConfig::new(d(2024, 8, 30), d(2025, 2, 28), Period::months(3))
            .with_end_of_month(true);
        let schedule = Schedule::generate(&config).unwrap();
        // 2024-11-28 without the rule; month end (Friday 29th) with it
        assert_eq!(schedule.dates()[1], d(2024, 11, 29));
    }

    #[test]
    fn test_zero_rule() {
        let config = ScheduleConfig::new(d(2025, 1, 15), d(2030, 1, 15), Period::years(1))
            .with_rule(DateGenerationRule::Zero);
        let schedule = Schedule::generate(&config).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.periods().count(), 1);
    }

    #[test]
    fn test_invalid_range() {
        let config = ScheduleConfig::new(d(2025, 1, 15), d(2025, 1, 15), Period::months(3));
        assert!(Schedule::generate(&config).is_err());
        assert!(Schedule::from_dates(vec![d(2025, 1, 15)]).is_err());
    }
}
