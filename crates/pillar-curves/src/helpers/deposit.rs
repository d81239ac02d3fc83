//! Money market deposit helper.

use pillar_core::calendars::{BusinessDayConvention, Calendar, CalendarId};
use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::{Date, Period};

use super::legs::simple_forward;
use super::RateHelper;
use crate::error::CurveResult;
use crate::termstructures::YieldTermStructure;

/// A deposit from spot (plus forward start days) over a term.
///
/// The implied quote is the simple rate `(P(s)/P(e) - 1) / tau(s, e)` on the
/// curve being built.
#[derive(Debug, Clone)]
pub struct DepositHelper {
    rate: f64,
    term: Period,
    start: Date,
    end: Date,
    tau: f64,
}

impl DepositHelper {
    /// Creates the helper.
    ///
    /// `fwd_start_days` business days are counted from the adjusted as-of
    /// date on `calendar`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rate: f64,
        as_of: Date,
        term: Period,
        fwd_start_days: u32,
        calendar: &CalendarId,
        convention: BusinessDayConvention,
        eom: bool,
        day_counter: DayCountConvention,
    ) -> CurveResult<Self> {
        let fixing = calendar.adjust(as_of, BusinessDayConvention::Following);
        let start = calendar.advance_business_days(fixing, fwd_start_days as i32);
        let end = calendar.advance(start, term, convention, eom)?;
        Ok(Self {
            rate,
            term,
            start,
            end,
            tau: day_counter.year_fraction_f64(start, end),
        })
    }

    /// Accrual start.
    pub fn start_date(&self) -> Date {
        self.start
    }

    /// Maturity.
    pub fn end_date(&self) -> Date {
        self.end
    }
}

impl RateHelper for DepositHelper {
    fn pillar_date(&self) -> Date {
        self.end
    }

    fn quote(&self) -> f64 {
        self.rate
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        simple_forward(curve, self.start, self.end, self.tau)
    }

    fn description(&self) -> String {
        let rate = self.rate * 100.0;
        format!("Deposit {} {rate:.4}% {} to {}", self.term, self.start, self.end)
    }
}
