//! Leg building blocks shared by the swap-style helpers.

use pillar_core::calendars::{BusinessDayConvention, Calendar, CalendarId};
use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::schedule::{DateGenerationRule, Schedule, ScheduleConfig};
use pillar_core::types::Frequency;
use pillar_core::{Date, Period};

use crate::conventions::{RateIndex, SubPeriodsCouponType};
use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

/// One accrual period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Accrual {
    pub start: Date,
    pub end: Date,
    pub payment: Date,
    pub tau: f64,
}

/// A floating coupon and the index periods fixing into it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FloatPeriod {
    pub accrual: Accrual,
    pub fixings: Vec<(Date, Date)>,
}

/// Rolling and payment rules of one leg.
#[derive(Debug, Clone)]
pub(crate) struct LegRules {
    pub tenor: Period,
    pub calendar: CalendarId,
    pub convention: BusinessDayConvention,
    pub termination_convention: BusinessDayConvention,
    pub rule: DateGenerationRule,
    pub eom: bool,
    pub day_counter: DayCountConvention,
    pub payment_convention: BusinessDayConvention,
    pub payment_lag: u32,
}

impl LegRules {
    pub fn new(
        tenor: Period,
        calendar: CalendarId,
        convention: BusinessDayConvention,
        day_counter: DayCountConvention,
    ) -> Self {
        Self {
            tenor,
            calendar,
            convention,
            termination_convention: convention,
            rule: DateGenerationRule::Backward,
            eom: false,
            day_counter,
            payment_convention: convention,
            payment_lag: 0,
        }
    }

    /// Rules of a floating leg paying at the index tenor.
    pub fn for_index(index: &RateIndex) -> Self {
        Self::new(
            index.tenor(),
            index.calendar().clone(),
            index.convention(),
            index.day_counter(),
        )
        .with_eom(index.end_of_month())
    }

    pub fn with_tenor(mut self, tenor: Period) -> Self {
        self.tenor = tenor;
        self
    }

    pub fn with_eom(mut self, eom: bool) -> Self {
        self.eom = eom;
        self
    }

    pub fn with_rule(mut self, rule: DateGenerationRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_payment(mut self, convention: BusinessDayConvention, lag: u32) -> Self {
        self.payment_convention = convention;
        self.payment_lag = lag;
        self
    }

    pub fn with_termination_convention(mut self, convention: BusinessDayConvention) -> Self {
        self.termination_convention = convention;
        self
    }

    /// Accrual periods between `start` and `end`.
    pub fn accruals(&self, start: Date, end: Date) -> CurveResult<Vec<Accrual>> {
        let config = ScheduleConfig::new(start, end, self.tenor)
            .with_calendar(self.calendar.clone())
            .with_convention(self.convention)
            .with_termination_convention(self.termination_convention)
            .with_rule(self.rule)
            .with_end_of_month(self.eom);
        let schedule = Schedule::generate(&config)?;
        Ok(schedule
            .periods()
            .map(|(s, e)| {
                let adjusted = self.calendar.adjust(e, self.payment_convention);
                let payment = if self.payment_lag == 0 {
                    adjusted
                } else {
                    self.calendar
                        .advance_business_days(adjusted, self.payment_lag as i32)
                };
                Accrual {
                    start: s,
                    end: e,
                    payment,
                    tau: self.day_counter.year_fraction_f64(s, e),
                }
            })
            .collect())
    }
}

/// Tenor of one coupon period.
pub(crate) fn frequency_tenor(frequency: Frequency) -> CurveResult<Period> {
    frequency
        .to_period()
        .ok_or_else(|| CurveError::configuration(format!("Frequency {frequency} has no coupon tenor")))
}

/// Splits each accrual into index periods of `sub_tenor`.
pub(crate) fn float_periods(
    accruals: &[Accrual],
    sub_tenor: Option<&LegRules>,
) -> CurveResult<Vec<FloatPeriod>> {
    accruals
        .iter()
        .map(|a| {
            let fixings = match sub_tenor {
                Some(rules) if rules.tenor.years_approx() < (a.end - a.start) as f64 / 365.0 => rules
                    .clone()
                    .with_rule(DateGenerationRule::Forward)
                    .accruals(a.start, a.end)?
                    .iter()
                    .map(|s| (s.start, s.end))
                    .collect(),
                _ => vec![(a.start, a.end)],
            };
            Ok(FloatPeriod {
                accrual: *a,
                fixings,
            })
        })
        .collect()
}

/// Plain floating periods with one fixing each.
pub(crate) fn single_fixings(accruals: &[Accrual]) -> Vec<FloatPeriod> {
    accruals
        .iter()
        .map(|a| FloatPeriod {
            accrual: *a,
            fixings: vec![(a.start, a.end)],
        })
        .collect()
}

/// `P(start) / P(end)`.
pub(crate) fn growth(curve: &dyn YieldTermStructure, start: Date, end: Date) -> CurveResult<f64> {
    Ok(curve.discount_date(start)? / curve.discount_date(end)?)
}

/// Simply compounded forward over `[start, end]` with accrual `tau`.
pub(crate) fn simple_forward(
    curve: &dyn YieldTermStructure,
    start: Date,
    end: Date,
    tau: f64,
) -> CurveResult<f64> {
    if tau <= 0.0 {
        return Err(CurveError::data(format!(
            "empty accrual period from {start} to {end}"
        )));
    }
    Ok((growth(curve, start, end)? - 1.0) / tau)
}

/// `sum tau_i P(pay_i)`.
pub(crate) fn annuity(accruals: &[Accrual], discount: &dyn YieldTermStructure) -> CurveResult<f64> {
    accruals.iter().try_fold(0.0, |acc, a| {
        Ok(acc + a.tau * discount.discount_date(a.payment)?)
    })
}

/// Coupon amount per unit notional, before any spread.
pub(crate) fn float_amount(
    period: &FloatPeriod,
    projection: &dyn YieldTermStructure,
    coupon_type: SubPeriodsCouponType,
) -> CurveResult<f64> {
    match coupon_type {
        SubPeriodsCouponType::Compounding => {
            let product = period.fixings.iter().try_fold(1.0, |acc, (s, e)| {
                Ok::<f64, CurveError>(acc * growth(projection, *s, *e)?)
            })?;
            Ok(product - 1.0)
        }
        SubPeriodsCouponType::Averaging => period.fixings.iter().try_fold(0.0, |acc, (s, e)| {
            Ok(acc + growth(projection, *s, *e)? - 1.0)
        }),
    }
}

/// Present value of a floating leg per unit notional, spread excluded.
pub(crate) fn float_leg_pv(
    periods: &[FloatPeriod],
    projection: &dyn YieldTermStructure,
    discount: &dyn YieldTermStructure,
    coupon_type: SubPeriodsCouponType,
) -> CurveResult<f64> {
    periods.iter().try_fold(0.0, |acc, p| {
        Ok(acc + float_amount(p, projection, coupon_type)? * discount.discount_date(p.accrual.payment)?)
    })
}

/// Present value of an arithmetically averaged overnight leg.
///
/// The daily average over a period is taken as `ln(P(s)/P(e)) / tau`.
pub(crate) fn averaged_overnight_pv(
    periods: &[FloatPeriod],
    projection: &dyn YieldTermStructure,
    discount: &dyn YieldTermStructure,
) -> CurveResult<f64> {
    periods.iter().try_fold(0.0, |acc, p| {
        let amount = growth(projection, p.accrual.start, p.accrual.end)?.ln();
        Ok(acc + amount * discount.discount_date(p.accrual.payment)?)
    })
}

/// Last payment or accrual end across legs.
pub(crate) fn latest_date<'a>(legs: impl IntoIterator<Item = &'a [Accrual]>) -> Option<Date> {
    legs.into_iter()
        .flat_map(|leg| leg.iter().map(|a| a.payment.max(a.end)))
        .max()
}
