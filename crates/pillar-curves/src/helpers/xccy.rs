//! Cross currency swap helpers.
//!
//! Both legs carry notional exchanges at start and maturity. Leg values are
//! expressed per unit of notional and divided by the leg's discount factor
//! at the start date, so the FX spot used to size the notionals cancels
//! out. On a resetting leg the notional of each period is the FX forward at
//! the period start, which ties its value to the other leg's discount
//! curve.

use pillar_core::calendars::{BusinessDayConvention, Calendar, CalendarId};
use pillar_core::{Date, Period};

use super::legs::{float_amount, float_periods, frequency_tenor, latest_date, single_fixings, Accrual, FloatPeriod, LegRules};
use super::{CurveRef, RateHelper};
use crate::conventions::{
    CrossCcyBasisConvention, CrossCcyFixFloatConvention, RateIndex, SubPeriodsCouponType,
};
use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

/// Discount and projection curves of one leg.
#[derive(Debug, Clone, Default)]
pub struct LegCurves {
    /// Discounts the leg's cash flows.
    pub discount: CurveRef,
    /// Projects the leg's index. Unused on fixed legs.
    pub projection: CurveRef,
}

impl LegCurves {
    /// Creates the pair.
    pub fn new(discount: CurveRef, projection: CurveRef) -> Self {
        Self { discount, projection }
    }
}

#[derive(Debug, Clone)]
struct XccyLeg {
    periods: Vec<FloatPeriod>,
    floating: bool,
    curves: LegCurves,
}

impl XccyLeg {
    fn floating(index: &RateIndex, pay_tenor: Option<Period>, eom: bool, start: Date, end: Date, curves: LegCurves) -> CurveResult<Self> {
        let rules = LegRules::for_index(index).with_eom(eom);
        let accruals = rules
            .clone()
            .with_tenor(pay_tenor.unwrap_or(index.tenor()))
            .accruals(start, end)?;
        let periods = if index.is_overnight() {
            single_fixings(&accruals)
        } else {
            float_periods(&accruals, Some(&rules))?
        };
        Ok(Self {
            periods,
            floating: true,
            curves,
        })
    }

    fn fixed(rules: &LegRules, start: Date, end: Date, discount: CurveRef) -> CurveResult<Self> {
        Ok(Self {
            periods: single_fixings(&rules.accruals(start, end)?),
            floating: false,
            curves: LegCurves::new(discount, CurveRef::Building),
        })
    }

    fn last_date(&self) -> Option<Date> {
        let accruals: Vec<Accrual> = self.periods.iter().map(|p| p.accrual).collect();
        latest_date([accruals.as_slice()])
    }

    fn amount(&self, period: &FloatPeriod, building: &dyn YieldTermStructure) -> CurveResult<f64> {
        if self.floating {
            float_amount(period, self.curves.projection.resolve(building), SubPeriodsCouponType::Compounding)
        } else {
            Ok(0.0)
        }
    }

    /// `(value, sensitivity)` such that the leg is worth
    /// `value + x * sensitivity` with `x` the leg's spread or fixed rate.
    fn value(&self, building: &dyn YieldTermStructure) -> CurveResult<(f64, f64)> {
        let discount = self.curves.discount.resolve(building);
        let (first, last) = match (self.periods.first(), self.periods.last()) {
            (Some(f), Some(l)) => (f.accrual, l.accrual),
            _ => return Err(CurveError::data("cross currency leg has no coupons")),
        };
        let d0 = discount.discount_date(first.start)?;
        let mut value = discount.discount_date(last.payment)? - d0;
        let mut sensitivity = 0.0;
        for p in &self.periods {
            let df = discount.discount_date(p.accrual.payment)?;
            value += self.amount(p, building)? * df;
            sensitivity += p.accrual.tau * df;
        }
        Ok((value / d0, sensitivity / d0))
    }

    /// Like [`value`](Self::value) for a leg whose notional resets to the
    /// FX forward, in units of the constant notional leg discounted on
    /// `other`.
    fn resetting_value(
        &self,
        building: &dyn YieldTermStructure,
        other: &dyn YieldTermStructure,
    ) -> CurveResult<(f64, f64)> {
        let discount = self.curves.discount.resolve(building);
        let start = self
            .periods
            .first()
            .map(|p| p.accrual.start)
            .ok_or_else(|| CurveError::data("cross currency leg has no coupons"))?;
        let f0 = other.discount_date(start)?;
        let mut value = 0.0;
        let mut sensitivity = 0.0;
        for p in &self.periods {
            let a = p.accrual;
            let notional = other.discount_date(a.start)? / f0;
            let carry = discount.discount_date(a.payment)? / discount.discount_date(a.start)?;
            value += notional * ((1.0 + self.amount(p, building)?) * carry - 1.0);
            sensitivity += notional * a.tau * carry;
        }
        Ok((value, sensitivity))
    }
}

/// Which leg's notional resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reset {
    None,
    Quoted,
    Other,
}

/// Solves `quoted(x) == other` for the quoted leg's `x`.
fn par_quote(
    quoted: &XccyLeg,
    other: &XccyLeg,
    reset: Reset,
    building: &dyn YieldTermStructure,
) -> CurveResult<f64> {
    let quoted_discount = quoted.curves.discount.resolve(building);
    let other_discount = other.curves.discount.resolve(building);
    let ((base, sensitivity), (target, _)) = match reset {
        Reset::None => (quoted.value(building)?, other.value(building)?),
        Reset::Quoted => (
            quoted.resetting_value(building, other_discount)?,
            other.value(building)?,
        ),
        Reset::Other => (
            quoted.value(building)?,
            other.resetting_value(building, quoted_discount)?,
        ),
    };
    if sensitivity.abs() < f64::EPSILON {
        return Err(CurveError::data("cross currency leg has zero sensitivity to its quote"));
    }
    Ok((target - base) / sensitivity)
}

fn settlement(calendar: &CalendarId, as_of: Date, days: u32) -> Date {
    calendar.advance_business_days(calendar.adjust(as_of, BusinessDayConvention::Following), days as i32)
}

/// Float against float cross currency swap quoted as the spread on the
/// spread leg.
#[derive(Debug, Clone)]
pub struct CrossCcyBasisHelper {
    spread: f64,
    fx_spot: f64,
    label: String,
    flat: XccyLeg,
    spread_leg: XccyLeg,
    reset: Reset,
    pillar: Date,
}

impl CrossCcyBasisHelper {
    /// Creates the helper. `fx_spot` is informational; the par spread does
    /// not depend on it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spread: f64,
        fx_spot: f64,
        as_of: Date,
        tenor: Period,
        convention: &CrossCcyBasisConvention,
        flat_index: &RateIndex,
        flat_curves: LegCurves,
        spread_index: &RateIndex,
        spread_curves: LegCurves,
    ) -> CurveResult<Self> {
        let calendar = &convention.settlement_calendar;
        let start = settlement(calendar, as_of, convention.settlement_days);
        let end = calendar.advance(start, tenor, convention.roll_convention, convention.eom)?;
        let flat = XccyLeg::floating(flat_index, convention.flat_tenor, convention.eom, start, end, flat_curves)?;
        let spread_leg = XccyLeg::floating(
            spread_index,
            convention.spread_tenor,
            convention.eom,
            start,
            end,
            spread_curves,
        )?;
        let reset = match (convention.is_resettable, convention.flat_index_is_resettable) {
            (false, _) => Reset::None,
            (true, true) => Reset::Other,
            (true, false) => Reset::Quoted,
        };
        let pillar = flat
            .last_date()
            .max(spread_leg.last_date())
            .unwrap_or(end);
        Ok(Self {
            spread,
            fx_spot,
            label: format!(
                "Cross currency basis {tenor} {}/{}",
                spread_index.name(),
                flat_index.name()
            ),
            flat,
            spread_leg,
            reset,
            pillar,
        })
    }
}

impl RateHelper for CrossCcyBasisHelper {
    fn pillar_date(&self) -> Date {
        self.pillar
    }

    fn quote(&self) -> f64 {
        self.spread
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        par_quote(&self.spread_leg, &self.flat, self.reset, curve)
    }

    fn description(&self) -> String {
        let reset = if self.reset == Reset::None { "" } else { " resetting" };
        format!("{}{reset} at spot {}", self.label, self.fx_spot)
    }
}

/// Fixed against float cross currency swap quoted as the fixed rate.
#[derive(Debug, Clone)]
pub struct CrossCcyFixFloatHelper {
    rate: f64,
    fx_spot: f64,
    label: String,
    fixed: XccyLeg,
    float: XccyLeg,
    reset: Reset,
    pillar: Date,
}

impl CrossCcyFixFloatHelper {
    /// Creates the helper. `fx_spot` is in fixed currency units per unit of
    /// float currency.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rate: f64,
        fx_spot: f64,
        as_of: Date,
        tenor: Period,
        convention: &CrossCcyFixFloatConvention,
        fixed_discount: CurveRef,
        float_index: &RateIndex,
        float_curves: LegCurves,
    ) -> CurveResult<Self> {
        let calendar = &convention.settlement_calendar;
        let start = settlement(calendar, as_of, convention.settlement_days);
        let end = calendar.advance(start, tenor, convention.settlement_convention, convention.eom)?;
        let rules = LegRules::new(
            frequency_tenor(convention.fixed_frequency)?,
            calendar.clone(),
            convention.fixed_convention,
            convention.fixed_day_counter,
        )
        .with_eom(convention.eom);
        let fixed = XccyLeg::fixed(&rules, start, end, fixed_discount)?;
        let float = XccyLeg::floating(float_index, None, convention.eom, start, end, float_curves)?;
        let reset = match (convention.is_resettable, convention.float_index_is_resettable) {
            (false, _) => Reset::None,
            (true, true) => Reset::Other,
            (true, false) => Reset::Quoted,
        };
        let pillar = fixed.last_date().max(float.last_date()).unwrap_or(end);
        Ok(Self {
            rate,
            fx_spot,
            label: format!(
                "Cross currency fix float {tenor} {} vs {}",
                convention.fixed_currency,
                float_index.name()
            ),
            fixed,
            float,
            reset,
            pillar,
        })
    }
}

impl RateHelper for CrossCcyFixFloatHelper {
    fn pillar_date(&self) -> Date {
        self.pillar
    }

    fn quote(&self) -> f64 {
        self.rate
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        par_quote(&self.fixed, &self.float, self.reset, curve)
    }

    fn description(&self) -> String {
        format!("{} at spot {}", self.label, self.fx_spot)
    }
}
