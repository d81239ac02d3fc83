//! Fixed-for-floating swap helpers: OIS, BRL CDI, vanilla Ibor swaps and
//! averaged overnight swaps.

use pillar_core::calendars::{BusinessDayConvention, Calendar, CalendarId};
use pillar_core::{Date, Period};

use super::legs::{
    annuity, averaged_overnight_pv, float_leg_pv, float_periods, frequency_tenor, growth,
    latest_date, single_fixings, Accrual, FloatPeriod, LegRules,
};
use super::{CurveRef, RateHelper};
use crate::conventions::{
    AverageOisConvention, IrSwapConvention, OisConvention, RateIndex, SubPeriodsCouponType,
};
use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

fn spot_date(calendar: &CalendarId, as_of: Date, lag: u32) -> Date {
    calendar.advance_business_days(calendar.adjust(as_of, BusinessDayConvention::Following), lag as i32)
}

fn fair_rate(float_pv: f64, annuity: f64, what: &str) -> CurveResult<f64> {
    if annuity.abs() < f64::EPSILON {
        return Err(CurveError::data(format!("{what} has a zero fixed leg annuity")));
    }
    Ok(float_pv / annuity)
}

/// Overnight index swap quoted as its fair fixed rate.
#[derive(Debug, Clone)]
pub struct OisHelper {
    rate: f64,
    label: String,
    fixed: Vec<Accrual>,
    float: Vec<FloatPeriod>,
    projection: CurveRef,
    discount: CurveRef,
    pillar: Date,
}

impl OisHelper {
    /// Builds the swap schedule from the convention.
    ///
    /// The index projects on its forwarding curve if it has one, otherwise
    /// on the curve being built.
    pub fn new(
        rate: f64,
        as_of: Date,
        tenor: Period,
        convention: &OisConvention,
        index: &RateIndex,
        discount: CurveRef,
    ) -> CurveResult<Self> {
        let calendar = convention
            .fixed_calendar
            .clone()
            .unwrap_or_else(|| index.calendar().clone());
        let start = spot_date(&calendar, as_of, convention.spot_lag);
        let end = calendar.advance(start, tenor, convention.fixed_convention, convention.eom)?;
        let coupon_tenor = convention.fixed_frequency.to_period().unwrap_or(tenor);
        let rules = LegRules::new(
            coupon_tenor,
            calendar,
            convention.fixed_convention,
            convention.fixed_day_counter,
        )
        .with_rule(convention.rule)
        .with_eom(convention.eom)
        .with_payment(convention.fixed_payment_convention, convention.payment_lag);
        let fixed = rules.accruals(start, end)?;
        let float = single_fixings(&fixed);
        let pillar = latest_date([fixed.as_slice()]).unwrap_or(end);
        Ok(Self {
            rate,
            label: format!("OIS {tenor} {}", index.name()),
            fixed,
            float,
            projection: CurveRef::projection(index),
            discount,
            pillar,
        })
    }
}

impl RateHelper for OisHelper {
    fn pillar_date(&self) -> Date {
        self.pillar
    }

    fn quote(&self) -> f64 {
        self.rate
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let discount = self.discount.resolve(curve);
        let float_pv = float_leg_pv(
            &self.float,
            self.projection.resolve(curve),
            discount,
            SubPeriodsCouponType::Compounding,
        )?;
        fair_rate(float_pv, annuity(&self.fixed, discount)?, &self.label)
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

/// Brazilian CDI swap: one zero coupon exchange at maturity, with the
/// fixed rate compounded over business days on a 252 day year.
#[derive(Debug, Clone)]
pub struct BrlCdiHelper {
    rate: f64,
    tenor: Period,
    start: Date,
    end: Date,
    business_days: i64,
    projection: CurveRef,
}

impl BrlCdiHelper {
    /// Creates the helper.
    pub fn new(rate: f64, as_of: Date, tenor: Period, convention: &OisConvention, index: &RateIndex) -> CurveResult<Self> {
        let calendar = index.calendar();
        let start = spot_date(calendar, as_of, convention.spot_lag);
        let end = calendar.advance(start, tenor, convention.fixed_convention, convention.eom)?;
        let business_days = calendar.business_days_between(start, end);
        if business_days <= 0 {
            return Err(CurveError::data(format!(
                "BRL CDI swap {tenor} has no business days between {start} and {end}"
            )));
        }
        Ok(Self {
            rate,
            tenor,
            start,
            end,
            business_days,
            projection: CurveRef::projection(index),
        })
    }
}

impl RateHelper for BrlCdiHelper {
    fn pillar_date(&self) -> Date {
        self.end
    }

    fn quote(&self) -> f64 {
        self.rate
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let g = growth(self.projection.resolve(curve), self.start, self.end)?;
        Ok(g.powf(252.0 / self.business_days as f64) - 1.0)
    }

    fn description(&self) -> String {
        format!("BRL CDI swap {} {} to {}", self.tenor, self.start, self.end)
    }
}

/// Fixed against Ibor swap, optionally with the floating coupon built
/// from compounded or averaged index sub-periods.
#[derive(Debug, Clone)]
pub struct SwapHelper {
    rate: f64,
    label: String,
    fixed: Vec<Accrual>,
    float: Vec<FloatPeriod>,
    coupon_type: SubPeriodsCouponType,
    projection: CurveRef,
    discount: CurveRef,
    pillar: Date,
}

impl SwapHelper {
    /// Builds both legs from spot.
    pub fn new(
        rate: f64,
        as_of: Date,
        tenor: Period,
        convention: &IrSwapConvention,
        index: &RateIndex,
        discount: CurveRef,
    ) -> CurveResult<Self> {
        let start = index.value_date(index.calendar().adjust(as_of, BusinessDayConvention::Following));
        let end = start.add_period(tenor, false)?;
        let fixed = LegRules::new(
            frequency_tenor(convention.fixed_frequency)?,
            convention.fixed_calendar.clone(),
            convention.fixed_convention,
            convention.fixed_day_counter,
        )
        .accruals(start, end)?;

        let index_rules = LegRules::for_index(index);
        let float = match convention.float_frequency {
            Some(frequency) => {
                let accruals = index_rules
                    .clone()
                    .with_tenor(frequency_tenor(frequency)?)
                    .accruals(start, end)?;
                float_periods(&accruals, Some(&index_rules))?
            }
            None => single_fixings(&index_rules.accruals(start, end)?),
        };
        let pillar = latest_date([fixed.as_slice()])
            .max(float.iter().map(|p| p.accrual.payment.max(p.accrual.end)).max())
            .unwrap_or(end);
        Ok(Self {
            rate,
            label: format!("Swap {tenor} {}", index.name()),
            fixed,
            float,
            coupon_type: convention.sub_periods_coupon_type,
            projection: CurveRef::projection(index),
            discount,
            pillar,
        })
    }
}

impl RateHelper for SwapHelper {
    fn pillar_date(&self) -> Date {
        self.pillar
    }

    fn quote(&self) -> f64 {
        self.rate
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let discount = self.discount.resolve(curve);
        let float_pv = float_leg_pv(&self.float, self.projection.resolve(curve), discount, self.coupon_type)?;
        fair_rate(float_pv, annuity(&self.fixed, discount)?, &self.label)
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

/// Fixed rate against an arithmetic average of overnight fixings plus a
/// quoted spread.
///
/// The daily average is approximated by the continuously compounded
/// forward over each period, so rate cut-off days are not modelled.
#[derive(Debug, Clone)]
pub struct AverageOisHelper {
    rate: f64,
    spread: f64,
    label: String,
    fixed: Vec<Accrual>,
    float: Vec<FloatPeriod>,
    projection: CurveRef,
    discount: CurveRef,
    pillar: Date,
}

impl AverageOisHelper {
    /// Creates the helper from the fixed rate and the basis spread quotes.
    pub fn new(
        rate: f64,
        spread: f64,
        as_of: Date,
        tenor: Period,
        convention: &AverageOisConvention,
        index: &RateIndex,
        discount: CurveRef,
    ) -> CurveResult<Self> {
        let start = spot_date(&convention.fixed_calendar, as_of, convention.spot_lag);
        let end = start.add_period(tenor, false)?;
        let fixed = LegRules::new(
            convention.fixed_tenor,
            convention.fixed_calendar.clone(),
            convention.fixed_convention,
            convention.fixed_day_counter,
        )
        .with_payment(convention.fixed_payment_convention, 0)
        .accruals(start, end)?;
        let float_accruals = LegRules::new(
            convention.on_tenor,
            index.calendar().clone(),
            convention.fixed_convention,
            index.day_counter(),
        )
        .with_payment(convention.fixed_payment_convention, 0)
        .accruals(start, end)?;
        let pillar = latest_date([fixed.as_slice(), float_accruals.as_slice()]).unwrap_or(end);
        Ok(Self {
            rate,
            spread,
            label: format!("Average OIS {tenor} {}", index.name()),
            fixed,
            float: single_fixings(&float_accruals),
            projection: CurveRef::projection(index),
            discount,
            pillar,
        })
    }

    /// Quoted basis spread over the averaged leg.
    pub fn spread(&self) -> f64 {
        self.spread
    }
}

impl RateHelper for AverageOisHelper {
    fn pillar_date(&self) -> Date {
        self.pillar
    }

    fn quote(&self) -> f64 {
        self.rate
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let discount = self.discount.resolve(curve);
        let averaged = averaged_overnight_pv(&self.float, self.projection.resolve(curve), discount)?;
        let accruals: Vec<Accrual> = self.float.iter().map(|p| p.accrual).collect();
        let spread_pv = self.spread * annuity(&accruals, discount)?;
        fair_rate(averaged + spread_pv, annuity(&self.fixed, discount)?, &self.label)
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::legs::simple_forward;
    use crate::helpers::test_support::{as_of, flat, flat_arc};
    use approx::assert_relative_eq;
    use pillar_core::daycounts::{DayCount, DayCountConvention};
    use pillar_core::schedule::DateGenerationRule;
    use pillar_core::types::Frequency;

    fn ois_convention() -> OisConvention {
        OisConvention {
            id: "EUR-OIS-CONVENTIONS".into(),
            index: "EUR-ESTER".into(),
            spot_lag: 2,
            fixed_day_counter: DayCountConvention::Act360,
            payment_lag: 1,
            eom: false,
            fixed_frequency: Frequency::Annual,
            fixed_convention: BusinessDayConvention::ModifiedFollowing,
            fixed_payment_convention: BusinessDayConvention::Following,
            rule: DateGenerationRule::Backward,
            fixed_calendar: None,
        }
    }

    #[test]
    fn test_one_period_ois_is_simple_forward() {
        let index = RateIndex::parse("EUR-ESTER").unwrap();
        let h = OisHelper::new(0.03, as_of(), Period::years(1), &ois_convention(), &index, CurveRef::Building)
            .unwrap();
        // Payment lag pushes the pillar past the accrual end.
        assert_eq!(h.pillar_date(), Date::from_ymd(2025, 1, 20).unwrap());

        let curve = flat(0.03);
        let start = Date::from_ymd(2024, 1, 17).unwrap();
        let end = Date::from_ymd(2025, 1, 17).unwrap();
        let tau = DayCountConvention::Act360.year_fraction_f64(start, end);
        assert_relative_eq!(
            h.implied_quote(&curve).unwrap(),
            simple_forward(&curve, start, end, tau).unwrap(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_ois_fair_rate_is_curve_level() {
        let index = RateIndex::parse("EUR-ESTER").unwrap();
        let h = OisHelper::new(0.03, as_of(), Period::years(10), &ois_convention(), &index, CurveRef::Building)
            .unwrap();
        let implied = h.implied_quote(&flat(0.03)).unwrap();
        // Annual Act/360 equivalent of 3% continuous Act/365.
        assert!((implied - 0.0300).abs() < 1e-3, "{implied}");
    }

    #[test]
    fn test_brl_cdi() {
        let index = RateIndex::parse("BRL-CDI").unwrap();
        let mut convention = ois_convention();
        convention.spot_lag = 0;
        let h = BrlCdiHelper::new(0.1, as_of(), Period::years(2), &convention, &index).unwrap();
        let implied = h.implied_quote(&flat(0.10)).unwrap();
        assert!(implied > 0.10 && implied < 0.11, "{implied}");
    }

    fn swap_convention(float_frequency: Option<Frequency>) -> IrSwapConvention {
        IrSwapConvention {
            id: "USD-3M-SWAP".into(),
            fixed_calendar: CalendarId::UnitedStates,
            fixed_frequency: Frequency::Semiannual,
            fixed_convention: BusinessDayConvention::ModifiedFollowing,
            fixed_day_counter: DayCountConvention::Thirty360US,
            index: "USD-LIBOR-3M".into(),
            float_frequency,
            sub_periods_coupon_type: SubPeriodsCouponType::Compounding,
        }
    }

    #[test]
    fn test_swap_with_external_discount() {
        let index = RateIndex::parse("USD-LIBOR-3M").unwrap();
        let convention = swap_convention(None);
        let h = SwapHelper::new(0.04, as_of(), Period::years(5), &convention, &index, CurveRef::External(flat_arc(0.03)))
            .unwrap();
        let low = h.implied_quote(&flat(0.03)).unwrap();
        let high = h.implied_quote(&flat(0.05)).unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_sub_period_swap_compounds_above_plain() {
        let index = RateIndex::parse("USD-LIBOR-3M").unwrap();
        let plain = SwapHelper::new(0.04, as_of(), Period::years(5), &swap_convention(None), &index, CurveRef::Building)
            .unwrap();
        let compounded = SwapHelper::new(
            0.04,
            as_of(),
            Period::years(5),
            &swap_convention(Some(Frequency::Semiannual)),
            &index,
            CurveRef::Building,
        )
        .unwrap();
        let curve = flat(0.04);
        let a = plain.implied_quote(&curve).unwrap();
        let b = compounded.implied_quote(&curve).unwrap();
        assert!(compounded.float.iter().all(|p| p.fixings.len() >= 2));
        // Compounding telescopes, so both legs project the same growth.
        assert_relative_eq!(a, b, epsilon = 1e-4);
    }

    #[test]
    fn test_average_ois_spread_shifts_rate() {
        let index = RateIndex::parse("USD-FEDFUNDS").unwrap();
        let convention = AverageOisConvention {
            id: "USD-AVG-OIS".into(),
            spot_lag: 2,
            fixed_tenor: Period::months(6),
            fixed_day_counter: DayCountConvention::Act360,
            fixed_calendar: CalendarId::UnitedStates,
            fixed_convention: BusinessDayConvention::ModifiedFollowing,
            fixed_payment_convention: BusinessDayConvention::ModifiedFollowing,
            index: "USD-FEDFUNDS".into(),
            on_tenor: Period::months(3),
            rate_cutoff: 2,
        };
        let curve = flat(0.03);
        let zero = AverageOisHelper::new(0.03, 0.0, as_of(), Period::years(3), &convention, &index, CurveRef::Building)
            .unwrap();
        let wide = AverageOisHelper::new(0.03, 0.002, as_of(), Period::years(3), &convention, &index, CurveRef::Building)
            .unwrap();
        let diff = wide.implied_quote(&curve).unwrap() - zero.implied_quote(&curve).unwrap();
        assert_relative_eq!(diff, 0.002, epsilon = 1e-4);
        assert_relative_eq!(wide.spread(), 0.002);
    }
}
