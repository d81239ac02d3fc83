//! Single currency basis helpers.

use pillar_core::calendars::{BusinessDayConvention, Calendar};
use pillar_core::{Date, Period};

use super::legs::{annuity, float_leg_pv, float_periods, latest_date, single_fixings, Accrual, FloatPeriod, LegRules};
use super::swaps::SwapHelper;
use super::{CurveRef, RateHelper};
use crate::conventions::{
    BmaBasisSwapConvention, IrSwapConvention, RateIndex, SubPeriodsCouponType, TenorBasisSwapConvention,
    TenorBasisTwoSwapConvention,
};
use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

fn index_spot(index: &RateIndex, as_of: Date) -> Date {
    index.value_date(index.calendar().adjust(as_of, BusinessDayConvention::Following))
}

fn accrual_dates(periods: &[FloatPeriod]) -> Vec<Accrual> {
    periods.iter().map(|p| p.accrual).collect()
}

fn last_payment(periods: &[FloatPeriod]) -> Option<Date> {
    latest_date([accrual_dates(periods).as_slice()])
}

/// Float against float swap in one currency, quoted as the spread over
/// one of the legs.
#[derive(Debug, Clone)]
pub struct TenorBasisHelper {
    spread: f64,
    label: String,
    long: Vec<FloatPeriod>,
    short: Vec<FloatPeriod>,
    short_coupon_type: SubPeriodsCouponType,
    spread_on_short: bool,
    long_projection: CurveRef,
    short_projection: CurveRef,
    discount: CurveRef,
    pillar: Date,
}

impl TenorBasisHelper {
    /// Ibor against Ibor, the short leg optionally paying at
    /// `short_pay_tenor` with compounded or averaged sub-periods.
    pub fn new(
        spread: f64,
        as_of: Date,
        tenor: Period,
        convention: &TenorBasisSwapConvention,
        long_index: &RateIndex,
        short_index: &RateIndex,
        discount: CurveRef,
    ) -> CurveResult<Self> {
        let start = index_spot(long_index, as_of);
        let end = start.add_period(tenor, false)?;
        let long = single_fixings(&LegRules::for_index(long_index).accruals(start, end)?);

        let short_rules = LegRules::for_index(short_index);
        let pay_tenor = convention.short_pay_tenor.unwrap_or(short_index.tenor());
        let short_accruals = short_rules.clone().with_tenor(pay_tenor).accruals(start, end)?;
        let short = float_periods(&short_accruals, Some(&short_rules))?;
        Self::assemble(
            spread,
            format!("Tenor basis {tenor} {}/{}", long_index.name(), short_index.name()),
            long,
            short,
            convention.sub_periods_coupon_type,
            convention.spread_on_short,
            long_index,
            short_index,
            discount,
        )
    }

    /// Ibor against compounded overnight paying at the Ibor tenor, with
    /// the spread on the overnight leg.
    pub fn overnight(
        spread: f64,
        as_of: Date,
        tenor: Period,
        long_index: &RateIndex,
        overnight_index: &RateIndex,
        discount: CurveRef,
    ) -> CurveResult<Self> {
        let start = index_spot(long_index, as_of);
        let end = start.add_period(tenor, false)?;
        let long = single_fixings(&LegRules::for_index(long_index).accruals(start, end)?);
        let short = single_fixings(
            &LegRules::for_index(overnight_index)
                .with_tenor(long_index.tenor())
                .accruals(start, end)?,
        );
        Self::assemble(
            spread,
            format!("OIBS {tenor} {}/{}", long_index.name(), overnight_index.name()),
            long,
            short,
            SubPeriodsCouponType::Compounding,
            true,
            long_index,
            overnight_index,
            discount,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        spread: f64,
        label: String,
        long: Vec<FloatPeriod>,
        short: Vec<FloatPeriod>,
        short_coupon_type: SubPeriodsCouponType,
        spread_on_short: bool,
        long_index: &RateIndex,
        short_index: &RateIndex,
        discount: CurveRef,
    ) -> CurveResult<Self> {
        let pillar = last_payment(&long)
            .max(last_payment(&short))
            .ok_or_else(|| CurveError::data(format!("{label} has no coupons")))?;
        Ok(Self {
            spread,
            label,
            long,
            short,
            short_coupon_type,
            spread_on_short,
            long_projection: CurveRef::projection(long_index),
            short_projection: CurveRef::projection(short_index),
            discount,
            pillar,
        })
    }
}

impl RateHelper for TenorBasisHelper {
    fn pillar_date(&self) -> Date {
        self.pillar
    }

    fn quote(&self) -> f64 {
        self.spread
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let discount = self.discount.resolve(curve);
        let long_pv = float_leg_pv(
            &self.long,
            self.long_projection.resolve(curve),
            discount,
            SubPeriodsCouponType::Compounding,
        )?;
        let short_pv = float_leg_pv(
            &self.short,
            self.short_projection.resolve(curve),
            discount,
            self.short_coupon_type,
        )?;
        let (spread_leg, gap) = if self.spread_on_short {
            (&self.short, long_pv - short_pv)
        } else {
            (&self.long, short_pv - long_pv)
        };
        let bps = annuity(&accrual_dates(spread_leg), discount)?;
        if bps.abs() < f64::EPSILON {
            return Err(CurveError::data(format!("{} has a zero spread leg annuity", self.label)));
        }
        Ok(gap / bps)
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

/// Difference of the fair rates of two fixed against Ibor swaps.
#[derive(Debug, Clone)]
pub struct BasisTwoSwapHelper {
    spread: f64,
    long: SwapHelper,
    short: SwapHelper,
    long_minus_short: bool,
    tenor: Period,
}

impl BasisTwoSwapHelper {
    /// Creates both swaps; each index projects on its forwarding curve if
    /// it has one.
    pub fn new(
        spread: f64,
        as_of: Date,
        tenor: Period,
        convention: &TenorBasisTwoSwapConvention,
        long_index: &RateIndex,
        short_index: &RateIndex,
        discount: CurveRef,
    ) -> CurveResult<Self> {
        let leg = |frequency, roll, day_counter, index: &RateIndex| IrSwapConvention {
            id: convention.id.clone(),
            fixed_calendar: convention.calendar.clone(),
            fixed_frequency: frequency,
            fixed_convention: roll,
            fixed_day_counter: day_counter,
            index: index.name().to_string(),
            float_frequency: None,
            sub_periods_coupon_type: SubPeriodsCouponType::Compounding,
        };
        let long_convention = leg(
            convention.long_fixed_frequency,
            convention.long_fixed_convention,
            convention.long_fixed_day_counter,
            long_index,
        );
        let short_convention = leg(
            convention.short_fixed_frequency,
            convention.short_fixed_convention,
            convention.short_fixed_day_counter,
            short_index,
        );
        Ok(Self {
            spread,
            long: SwapHelper::new(0.0, as_of, tenor, &long_convention, long_index, discount.clone())?,
            short: SwapHelper::new(0.0, as_of, tenor, &short_convention, short_index, discount)?,
            long_minus_short: convention.long_minus_short,
            tenor,
        })
    }
}

impl RateHelper for BasisTwoSwapHelper {
    fn pillar_date(&self) -> Date {
        self.long.pillar_date().max(self.short.pillar_date())
    }

    fn quote(&self) -> f64 {
        self.spread
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let diff = self.long.implied_quote(curve)? - self.short.implied_quote(curve)?;
        Ok(if self.long_minus_short { diff } else { -diff })
    }

    fn description(&self) -> String {
        format!("Basis two swap {} ({} vs {})", self.tenor, self.long.description(), self.short.description())
    }
}

/// Ratio of a weekly averaged BMA leg to a Libor leg.
///
/// The Libor leg projects on its own curve; the BMA leg projects on and
/// both legs discount on the curve being built.
#[derive(Debug, Clone)]
pub struct BmaSwapHelper {
    ratio: f64,
    label: String,
    libor: Vec<FloatPeriod>,
    bma: Vec<FloatPeriod>,
    libor_projection: CurveRef,
    pillar: Date,
}

impl BmaSwapHelper {
    /// Both legs pay at the Libor tenor.
    pub fn new(
        ratio: f64,
        as_of: Date,
        tenor: Period,
        convention: &BmaBasisSwapConvention,
        libor_index: &RateIndex,
        bma_index: &RateIndex,
    ) -> CurveResult<Self> {
        let start = index_spot(libor_index, as_of);
        let end = libor_index
            .calendar()
            .advance(start, tenor, libor_index.convention(), libor_index.end_of_month())?;
        let libor_rules = LegRules::for_index(libor_index);
        let libor = single_fixings(&libor_rules.accruals(start, end)?);
        let bma_rules = LegRules::for_index(bma_index);
        let bma_accruals = bma_rules.clone().with_tenor(libor_index.tenor()).accruals(start, end)?;
        let bma = float_periods(&bma_accruals, Some(&bma_rules))?;
        let label = format!("BMA basis {tenor} {}", convention.id);
        let pillar = last_payment(&libor)
            .max(last_payment(&bma))
            .ok_or_else(|| CurveError::data(format!("{label} has no coupons")))?;
        Ok(Self {
            ratio,
            label,
            libor,
            bma,
            libor_projection: CurveRef::projection(libor_index),
            pillar,
        })
    }
}

impl RateHelper for BmaSwapHelper {
    fn pillar_date(&self) -> Date {
        self.pillar
    }

    fn quote(&self) -> f64 {
        self.ratio
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let libor_pv = float_leg_pv(
            &self.libor,
            self.libor_projection.resolve(curve),
            curve,
            SubPeriodsCouponType::Compounding,
        )?;
        if libor_pv.abs() < f64::EPSILON {
            return Err(CurveError::data(format!("{} has a zero Libor leg value", self.label)));
        }
        let bma_pv = float_leg_pv(&self.bma, curve, curve, SubPeriodsCouponType::Averaging)?;
        Ok(bma_pv / libor_pv)
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}
