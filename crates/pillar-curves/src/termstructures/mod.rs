//! Yield and default term structures.
//!
//! Every yield curve implements [`YieldTermStructure`]: an unchecked
//! `discount_impl(t)` plus a handful of metadata methods. Range checks,
//! date conversion and rate quoting are provided on top of it.

mod composite;
mod default;
mod fitted;
mod flat;
mod interpolated;
mod spreaded;

pub use composite::{
    DiscountRatioCurve, IborFallbackCurve, WeightedAverageCurve, WeightedDefaultCurve,
    YieldPlusDefaultCurve,
};
pub use default::{DefaultTermStructure, FlatHazardCurve, InterpolatedSurvivalCurve};
pub use fitted::{FittedBondDiscountCurve, FittingMethod};
pub use flat::FlatForward;
pub use interpolated::{make_interpolator, InterpolatedCurve};
pub use spreaded::ZeroSpreadedCurve;

use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::types::{Compounding, Frequency};
use pillar_core::Date;

use crate::error::{CurveError, CurveResult};

/// Time step used where a rate is requested at `t = 0`.
pub(crate) const ZERO_TIME_STEP: f64 = 1.0e-4;

/// A curve of discount factors over time.
pub trait YieldTermStructure: Send + Sync {
    /// The date at which `t = 0`.
    fn reference_date(&self) -> Date;

    /// Day counter converting dates to times.
    fn day_counter(&self) -> DayCountConvention;

    /// Last time covered by the curve data.
    fn max_time(&self) -> f64;

    /// Whether queries beyond [`max_time`](Self::max_time) are allowed.
    fn allows_extrapolation(&self) -> bool;

    /// Discount factor at `t` without range checks.
    fn discount_impl(&self, t: f64) -> f64;

    /// Dates the curve was calibrated to, if any.
    fn pillar_dates(&self) -> Vec<Date> {
        Vec::new()
    }

    /// Fails for negative times, and for times beyond the curve when
    /// extrapolation is off.
    fn check_range(&self, t: f64) -> CurveResult<()> {
        if !t.is_finite() || t < 0.0 {
            return Err(CurveError::interpolation(format!(
                "negative time ({t}) given"
            )));
        }
        if t > self.max_time() && !self.allows_extrapolation() {
            return Err(CurveError::interpolation(format!(
                "time ({t}) is past max curve time ({})",
                self.max_time()
            )));
        }
        Ok(())
    }

    /// Discount factor at `t`.
    fn discount(&self, t: f64) -> CurveResult<f64> {
        self.check_range(t)?;
        Ok(self.discount_impl(t))
    }

    /// Time from the reference date to `date`.
    fn time_from_reference(&self, date: Date) -> f64 {
        self.day_counter()
            .year_fraction_f64(self.reference_date(), date)
    }

    /// Discount factor at a date.
    fn discount_date(&self, date: Date) -> CurveResult<f64> {
        self.discount(self.time_from_reference(date))
    }

    /// Zero rate to a date, quoted with the given conventions.
    fn zero_rate(
        &self,
        date: Date,
        day_counter: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> CurveResult<InterestRate> {
        let reference = self.reference_date();
        if date == reference {
            let compound = 1.0 / self.discount(ZERO_TIME_STEP)?;
            return InterestRate::implied_rate(
                compound,
                day_counter,
                compounding,
                frequency,
                ZERO_TIME_STEP,
            );
        }
        let compound = 1.0 / self.discount_date(date)?;
        let t = day_counter.year_fraction_f64(reference, date);
        InterestRate::implied_rate(compound, day_counter, compounding, frequency, t)
    }

    /// Zero rate to time `t`, in the curve's day counter.
    fn zero_rate_time(
        &self,
        t: f64,
        compounding: Compounding,
        frequency: Frequency,
    ) -> CurveResult<InterestRate> {
        let t = if t == 0.0 { ZERO_TIME_STEP } else { t };
        let compound = 1.0 / self.discount(t)?;
        InterestRate::implied_rate(compound, self.day_counter(), compounding, frequency, t)
    }

    /// Simply compounded forward rate between two dates.
    fn forward_rate(&self, start: Date, end: Date, day_counter: DayCountConvention) -> CurveResult<f64> {
        let tau = day_counter.year_fraction_f64(start, end);
        if tau <= 0.0 {
            return Err(CurveError::data(format!(
                "forward period {start} to {end} is empty"
            )));
        }
        let p1 = self.discount_date(start)?;
        let p2 = self.discount_date(end)?;
        Ok((p1 / p2 - 1.0) / tau)
    }

    /// Instantaneous forward rate at `t`.
    fn instantaneous_forward(&self, t: f64) -> CurveResult<f64> {
        let h = ZERO_TIME_STEP;
        if t > h {
            let p1 = self.discount(t - h)?;
            let p2 = self.discount(t + h)?;
            Ok((p1.ln() - p2.ln()) / (2.0 * h))
        } else {
            let p1 = self.discount(t)?;
            let p2 = self.discount(t + h)?;
            Ok((p1.ln() - p2.ln()) / h)
        }
    }
}

/// A rate with its quoting conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestRate {
    /// Rate in decimal.
    pub rate: f64,
    /// Day counter.
    pub day_counter: DayCountConvention,
    /// Compounding.
    pub compounding: Compounding,
    /// Compounding frequency.
    pub frequency: Frequency,
}

impl InterestRate {
    /// Creates a rate.
    pub fn new(
        rate: f64,
        day_counter: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Self {
        Self {
            rate,
            day_counter,
            compounding,
            frequency,
        }
    }

    fn periods(frequency: Frequency) -> f64 {
        f64::from(frequency.periods_per_year().unwrap_or(1))
    }

    /// Growth of one unit over time `t`.
    pub fn compound_factor(&self, t: f64) -> f64 {
        let r = self.rate;
        let f = Self::periods(self.frequency);
        match self.compounding {
            Compounding::Simple => 1.0 + r * t,
            Compounding::Compounded => (1.0 + r / f).powf(f * t),
            Compounding::Continuous => (r * t).exp(),
            Compounding::SimpleThenCompounded => {
                if t <= 1.0 / f {
                    1.0 + r * t
                } else {
                    (1.0 + r / f).powf(f * t)
                }
            }
        }
    }

    /// Growth of one unit between two dates.
    pub fn compound_factor_dates(&self, start: Date, end: Date) -> f64 {
        self.compound_factor(self.day_counter.year_fraction_f64(start, end))
    }

    /// Discount factor over time `t`.
    pub fn discount_factor(&self, t: f64) -> f64 {
        1.0 / self.compound_factor(t)
    }

    /// The rate that grows one unit to `compound` over time `t`.
    pub fn implied_rate(
        compound: f64,
        day_counter: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
        t: f64,
    ) -> CurveResult<Self> {
        if !(compound > 0.0) {
            return Err(CurveError::data(format!(
                "positive compound factor required, got {compound}"
            )));
        }
        let rate = if compound == 1.0 {
            if t < 0.0 {
                return Err(CurveError::data(format!("non-negative time required, got {t}")));
            }
            0.0
        } else {
            if !(t > 0.0) {
                return Err(CurveError::data(format!("positive time required, got {t}")));
            }
            let f = Self::periods(frequency);
            match compounding {
                Compounding::Simple => (compound - 1.0) / t,
                Compounding::Compounded => (compound.powf(1.0 / (f * t)) - 1.0) * f,
                Compounding::Continuous => compound.ln() / t,
                Compounding::SimpleThenCompounded => {
                    if t <= 1.0 / f {
                        (compound - 1.0) / t
                    } else {
                        (compound.powf(1.0 / (f * t)) - 1.0) * f
                    }
                }
            }
        };
        Ok(Self::new(rate, day_counter, compounding, frequency))
    }

    /// The same growth over time `t` quoted with other conventions.
    pub fn equivalent_rate(
        &self,
        compounding: Compounding,
        frequency: Frequency,
        t: f64,
    ) -> CurveResult<Self> {
        Self::implied_rate(
            self.compound_factor(t),
            self.day_counter,
            compounding,
            frequency,
            t,
        )
    }
}
