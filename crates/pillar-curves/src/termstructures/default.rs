//! Default (credit) term structures.

use std::fmt;

use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::Date;
use pillar_math::interpolation::{Interpolator, LogLinearInterpolator};

use crate::error::{CurveError, CurveResult};

/// Survival probabilities over time.
pub trait DefaultTermStructure: Send + Sync {
    /// The date at which `t = 0`.
    fn reference_date(&self) -> Date;

    /// Day counter converting dates to times.
    fn day_counter(&self) -> DayCountConvention;

    /// Probability of no default before `t`.
    fn survival_probability(&self, t: f64) -> f64;

    /// Probability of no default before `date`.
    fn survival_probability_date(&self, date: Date) -> f64 {
        let t = self
            .day_counter()
            .year_fraction_f64(self.reference_date(), date);
        self.survival_probability(t)
    }
}

/// Constant hazard rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatHazardCurve {
    reference_date: Date,
    hazard_rate: f64,
    day_counter: DayCountConvention,
}

impl FlatHazardCurve {
    /// Creates a flat hazard curve.
    pub fn new(reference_date: Date, hazard_rate: f64, day_counter: DayCountConvention) -> Self {
        Self {
            reference_date,
            hazard_rate,
            day_counter,
        }
    }
}

impl DefaultTermStructure for FlatHazardCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn survival_probability(&self, t: f64) -> f64 {
        (-self.hazard_rate * t.max(0.0)).exp()
    }
}

/// Survival probabilities log-linearly interpolated between dates, with a
/// flat hazard rate beyond the last date.
pub struct InterpolatedSurvivalCurve {
    reference_date: Date,
    day_counter: DayCountConvention,
    dates: Vec<Date>,
    interpolator: LogLinearInterpolator,
}

impl fmt::Debug for InterpolatedSurvivalCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolatedSurvivalCurve")
            .field("reference_date", &self.reference_date)
            .field("dates", &self.dates)
            .finish_non_exhaustive()
    }
}

impl InterpolatedSurvivalCurve {
    /// Creates a curve through `(date, probability)` points. The reference
    /// date is prepended with probability one.
    pub fn new(
        reference_date: Date,
        points: &[(Date, f64)],
        day_counter: DayCountConvention,
    ) -> CurveResult<Self> {
        let mut dates = vec![reference_date];
        let mut probabilities = vec![1.0];
        for (date, p) in points {
            if *date <= reference_date {
                continue;
            }
            if !(*p > 0.0 && *p <= 1.0) {
                return Err(CurveError::data(format!(
                    "survival probability {p} at {date} is not in (0, 1]"
                )));
            }
            dates.push(*date);
            probabilities.push(*p);
        }
        let times: Vec<f64> = dates
            .iter()
            .map(|d| day_counter.year_fraction_f64(reference_date, *d))
            .collect();
        let interpolator = LogLinearInterpolator::new(times, probabilities)?;
        Ok(Self {
            reference_date,
            day_counter,
            dates,
            interpolator,
        })
    }
}

impl DefaultTermStructure for InterpolatedSurvivalCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn survival_probability(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        self.interpolator.interpolate(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_hazard() {
        let as_of = Date::from_ymd(2024, 1, 15).unwrap();
        let c = FlatHazardCurve::new(as_of, 0.02, DayCountConvention::Act365Fixed);
        assert_relative_eq!(c.survival_probability(2.0), (-0.04f64).exp());
        assert_eq!(c.survival_probability(0.0), 1.0);
    }

    #[test]
    fn test_interpolated_survival_flat_hazard_tail() {
        let as_of = Date::from_ymd(2024, 1, 15).unwrap();
        let dc = DayCountConvention::Act365Fixed;
        let d1 = Date::from_ymd(2025, 1, 15).unwrap();
        let d2 = Date::from_ymd(2029, 1, 15).unwrap();
        let h = 0.01;
        let t1 = dc.year_fraction_f64(as_of, d1);
        let t2 = dc.year_fraction_f64(as_of, d2);
        let c = InterpolatedSurvivalCurve::new(
            as_of,
            &[(d1, (-h * t1).exp()), (d2, (-h * t2).exp())],
            dc,
        )
        .unwrap();
        assert_relative_eq!(c.survival_probability(3.0), (-h * 3.0).exp(), epsilon = 1e-12);
        assert_relative_eq!(c.survival_probability(10.0), (-h * 10.0).exp(), epsilon = 1e-12);
        assert!(InterpolatedSurvivalCurve::new(as_of, &[(d1, 1.5)], dc).is_err());
    }
}
