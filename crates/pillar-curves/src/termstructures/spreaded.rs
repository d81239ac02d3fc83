//! Zero-spreaded curve.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::types::{Compounding, Frequency};
use pillar_core::Date;

use super::{InterestRate, YieldTermStructure, ZERO_TIME_STEP};
use crate::error::{CurveError, CurveResult};

/// A reference curve plus a piecewise linear zero spread.
///
/// The spread is added to the reference zero rate quoted with the given
/// compounding and frequency, and held flat outside the spread dates.
pub struct ZeroSpreadedCurve {
    reference: Arc<dyn YieldTermStructure>,
    dates: Vec<Date>,
    times: Vec<f64>,
    spreads: Vec<f64>,
    compounding: Compounding,
    frequency: Frequency,
    extrapolate: bool,
}

impl fmt::Debug for ZeroSpreadedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroSpreadedCurve")
            .field("dates", &self.dates)
            .field("spreads", &self.spreads)
            .field("compounding", &self.compounding)
            .field("frequency", &self.frequency)
            .finish_non_exhaustive()
    }
}

impl ZeroSpreadedCurve {
    /// Creates the curve from `(date, spread)` points in increasing date order.
    pub fn new(
        reference: Arc<dyn YieldTermStructure>,
        points: &[(Date, f64)],
        compounding: Compounding,
        frequency: Frequency,
    ) -> CurveResult<Self> {
        if points.is_empty() {
            return Err(CurveError::data("zero spreaded curve needs at least one spread"));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(CurveError::data(format!(
                "spread dates must increase: {} followed by {}",
                w[0].0, w[1].0
            )));
        }
        let dates: Vec<Date> = points.iter().map(|(d, _)| *d).collect();
        let times = dates.iter().map(|d| reference.time_from_reference(*d)).collect();
        let spreads = points.iter().map(|(_, s)| *s).collect();
        Ok(Self {
            reference,
            dates,
            times,
            spreads,
            compounding,
            frequency,
            extrapolate: true,
        })
    }

    /// Sets whether queries beyond the last date are allowed.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Spread at time `t`.
    pub fn spread(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.spreads[0];
        }
        if t >= self.times[n - 1] {
            return self.spreads[n - 1];
        }
        let i = self.times.partition_point(|&x| x <= t);
        let (t0, t1) = (self.times[i - 1], self.times[i]);
        let (s0, s1) = (self.spreads[i - 1], self.spreads[i]);
        s0 + (s1 - s0) * (t - t0) / (t1 - t0)
    }
}

impl YieldTermStructure for ZeroSpreadedCurve {
    fn reference_date(&self) -> Date {
        self.reference.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.reference.day_counter()
    }

    fn max_time(&self) -> f64 {
        self.reference.max_time()
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    fn pillar_dates(&self) -> Vec<Date> {
        let mut dates = vec![self.reference_date()];
        dates.extend(self.dates.iter().filter(|d| **d > self.reference_date()));
        dates
    }

    fn discount_impl(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        let tz = t.max(ZERO_TIME_STEP);
        let base = InterestRate::implied_rate(
            1.0 / self.reference.discount_impl(tz),
            self.day_counter(),
            self.compounding,
            self.frequency,
            tz,
        );
        let Ok(base) = base else {
            return f64::NAN;
        };
        let spreaded = InterestRate::new(
            base.rate + self.spread(t),
            base.day_counter,
            self.compounding,
            self.frequency,
        );
        spreaded.discount_factor(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termstructures::FlatForward;
    use approx::assert_relative_eq;

    #[test]
    fn test_continuous_spread_adds_to_zero() {
        let as_of = Date::from_ymd(2024, 1, 15).unwrap();
        let base = Arc::new(FlatForward::new(as_of, 0.03, DayCountConvention::Act365Fixed));
        let curve = ZeroSpreadedCurve::new(
            base,
            &[
                (Date::from_ymd(2025, 1, 15).unwrap(), 0.01),
                (Date::from_ymd(2029, 1, 15).unwrap(), 0.02),
            ],
            Compounding::Continuous,
            Frequency::Annual,
        )
        .unwrap();
        assert_relative_eq!(curve.discount(0.5).unwrap(), (-0.04f64 * 0.5).exp(), epsilon = 1e-12);
        assert_relative_eq!(curve.discount(10.0).unwrap(), (-0.05f64 * 10.0).exp(), epsilon = 1e-12);
        assert_eq!(curve.discount(0.0).unwrap(), 1.0);
        let t1 = curve.time_from_reference(Date::from_ymd(2025, 1, 15).unwrap());
        let t2 = curve.time_from_reference(Date::from_ymd(2029, 1, 15).unwrap());
        let mid = 0.5 * (t1 + t2);
        assert_relative_eq!(curve.spread(mid), 0.015, epsilon = 1e-12);
    }

    #[test]
    fn test_annual_spread() {
        let as_of = Date::from_ymd(2024, 1, 15).unwrap();
        let base = Arc::new(FlatForward::new(as_of, 1.03f64.ln(), DayCountConvention::Act365Fixed));
        let curve = ZeroSpreadedCurve::new(
            base,
            &[(Date::from_ymd(2030, 1, 15).unwrap(), 0.01)],
            Compounding::Compounded,
            Frequency::Annual,
        )
        .unwrap();
        assert_relative_eq!(curve.discount(2.0).unwrap(), 1.04f64.powf(-2.0), epsilon = 1e-12);
    }
}
