//! Curves derived from other curves.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;

use super::{DefaultTermStructure, YieldTermStructure};
use crate::error::{CurveError, CurveResult};

/// `base(t) * numerator(t) / denominator(t)`.
pub struct DiscountRatioCurve {
    base: Arc<dyn YieldTermStructure>,
    numerator: Arc<dyn YieldTermStructure>,
    denominator: Arc<dyn YieldTermStructure>,
    extrapolate: bool,
}

impl fmt::Debug for DiscountRatioCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscountRatioCurve")
            .field("reference_date", &self.base.reference_date())
            .finish_non_exhaustive()
    }
}

impl DiscountRatioCurve {
    /// Creates the ratio curve. All three inputs must share a reference date.
    pub fn new(
        base: Arc<dyn YieldTermStructure>,
        numerator: Arc<dyn YieldTermStructure>,
        denominator: Arc<dyn YieldTermStructure>,
    ) -> CurveResult<Self> {
        let reference = base.reference_date();
        for (what, curve) in [("numerator", &numerator), ("denominator", &denominator)] {
            if curve.reference_date() != reference {
                return Err(CurveError::data(format!(
                    "{what} curve reference date {} differs from base curve reference date {reference}",
                    curve.reference_date()
                )));
            }
        }
        Ok(Self {
            base,
            numerator,
            denominator,
            extrapolate: true,
        })
    }

    /// Sets whether queries beyond the base curve are allowed.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }
}

impl YieldTermStructure for DiscountRatioCurve {
    fn reference_date(&self) -> Date {
        self.base.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.base.day_counter()
    }

    fn max_time(&self) -> f64 {
        self.base.max_time()
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    fn pillar_dates(&self) -> Vec<Date> {
        self.base.pillar_dates()
    }

    fn discount_impl(&self, t: f64) -> f64 {
        self.base.discount_impl(t) * self.numerator.discount_impl(t)
            / self.denominator.discount_impl(t)
    }
}

/// `P1(t)^w1 * P2(t)^w2`.
pub struct WeightedAverageCurve {
    curve1: Arc<dyn YieldTermStructure>,
    curve2: Arc<dyn YieldTermStructure>,
    weight1: f64,
    weight2: f64,
    extrapolate: bool,
}

impl fmt::Debug for WeightedAverageCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedAverageCurve")
            .field("weight1", &self.weight1)
            .field("weight2", &self.weight2)
            .finish_non_exhaustive()
    }
}

impl WeightedAverageCurve {
    /// Creates the weighted curve.
    pub fn new(
        curve1: Arc<dyn YieldTermStructure>,
        curve2: Arc<dyn YieldTermStructure>,
        weight1: f64,
        weight2: f64,
    ) -> Self {
        Self {
            curve1,
            curve2,
            weight1,
            weight2,
            extrapolate: true,
        }
    }

    /// Sets whether queries beyond the inputs are allowed.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }
}

impl YieldTermStructure for WeightedAverageCurve {
    fn reference_date(&self) -> Date {
        self.curve1.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.curve1.day_counter()
    }

    fn max_time(&self) -> f64 {
        self.curve1.max_time().min(self.curve2.max_time())
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    fn discount_impl(&self, t: f64) -> f64 {
        self.curve1.discount_impl(t).powf(self.weight1) * self.curve2.discount_impl(t).powf(self.weight2)
    }
}

/// A credit curve entering [`YieldPlusDefaultCurve`].
#[derive(Clone)]
pub struct WeightedDefaultCurve {
    /// Survival curve.
    pub curve: Arc<dyn DefaultTermStructure>,
    /// Recovery rate.
    pub recovery_rate: f64,
    /// Weight.
    pub weight: f64,
}

/// `P(t) * prod S_i(t)^(w_i (1 - R_i))`.
pub struct YieldPlusDefaultCurve {
    reference: Arc<dyn YieldTermStructure>,
    defaults: Vec<WeightedDefaultCurve>,
    extrapolate: bool,
}

impl fmt::Debug for YieldPlusDefaultCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YieldPlusDefaultCurve")
            .field("defaults", &self.defaults.len())
            .finish_non_exhaustive()
    }
}

impl YieldPlusDefaultCurve {
    /// Creates the curve.
    pub fn new(
        reference: Arc<dyn YieldTermStructure>,
        defaults: Vec<WeightedDefaultCurve>,
    ) -> Self {
        Self {
            reference,
            defaults,
            extrapolate: true,
        }
    }

    /// Sets whether queries beyond the reference curve are allowed.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }
}

impl YieldTermStructure for YieldPlusDefaultCurve {
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
        self.reference.pillar_dates()
    }

    fn discount_impl(&self, t: f64) -> f64 {
        self.defaults.iter().fold(self.reference.discount_impl(t), |acc, d| {
            acc * d
                .curve
                .survival_probability(t)
                .powf(d.weight * (1.0 - d.recovery_rate))
        })
    }
}

/// Projection curve of an Ibor index replaced by its overnight fallback.
///
/// Forwards over one index tenor equal the compounded overnight rate plus
/// the fallback spread; the spread is spread evenly as a continuous rate.
pub struct IborFallbackCurve {
    rfr: Arc<dyn YieldTermStructure>,
    ibor_index: String,
    spread: f64,
    continuous_spread: f64,
    extrapolate: bool,
}

impl fmt::Debug for IborFallbackCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IborFallbackCurve")
            .field("ibor_index", &self.ibor_index)
            .field("spread", &self.spread)
            .finish_non_exhaustive()
    }
}

impl IborFallbackCurve {
    /// Creates the fallback curve for an index with tenor length `tau` years.
    pub fn new(
        rfr: Arc<dyn YieldTermStructure>,
        ibor_index: impl Into<String>,
        spread: f64,
        tau: f64,
    ) -> CurveResult<Self> {
        let ibor_index = ibor_index.into();
        if !(tau > 0.0) || 1.0 + spread * tau <= 0.0 {
            return Err(CurveError::configuration(format!(
                "invalid fallback spread {spread} for index {ibor_index}"
            )));
        }
        Ok(Self {
            rfr,
            ibor_index,
            spread,
            continuous_spread: (1.0 + spread * tau).ln() / tau,
            extrapolate: true,
        })
    }

    /// Fallback spread, simple over one index tenor.
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Sets whether queries beyond the overnight curve are allowed.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }
}

impl YieldTermStructure for IborFallbackCurve {
    fn reference_date(&self) -> Date {
        self.rfr.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.rfr.day_counter()
    }

    fn max_time(&self) -> f64 {
        self.rfr.max_time()
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    fn pillar_dates(&self) -> Vec<Date> {
        self.rfr.pillar_dates()
    }

    fn discount_impl(&self, t: f64) -> f64 {
        self.rfr.discount_impl(t) * (-self.continuous_spread * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termstructures::{FlatForward, FlatHazardCurve};
    use approx::assert_relative_eq;

    fn flat(rate: f64) -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForward::new(
            Date::from_ymd(2024, 1, 15).unwrap(),
            rate,
            DayCountConvention::Act365Fixed,
        ))
    }

    #[test]
    fn test_discount_ratio() {
        let c = DiscountRatioCurve::new(flat(0.03), flat(0.02), flat(0.01)).unwrap();
        assert_relative_eq!(c.discount(2.0).unwrap(), (-0.08f64).exp(), epsilon = 1e-14);
        let other = Arc::new(FlatForward::new(
            Date::from_ymd(2024, 1, 16).unwrap(),
            0.01,
            DayCountConvention::Act365Fixed,
        ));
        assert!(DiscountRatioCurve::new(flat(0.03), flat(0.02), other).is_err());
    }

    #[test]
    fn test_weighted_average() {
        let c = WeightedAverageCurve::new(flat(0.02), flat(0.04), 0.25, 0.75);
        assert_relative_eq!(c.discount(1.0).unwrap(), (-0.035f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_yield_plus_default() {
        let as_of = Date::from_ymd(2024, 1, 15).unwrap();
        let hazard = Arc::new(FlatHazardCurve::new(as_of, 0.02, DayCountConvention::Act365Fixed));
        let c = YieldPlusDefaultCurve::new(
            flat(0.03),
            vec![WeightedDefaultCurve {
                curve: hazard,
                recovery_rate: 0.4,
                weight: 1.0,
            }],
        );
        assert_relative_eq!(
            c.discount(1.0).unwrap(),
            (-0.03f64 - 0.02 * 0.6).exp(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_ibor_fallback_forward() {
        let spread = 0.0026161;
        let tau = 0.25;
        let c = IborFallbackCurve::new(flat(0.03), "USD-LIBOR-3M", spread, tau).unwrap();
        let rfr = flat(0.03);
        let ratio_fallback = c.discount(1.0).unwrap() / c.discount(1.0 + tau).unwrap();
        let ratio_rfr = rfr.discount(1.0).unwrap() / rfr.discount(1.0 + tau).unwrap();
        assert_relative_eq!(ratio_fallback, ratio_rfr * (1.0 + spread * tau), epsilon = 1e-14);
        assert!(IborFallbackCurve::new(flat(0.03), "X", 0.01, 0.0).is_err());
    }
}
