//! Curves composed from already built yield and default curves.

use std::sync::Arc;

use pillar_core::daycounts::DayCount;
use pillar_core::Currency;
use tracing::debug;

use super::BuildContext;
use crate::config::{
    yield_curve_key, DiscountRatioSegment, IborFallbackSegment, WeightedAverageSegment, YieldPlusDefaultSegment,
};
use crate::conventions::RateIndex;
use crate::error::{CurveError, CurveResult};
use crate::termstructures::{
    DiscountRatioCurve, IborFallbackCurve, WeightedAverageCurve, WeightedDefaultCurve, YieldPlusDefaultCurve,
    YieldTermStructure,
};

fn pooled_curve(
    ctx: &BuildContext<'_>,
    id: &str,
    not_found: impl FnOnce() -> String,
) -> CurveResult<Arc<dyn YieldTermStructure>> {
    let key = yield_curve_key(ctx.currency(), id);
    ctx.curves
        .yield_curve(&key)
        .ok_or_else(|| CurveError::dependency(key, not_found()))
}

pub(crate) fn discount_ratio_curve(
    ctx: &BuildContext<'_>,
    segment: &DiscountRatioSegment,
) -> CurveResult<Arc<dyn YieldTermStructure>> {
    let lookup = |role: &str, currency: Option<Currency>, id: &str| -> CurveResult<Arc<dyn YieldTermStructure>> {
        if ctx.is_self(id) {
            return Err(CurveError::configuration(format!("The {role} curve '{id}' cannot be empty")));
        }
        let key = yield_curve_key(currency.unwrap_or(ctx.currency()), id);
        ctx.curves.yield_curve(&key).ok_or_else(|| {
            CurveError::dependency(
                key.clone(),
                format!(
                    "The curve '{key}' required in the building of the curve '{}' was not found.",
                    ctx.name()
                ),
            )
        })
    };
    let base = lookup("base", segment.base_currency, &segment.base_curve)?;
    let numerator = lookup("numerator", segment.numerator_currency, &segment.numerator_curve)?;
    let denominator = lookup("denominator", segment.denominator_currency, &segment.denominator_curve)?;
    let curve = DiscountRatioCurve::new(base, numerator, denominator)?.with_extrapolation(ctx.config.extrapolation);
    Ok(Arc::new(curve))
}

pub(crate) fn weighted_average_curve(
    ctx: &BuildContext<'_>,
    segment: &WeightedAverageSegment,
) -> CurveResult<Arc<dyn YieldTermStructure>> {
    let id1 = &segment.reference_curve1;
    let id2 = &segment.reference_curve2;
    let curve1 = pooled_curve(ctx, id1, || format!("Could not find reference curve1: {id1}"))?;
    let curve2 = pooled_curve(ctx, id2, || format!("Could not find reference curve2: {id2}"))?;
    let curve = WeightedAverageCurve::new(curve1, curve2, segment.weight1, segment.weight2)
        .with_extrapolation(ctx.config.extrapolation);
    Ok(Arc::new(curve))
}

pub(crate) fn yield_plus_default_curve(
    ctx: &BuildContext<'_>,
    segment: &YieldPlusDefaultSegment,
) -> CurveResult<Arc<dyn YieldTermStructure>> {
    if segment.default_curves.len() != segment.weights.len() {
        return Err(CurveError::configuration(format!(
            "Yield plus default curve {} has {} default curves but {} weights",
            ctx.config.id,
            segment.default_curves.len(),
            segment.weights.len()
        )));
    }
    let id = &segment.reference_curve;
    let reference = pooled_curve(ctx, id, || format!("Could not find reference curve: {id}"))?;

    let mut defaults = Vec::with_capacity(segment.default_curves.len());
    for (name, weight) in segment.default_curves.iter().zip(&segment.weights) {
        let entry = ctx.curves.default_curve(name).ok_or_else(|| {
            CurveError::dependency(name.clone(), format!("Could not find default curve: {name}"))
        })?;
        defaults.push(WeightedDefaultCurve {
            curve: entry.curve,
            recovery_rate: entry.recovery_rate,
            weight: *weight,
        });
    }
    let curve = YieldPlusDefaultCurve::new(reference, defaults).with_extrapolation(ctx.config.extrapolation);
    Ok(Arc::new(curve))
}

pub(crate) fn ibor_fallback_curve(
    ctx: &BuildContext<'_>,
    segment: &IborFallbackSegment,
) -> CurveResult<Arc<dyn YieldTermStructure>> {
    let rfr_id = &segment.rfr_curve;
    let rfr_curve = pooled_curve(ctx, rfr_id, || format!("Could not find rfr curve: '{rfr_id}'"))?;

    let ibor_name = &segment.ibor_index;
    let (rfr_name, spread) = match (&segment.rfr_index, segment.spread) {
        (Some(rfr), Some(spread)) => (rfr.clone(), spread),
        _ if ctx.fallback_config.is_index_replaced(ibor_name) => {
            let data = ctx.fallback_config.fallback_data(ibor_name)?;
            (
                segment.rfr_index.clone().unwrap_or_else(|| data.rfr_index.clone()),
                segment.spread.unwrap_or(data.spread),
            )
        }
        _ => {
            return Err(CurveError::configuration(format!(
                "ibor index '{ibor_name}' must be specified in ibor fallback config, if rfr index or spread is not specified in curve config"
            )))
        }
    };

    let original = RateIndex::parse(ibor_name)?;
    let rfr = RateIndex::parse(&rfr_name)?;
    if !rfr.is_overnight() {
        return Err(CurveError::configuration(format!(
            "ibor fallback curve: rfr index '{rfr_name}' must be an overnight index"
        )));
    }

    let start = original.value_date(ctx.as_of);
    let tau = original
        .day_counter()
        .year_fraction_f64(start, original.maturity_date(start)?);
    debug!("Ibor fallback curve for {ibor_name}: rfr {rfr_name}, spread {spread}, tau {tau}");
    let curve = IborFallbackCurve::new(rfr_curve, original.name(), spread, tau)?
        .with_extrapolation(ctx.config.extrapolation);
    Ok(Arc::new(curve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::Fixture;
    use crate::config::YieldCurveConfig;
    use crate::helpers::test_support::{as_of, flat_arc};
    use crate::pool::DefaultCurveEntry;
    use crate::termstructures::FlatHazardCurve;
    use approx::assert_relative_eq;
    use pillar_core::daycounts::DayCountConvention;

    fn fixture(id: &str) -> Fixture {
        let mut f = Fixture::new(YieldCurveConfig::new(id, Currency::USD, vec![]));
        f.pool.insert_yield_curve("Yield/USD/USD-SOFR", flat_arc(0.04));
        f.pool.insert_yield_curve("Yield/USD/USD-FF", flat_arc(0.05));
        f.pool.insert_yield_curve("Yield/EUR/EUR-ESTER", flat_arc(0.03));
        f
    }

    #[test]
    fn test_discount_ratio() {
        let f = fixture("USD-IN-EUR");
        let seg = DiscountRatioSegment {
            base_curve: "EUR-ESTER".into(),
            base_currency: Some(Currency::EUR),
            numerator_curve: "USD-SOFR".into(),
            numerator_currency: None,
            denominator_curve: "USD-FF".into(),
            denominator_currency: None,
        };
        let curve = discount_ratio_curve(&f.context(), &seg).unwrap();
        assert_relative_eq!(curve.discount(2.0).unwrap(), (-(0.03 + 0.04 - 0.05) * 2.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_discount_ratio_errors() {
        let f = fixture("USD-IN-EUR");
        let mut seg = DiscountRatioSegment {
            base_curve: String::new(),
            base_currency: None,
            numerator_curve: "USD-SOFR".into(),
            numerator_currency: None,
            denominator_curve: "USD-FF".into(),
            denominator_currency: None,
        };
        let err = discount_ratio_curve(&f.context(), &seg).err().unwrap();
        assert_eq!(err.to_string(), "The base curve '' cannot be empty");
        seg.base_curve = "USD-LIBOR".into();
        let err = discount_ratio_curve(&f.context(), &seg).err().unwrap();
        assert_eq!(
            err.to_string(),
            "The curve 'Yield/USD/USD-LIBOR' required in the building of the curve 'Yield/USD/USD-IN-EUR' was not found."
        );
    }

    #[test]
    fn test_weighted_average() {
        let f = fixture("USD-AVG");
        let mut seg = WeightedAverageSegment {
            reference_curve1: "USD-SOFR".into(),
            reference_curve2: "USD-FF".into(),
            weight1: 0.25,
            weight2: 0.75,
        };
        let curve = weighted_average_curve(&f.context(), &seg).unwrap();
        assert!(curve.discount(1.0).unwrap() > (-0.05_f64).exp());
        assert!(curve.discount(1.0).unwrap() < (-0.04_f64).exp());
        seg.reference_curve2 = "USD-OIS".into();
        let err = weighted_average_curve(&f.context(), &seg).err().unwrap();
        assert_eq!(err.to_string(), "Could not find reference curve2: USD-OIS");
    }

    #[test]
    fn test_yield_plus_default() {
        let mut f = fixture("USD-RISKY");
        f.pool.insert_default_curve(
            "CPTY_A",
            DefaultCurveEntry {
                curve: Arc::new(FlatHazardCurve::new(as_of(), 0.02, DayCountConvention::Act365Fixed)),
                recovery_rate: 0.4,
            },
        );
        let mut seg = YieldPlusDefaultSegment {
            reference_curve: "USD-SOFR".into(),
            default_curves: vec!["CPTY_A".into()],
            weights: vec![1.0],
        };
        let curve = yield_plus_default_curve(&f.context(), &seg).unwrap();
        assert_relative_eq!(
            curve.discount(1.0).unwrap(),
            (-0.04_f64).exp() * (-0.02_f64 * 0.6).exp(),
            epsilon = 1e-12
        );
        seg.default_curves = vec!["CPTY_B".into()];
        let err = yield_plus_default_curve(&f.context(), &seg).err().unwrap();
        assert_eq!(err.to_string(), "Could not find default curve: CPTY_B");
        seg.weights = vec![0.5, 0.5];
        assert!(yield_plus_default_curve(&f.context(), &seg).is_err());
    }

    #[test]
    fn test_ibor_fallback_from_catalogue() {
        let f = fixture("USD-LIBOR-3M");
        let seg = IborFallbackSegment {
            ibor_index: "USD-LIBOR-3M".into(),
            rfr_curve: "USD-SOFR".into(),
            rfr_index: None,
            spread: None,
        };
        let curve = ibor_fallback_curve(&f.context(), &seg).unwrap();
        assert!(curve.discount(1.0).unwrap() < (-0.04_f64).exp());
    }

    #[test]
    fn test_ibor_fallback_needs_catalogue_or_explicit_data() {
        let f = fixture("EUR-6M-FALLBACK");
        let mut seg = IborFallbackSegment {
            ibor_index: "EUR-EURIBOR-6M".into(),
            rfr_curve: "USD-SOFR".into(),
            rfr_index: None,
            spread: None,
        };
        let err = ibor_fallback_curve(&f.context(), &seg).err().unwrap();
        assert!(err.to_string().starts_with("ibor index 'EUR-EURIBOR-6M' must be specified"));

        seg.rfr_index = Some("EUR-EURIBOR-3M".into());
        seg.spread = Some(0.001);
        let err = ibor_fallback_curve(&f.context(), &seg).err().unwrap();
        assert!(err.to_string().contains("must be an overnight index"));

        seg.rfr_curve = "USD-NONE".into();
        let err = ibor_fallback_curve(&f.context(), &seg).err().unwrap();
        assert_eq!(err.to_string(), "Could not find rfr curve: 'USD-NONE'");
    }
}
