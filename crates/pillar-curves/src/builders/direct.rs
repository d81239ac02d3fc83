//! Curves read directly off discount factor, zero rate and spread quotes.

use std::collections::BTreeMap;
use std::sync::Arc;

use pillar_core::calendars::Calendar;
use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::types::{Compounding, Frequency};
use pillar_core::Date;
use tracing::{debug, warn};

use super::BuildContext;
use crate::config::{yield_curve_key, InterpolationVariable, SimpleSegment, ZeroSpreadSegment};
use crate::error::{CurveError, CurveResult};
use crate::market::{DateOrTenor, InstrumentType, QuoteDetail, QuoteType};
use crate::termstructures::{InterestRate, InterpolatedCurve, YieldTermStructure, ZeroSpreadedCurve};

fn unknown_variable() -> CurveError {
    CurveError::configuration("Unknown yield curve interpolation variable.")
}

pub(crate) fn discount_curve(ctx: &BuildContext<'_>, segment: &SimpleSegment) -> CurveResult<InterpolatedCurve> {
    let mut data: BTreeMap<Date, f64> = BTreeMap::new();
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::Discount)?;
        let QuoteDetail::Discount { point, .. } = datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "DISCOUNT"));
        };
        let date = match *point {
            DateOrTenor::Date(date) => date,
            DateOrTenor::Tenor(tenor) => {
                let convention = ctx.conventions.zero(&segment.conventions)?;
                let calendar = &convention.tenor_calendar;
                let roll = convention.roll_convention;
                let start = calendar.adjust(ctx.as_of, roll);
                calendar.adjust(start.add_period(tenor, false)?, roll)
            }
        };
        if date < ctx.as_of {
            warn!("Discount quote {key} dated {date} is before {}, skipped", ctx.as_of);
            continue;
        }
        debug!("Discount quote {key} placed at {date}");
        data.insert(date, datum.value_f64());
    }

    if data.is_empty() {
        return Err(ctx.no_market_data());
    }
    if data.keys().next().is_some_and(|first| *first > ctx.as_of) {
        data.insert(ctx.as_of, 1.0);
    }
    if data.len() <= 1 {
        return Err(CurveError::data(
            "The single discount quote provided should be associated with a date greater than as of date.",
        ));
    }

    let config = ctx.config;
    let (dates, discounts): (Vec<Date>, Vec<f64>) = data.into_iter().unzip();
    let values = match config.interpolation_variable {
        InterpolationVariable::Discount => discounts,
        InterpolationVariable::Zero => {
            let temp = InterpolatedCurve::new(
                ctx.as_of,
                dates.clone(),
                discounts,
                InterpolationVariable::Discount,
                config.interpolation_method,
                config.day_counter,
            )?;
            continuous_zeros(&temp, &dates, config.day_counter)?
        }
        InterpolationVariable::Forward => return Err(unknown_variable()),
    };
    Ok(InterpolatedCurve::new(
        ctx.as_of,
        dates,
        values,
        config.interpolation_variable,
        config.interpolation_method,
        config.day_counter,
    )?
    .with_extrapolation(config.extrapolation))
}

fn continuous_zeros(
    curve: &dyn YieldTermStructure,
    dates: &[Date],
    day_counter: DayCountConvention,
) -> CurveResult<Vec<f64>> {
    dates
        .iter()
        .map(|d| Ok(curve.zero_rate(*d, day_counter, Compounding::Continuous, Frequency::Annual)?.rate))
        .collect()
}

pub(crate) fn zero_curve(ctx: &BuildContext<'_>, segment: &SimpleSegment) -> CurveResult<InterpolatedCurve> {
    let convention = ctx.conventions.zero(&segment.conventions)?;
    let quote_dc = convention.day_counter;

    let mut data: BTreeMap<Date, f64> = BTreeMap::new();
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::Zero)?;
        let QuoteDetail::Zero { day_counter, point, .. } = datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "ZERO"));
        };
        if *day_counter != quote_dc {
            return Err(CurveError::data(
                "The day counter should be the same between the conventions and the quote.",
            ));
        }
        let date = match *point {
            DateOrTenor::Date(date) => date,
            DateOrTenor::Tenor(tenor) => {
                if !convention.tenor_based {
                    return Err(CurveError::configuration(
                        "Using tenor based zero rates without tenor based zero rate conventions.",
                    ));
                }
                let spot = if convention.spot_lag > 0 {
                    convention
                        .spot_calendar
                        .advance_business_days(ctx.as_of, convention.spot_lag as i32)
                } else {
                    ctx.as_of
                };
                convention
                    .tenor_calendar
                    .advance(spot, tenor, convention.roll_convention, convention.eom)?
            }
        };
        if date < ctx.as_of {
            warn!("Zero quote {key} dated {date} is before {}, skipped", ctx.as_of);
            continue;
        }
        data.insert(date, datum.value_f64());
    }

    if data.is_empty() {
        return Err(ctx.no_market_data());
    }
    if let Some((first, rate)) = data.iter().next().map(|(d, r)| (*d, *r)) {
        if first > ctx.as_of {
            data.insert(ctx.as_of, rate);
        }
    }
    if data.len() <= 1 {
        return Err(CurveError::data(
            "The single zero rate quote provided should be associated with a date greater than as of date.",
        ));
    }

    let mut dates = Vec::with_capacity(data.len());
    let mut zeros = Vec::with_capacity(data.len());
    let mut discounts = Vec::with_capacity(data.len());
    for (i, (date, rate)) in data.into_iter().enumerate() {
        dates.push(date);
        if i == 0 {
            zeros.push(rate);
            discounts.push(1.0);
            continue;
        }
        let quoted = InterestRate::new(rate, quote_dc, convention.compounding, convention.compounding_frequency);
        let t = quote_dc.year_fraction_f64(ctx.as_of, date);
        let zero = if convention.compounding == Compounding::Continuous {
            rate
        } else {
            quoted.equivalent_rate(Compounding::Continuous, Frequency::Annual, t)?.rate
        };
        zeros.push(zero);
        discounts.push(quoted.discount_factor(t));
    }

    let config = ctx.config;
    let values = match config.interpolation_variable {
        InterpolationVariable::Zero => {
            let temp = InterpolatedCurve::new(
                ctx.as_of,
                dates.clone(),
                zeros,
                InterpolationVariable::Zero,
                config.interpolation_method,
                quote_dc,
            )?;
            continuous_zeros(&temp, &dates, config.day_counter)?
        }
        InterpolationVariable::Discount => {
            let temp = InterpolatedCurve::new(
                ctx.as_of,
                dates.clone(),
                discounts,
                InterpolationVariable::Discount,
                config.interpolation_method,
                quote_dc,
            )?;
            dates
                .iter()
                .map(|d| temp.discount_date(*d))
                .collect::<CurveResult<Vec<f64>>>()?
        }
        InterpolationVariable::Forward => return Err(unknown_variable()),
    };
    Ok(InterpolatedCurve::new(
        ctx.as_of,
        dates,
        values,
        config.interpolation_variable,
        config.interpolation_method,
        config.day_counter,
    )?
    .with_extrapolation(config.extrapolation))
}

pub(crate) fn zero_spread_curve(
    ctx: &BuildContext<'_>,
    segment: &ZeroSpreadSegment,
) -> CurveResult<Arc<dyn YieldTermStructure>> {
    let mut spreads: BTreeMap<Date, f64> = BTreeMap::new();
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::Zero)?;
        datum.expect_quote_type(QuoteType::YieldSpread)?;
        let QuoteDetail::Zero { point, .. } = datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "ZERO"));
        };
        let date = match *point {
            DateOrTenor::Date(date) => date,
            DateOrTenor::Tenor(tenor) => ctx.as_of.add_period(tenor, false)?,
        };
        spreads.insert(date, datum.value_f64());
    }
    if spreads.is_empty() {
        return Err(CurveError::empty(format!(
            "Cannot build curve with spec {} because there are no spread quotes",
            ctx.name()
        )));
    }

    let key = yield_curve_key(ctx.currency(), &segment.reference_curve);
    let reference = ctx.curves.yield_curve(&key).ok_or_else(|| {
        CurveError::dependency(
            key.clone(),
            format!(
                "The reference curve, {key}, required in the building of the curve, {}, was not found.",
                ctx.name()
            ),
        )
    })?;
    let convention = ctx.conventions.zero(&segment.conventions)?;
    let points: Vec<(Date, f64)> = spreads.into_iter().collect();
    let curve = ZeroSpreadedCurve::new(reference, &points, convention.compounding, convention.compounding_frequency)?
        .with_extrapolation(ctx.config.extrapolation);
    Ok(Arc::new(curve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::Fixture;
    use crate::config::{CurveSegment, InterpolationMethod, YieldCurveConfig};
    use crate::helpers::test_support::{as_of, flat_arc};
    use approx::assert_relative_eq;
    use pillar_core::Currency;

    fn simple(quotes: &[&str], conventions: &str) -> SimpleSegment {
        SimpleSegment {
            quotes: quotes.iter().map(|q| (*q).to_string()).collect(),
            conventions: conventions.to_string(),
            projection_curve: None,
        }
    }

    fn config(variable: InterpolationVariable, method: InterpolationMethod) -> YieldCurveConfig {
        YieldCurveConfig::new("EUR-DISC", Currency::EUR, vec![CurveSegment::Discount(simple(&[], ""))])
            .with_interpolation(variable, method)
    }

    #[test]
    fn test_discount_midpoint_log_linear() {
        let f = Fixture::new(config(InterpolationVariable::Discount, InterpolationMethod::LogLinear))
            .quote("DISCOUNT/RATE/EUR/EUR-DISC/2025-01-15", 0.98);
        let seg = simple(&["DISCOUNT/RATE/EUR/EUR-DISC/2025-01-15"], "EUR-ZERO");
        let curve = discount_curve(&f.context(), &seg).unwrap();
        assert_eq!(curve.dates()[0], as_of());
        assert_relative_eq!(curve.discount_date(as_of()).unwrap(), 1.0);
        let mid = Date::from_ymd(2024, 7, 16).unwrap();
        let t = curve.time_from_reference(mid) / curve.time_from_reference(Date::from_ymd(2025, 1, 15).unwrap());
        assert_relative_eq!(curve.discount_date(mid).unwrap(), 0.98_f64.powf(t), epsilon = 1e-12);
    }

    #[test]
    fn test_discount_tenor_quotes_use_zero_conventions() {
        let f = Fixture::new(config(InterpolationVariable::Discount, InterpolationMethod::LogLinear))
            .quote("DISCOUNT/RATE/EUR/EUR-DISC/1Y", 0.98)
            .quote("DISCOUNT/RATE/EUR/EUR-DISC/2Y", 0.96);
        let seg = simple(
            &["DISCOUNT/RATE/EUR/EUR-DISC/1Y", "DISCOUNT/RATE/EUR/EUR-DISC/2Y"],
            "EUR-ZERO",
        );
        let curve = discount_curve(&f.context(), &seg).unwrap();
        assert_eq!(curve.dates().len(), 3);
        assert_eq!(curve.dates()[1], Date::from_ymd(2025, 1, 15).unwrap());
    }

    #[test]
    fn test_discount_as_zero_variable_matches() {
        let quotes = ["DISCOUNT/RATE/EUR/EUR-DISC/2025-01-15", "DISCOUNT/RATE/EUR/EUR-DISC/2029-01-15"];
        let build = |variable| {
            let f = Fixture::new(config(variable, InterpolationMethod::Linear))
                .quote(quotes[0], 0.97)
                .quote(quotes[1], 0.85);
            discount_curve(&f.context(), &simple(&quotes, "EUR-ZERO")).unwrap()
        };
        let by_zero = build(InterpolationVariable::Zero);
        let by_discount = build(InterpolationVariable::Discount);
        for d in [Date::from_ymd(2025, 1, 15).unwrap(), Date::from_ymd(2029, 1, 15).unwrap()] {
            assert_relative_eq!(
                by_zero.discount_date(d).unwrap(),
                by_discount.discount_date(d).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_discount_single_quote_at_as_of() {
        let f = Fixture::new(config(InterpolationVariable::Discount, InterpolationMethod::LogLinear))
            .quote("DISCOUNT/RATE/EUR/EUR-DISC/2024-01-15", 1.0);
        let err = discount_curve(&f.context(), &simple(&["DISCOUNT/RATE/EUR/EUR-DISC/2024-01-15"], "")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The single discount quote provided should be associated with a date greater than as of date."
        );
    }

    #[test]
    fn test_discount_quote_before_as_of_skipped() {
        let quotes = ["DISCOUNT/RATE/EUR/EUR-DISC/2023-12-15", "DISCOUNT/RATE/EUR/EUR-DISC/2025-01-15"];
        let f = Fixture::new(config(InterpolationVariable::Discount, InterpolationMethod::LogLinear))
            .quote(quotes[0], 1.002)
            .quote(quotes[1], 0.98);
        let curve = discount_curve(&f.context(), &simple(&quotes, "")).unwrap();
        assert_eq!(curve.dates(), &[as_of(), Date::from_ymd(2025, 1, 15).unwrap()]);
        assert_relative_eq!(curve.discount_date(Date::from_ymd(2025, 1, 15).unwrap()).unwrap(), 0.98);

        let f = Fixture::new(config(InterpolationVariable::Discount, InterpolationMethod::LogLinear))
            .quote(quotes[0], 1.002);
        let err = discount_curve(&f.context(), &simple(&quotes[..1], "")).unwrap_err();
        assert!(matches!(err, CurveError::EmptyCurveData { .. }));
    }

    #[test]
    fn test_discount_no_data() {
        let f = Fixture::new(config(InterpolationVariable::Discount, InterpolationMethod::LogLinear));
        let err = discount_curve(&f.context(), &simple(&["DISCOUNT/RATE/EUR/EUR-DISC/1Y"], "")).unwrap_err();
        assert!(matches!(err, CurveError::EmptyCurveData { .. }));
        assert_eq!(
            err.to_string(),
            "No market data found for curve spec Yield/EUR/EUR-DISC with as of date 2024-01-15"
        );
    }

    #[test]
    fn test_discount_forward_variable_rejected() {
        let f = Fixture::new(config(InterpolationVariable::Forward, InterpolationMethod::Linear))
            .quote("DISCOUNT/RATE/EUR/EUR-DISC/2025-01-15", 0.98);
        let err = discount_curve(&f.context(), &simple(&["DISCOUNT/RATE/EUR/EUR-DISC/2025-01-15"], "")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown yield curve interpolation variable.");
    }

    #[test]
    fn test_zero_curve_continuous_rates() {
        let f = Fixture::new(config(InterpolationVariable::Zero, InterpolationMethod::Linear))
            .quote("ZERO/RATE/EUR/EUR-ZC/A365/2025-01-15", 0.03)
            .quote("ZERO/RATE/EUR/EUR-ZC/A365/2029-01-15", 0.035);
        let seg = simple(
            &["ZERO/RATE/EUR/EUR-ZC/A365/2025-01-15", "ZERO/RATE/EUR/EUR-ZC/A365/2029-01-15"],
            "EUR-ZERO",
        );
        let curve = zero_curve(&f.context(), &seg).unwrap();
        let d = Date::from_ymd(2029, 1, 15).unwrap();
        let t = DayCountConvention::Act365Fixed.year_fraction_f64(as_of(), d);
        assert_relative_eq!(curve.discount_date(d).unwrap(), (-0.035 * t).exp(), epsilon = 1e-12);
        assert_relative_eq!(curve.values()[0], 0.03, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_quote_before_as_of_skipped() {
        let quotes = ["ZERO/RATE/EUR/EUR-ZC/A365/2023-06-15", "ZERO/RATE/EUR/EUR-ZC/A365/2026-01-15"];
        let f = Fixture::new(config(InterpolationVariable::Zero, InterpolationMethod::Linear))
            .quote(quotes[0], 0.05)
            .quote(quotes[1], 0.03);
        let curve = zero_curve(&f.context(), &simple(&quotes, "EUR-ZERO")).unwrap();
        assert_eq!(curve.dates()[0], as_of());
        assert_relative_eq!(curve.values()[0], 0.03, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_curve_day_counter_mismatch() {
        let f = Fixture::new(config(InterpolationVariable::Zero, InterpolationMethod::Linear))
            .quote("ZERO/RATE/EUR/EUR-ZC/A360/2025-01-15", 0.03);
        let err = zero_curve(&f.context(), &simple(&["ZERO/RATE/EUR/EUR-ZC/A360/2025-01-15"], "EUR-ZERO"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The day counter should be the same between the conventions and the quote."
        );
    }

    #[test]
    fn test_zero_spread_curve() {
        let mut f = Fixture::new(config(InterpolationVariable::Zero, InterpolationMethod::Linear))
            .quote("ZERO/YIELD_SPREAD/EUR/EUR-SPREAD/A365/1Y", 0.01)
            .quote("ZERO/YIELD_SPREAD/EUR/EUR-SPREAD/A365/5Y", 0.01);
        let seg = ZeroSpreadSegment {
            quotes: vec![
                "ZERO/YIELD_SPREAD/EUR/EUR-SPREAD/A365/1Y".into(),
                "ZERO/YIELD_SPREAD/EUR/EUR-SPREAD/A365/5Y".into(),
            ],
            conventions: "EUR-ZERO".into(),
            reference_curve: "EUR-ESTER".into(),
        };
        let err = zero_spread_curve(&f.context(), &seg).err().unwrap();
        assert!(err.to_string().starts_with("The reference curve, Yield/EUR/EUR-ESTER"));

        f.pool.insert_yield_curve("Yield/EUR/EUR-ESTER", flat_arc(0.02));
        let curve = zero_spread_curve(&f.context(), &seg).unwrap();
        let zero = curve
            .zero_rate(Date::from_ymd(2027, 1, 15).unwrap(), DayCountConvention::Act365Fixed, Compounding::Continuous, Frequency::Annual)
            .unwrap();
        assert_relative_eq!(zero.rate, 0.03, epsilon = 1e-10);
    }

    #[test]
    fn test_zero_spread_requires_quotes() {
        let f = Fixture::new(config(InterpolationVariable::Zero, InterpolationMethod::Linear));
        let seg = ZeroSpreadSegment {
            quotes: vec!["ZERO/YIELD_SPREAD/EUR/EUR-SPREAD/A365/1Y".into()],
            conventions: "EUR-ZERO".into(),
            reference_curve: "EUR-ESTER".into(),
        };
        let err = zero_spread_curve(&f.context(), &seg).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Cannot build curve with spec Yield/EUR/EUR-DISC because there are no spread quotes"
        );
    }
}
