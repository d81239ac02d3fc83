//! FX forward and cross currency swap segments.
//!
//! Each of these instruments needs a discount curve in the other currency.
//! It comes from the segment's `foreign_discount_curve` when set, and
//! otherwise from the in-currency discount curves supplied with the build.

use std::sync::Arc;

use pillar_core::Currency;
use tracing::warn;

use super::BuildContext;
use crate::config::{yield_curve_key, CrossCcySegment, FxForwardSegment};
use crate::conventions::RateIndex;
use crate::error::{CurveError, CurveResult};
use crate::helpers::{CrossCcyBasisHelper, CrossCcyFixFloatHelper, CurveRef, FxSwapHelper, LegCurves, RateHelper};
use crate::market::{resolve_fx_spot, FxForwardTerm, InstrumentType, QuoteDetail, QuoteType};
use crate::termstructures::YieldTermStructure;

type Helpers = Vec<Box<dyn RateHelper>>;

/// The configured foreign discount curve, or the market's in-currency one.
fn foreign_discount(
    ctx: &BuildContext<'_>,
    currency: Currency,
    id: Option<&str>,
) -> CurveResult<Arc<dyn YieldTermStructure>> {
    match id.filter(|id| !id.is_empty()) {
        Some(id) => ctx.require_curve(currency, id, "foreign discount"),
        None => ctx.market_discount_curve(currency),
    }
}

pub(crate) fn add_fx_forwards(
    ctx: &BuildContext<'_>,
    segment: &FxForwardSegment,
    helpers: &mut Helpers,
) -> CurveResult<()> {
    let convention = ctx.conventions.fx(&segment.conventions)?;
    let known_ccy = if convention.source_currency == ctx.currency() {
        convention.target_currency
    } else if convention.target_currency == ctx.currency() {
        convention.source_currency
    } else {
        return Err(CurveError::configuration(
            "One of the currencies in the FX forward bootstrap instruments needs to match the yield curve currency.",
        ));
    };
    let known_discount = foreign_discount(ctx, known_ccy, segment.foreign_discount_curve.as_deref())?;
    let spot = resolve_fx_spot(&segment.spot_rate, ctx.as_of, ctx.loader, ctx.fx)?;

    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::FxForward)?;
        let QuoteDetail::FxForward { unit, ccy, term } = *datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "FXFWD"));
        };
        if unit != spot.unit || ccy != spot.ccy {
            return Err(CurveError::data(format!(
                "Currency mismatch between spot \"{}\" and fwd \"{key}\"",
                segment.spot_rate
            )));
        }

        let points = if datum.quote_type() == QuoteType::Price {
            datum.value_f64() - spot.rate
        } else {
            datum.value_f64() / convention.points_factor
        };

        let spot_rate = match term {
            FxForwardTerm::Overnight => match convention.spot_days {
                0 => spot.rate,
                1 => spot.rate - points,
                2 => {
                    let tomorrow_next = ctx.loader.load_quotes(ctx.as_of).into_iter().find(|q| {
                        matches!(
                            q.detail(),
                            QuoteDetail::FxForward { unit: u, ccy: c, term: FxForwardTerm::TomorrowNext }
                                if *u == unit && *c == ccy
                        )
                    });
                    let Some(tn) = tomorrow_next else {
                        warn!("Skipping {key}: no TN quote found for {unit}{ccy} to roll spot back");
                        continue;
                    };
                    spot.rate - (tn.value_f64() / convention.points_factor + points)
                }
                days => {
                    warn!("Skipping {key}: overnight forwards are not supported with {days} spot days");
                    continue;
                }
            },
            FxForwardTerm::TomorrowNext => spot.rate - points,
            _ => spot.rate,
        };

        helpers.push(Box::new(FxSwapHelper::new(
            points,
            spot_rate,
            ctx.as_of,
            term.start_days(convention.spot_days),
            term.tenor(),
            convention,
            known_ccy == spot.unit,
            CurveRef::External(known_discount.clone()),
        )?));
    }
    Ok(())
}

pub(crate) fn add_cross_ccy_basis(
    ctx: &BuildContext<'_>,
    segment: &CrossCcySegment,
    helpers: &mut Helpers,
) -> CurveResult<()> {
    let convention = ctx.conventions.cross_ccy_basis(&segment.conventions)?;
    let flat_index = RateIndex::parse(&convention.flat_index)?;
    let spread_index = RateIndex::parse(&convention.spread_index)?;
    let on_flat_side = ctx.currency() == flat_index.currency();

    let spot = resolve_fx_spot(&segment.spot_rate, ctx.as_of, ctx.loader, ctx.fx)?;
    let foreign_ccy = if spot.unit == ctx.currency() { spot.ccy } else { spot.unit };

    let foreign_discount_curve = foreign_discount(ctx, foreign_ccy, segment.foreign_discount_curve.as_deref())?;
    let foreign_projection = match segment.foreign_projection_curve.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => ctx.require_curve(foreign_ccy, id, "foreign projection")?,
        None => foreign_discount_curve.clone(),
    };
    let domestic_projection =
        ctx.optional_curve(ctx.currency(), segment.domestic_projection_curve.as_deref(), "domestic projection")?;

    let domestic = LegCurves::new(ctx.discount_ref(), domestic_projection.into());
    let foreign = LegCurves::new(
        CurveRef::External(foreign_discount_curve),
        CurveRef::External(foreign_projection),
    );
    let (flat_curves, spread_curves) = if on_flat_side {
        (domestic, foreign)
    } else {
        (foreign, domestic)
    };

    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::CrossCcyBasisSwap)?;
        let QuoteDetail::CrossCcyBasis { term, .. } = *datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "CC_BASIS_SWAP"));
        };
        helpers.push(Box::new(CrossCcyBasisHelper::new(
            datum.value_f64(),
            spot.rate,
            ctx.as_of,
            term,
            convention,
            &flat_index,
            flat_curves.clone(),
            &spread_index,
            spread_curves.clone(),
        )?));
    }
    Ok(())
}

pub(crate) fn add_cross_ccy_fix_float(
    ctx: &BuildContext<'_>,
    segment: &CrossCcySegment,
    helpers: &mut Helpers,
) -> CurveResult<()> {
    let convention = ctx.conventions.cross_ccy_fix_float(&segment.conventions)?;
    if convention.fixed_currency != ctx.currency() {
        return Err(CurveError::configuration(
            "The yield curve currency must equal the cross currency fix float swap's fixed leg currency",
        ));
    }
    let float_index = RateIndex::parse(&convention.index)?;
    let float_ccy = float_index.currency();

    let float_discount = foreign_discount(ctx, float_ccy, segment.foreign_discount_curve.as_deref())?;
    let float_projection = match segment.foreign_projection_curve.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => {
            let key = yield_curve_key(float_ccy, id);
            ctx.curves.yield_curve(&key).ok_or_else(|| {
                CurveError::dependency(
                    key.clone(),
                    format!(
                        "The projection curve {key} required in the building of curve {} was not found.",
                        ctx.name()
                    ),
                )
            })?
        }
        None => float_discount.clone(),
    };

    let spot = resolve_fx_spot(&segment.spot_rate, ctx.as_of, ctx.loader, ctx.fx)?;
    let fx_spot = if spot.unit == float_ccy && spot.ccy == ctx.currency() {
        spot.rate
    } else if spot.unit == ctx.currency() && spot.ccy == float_ccy {
        spot.inverted().rate
    } else {
        return Err(CurveError::configuration(format!(
            "The FX spot market quote {}/{} cannot be used in the building of the curve {}.",
            spot.unit,
            spot.ccy,
            ctx.name()
        )));
    };

    let float_curves = LegCurves::new(CurveRef::External(float_discount), CurveRef::External(float_projection));
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::CrossCcyFixFloatSwap)?;
        let QuoteDetail::CrossCcyFixFloat { term, .. } = *datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "CC_FIX_FLOAT_SWAP"));
        };
        helpers.push(Box::new(CrossCcyFixFloatHelper::new(
            datum.value_f64(),
            fx_spot,
            ctx.as_of,
            term,
            convention,
            ctx.discount_ref(),
            &float_index,
            float_curves.clone(),
        )?));
    }
    Ok(())
}
