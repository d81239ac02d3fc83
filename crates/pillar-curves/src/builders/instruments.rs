//! Single currency instrument segments.

use pillar_core::{Date, Period, TimeUnit};
use tracing::{debug, warn};

use super::BuildContext;
use crate::config::{BmaBasisSegment, SimpleSegment, TenorBasisSegment};
use crate::conventions::{FutureDateGeneration, RateIndex};
use crate::error::{CurveError, CurveResult};
use crate::helpers::{
    AverageOisHelper, BasisTwoSwapHelper, BmaSwapHelper, BrlCdiHelper, DepositHelper, FraHelper,
    FutureHelper, OisHelper, RateHelper, SwapHelper, TenorBasisHelper,
};
use crate::market::{InstrumentType, MarketDatum, QuoteDetail, QuoteType};

type Helpers = Vec<Box<dyn RateHelper>>;

pub(crate) fn add_deposits(ctx: &BuildContext<'_>, segment: &SimpleSegment, helpers: &mut Helpers) -> CurveResult<()> {
    let convention = ctx.conventions.deposit(&segment.conventions)?;
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::MoneyMarket)?;
        let QuoteDetail::MoneyMarket { fwd_start, term, .. } = datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "MM"));
        };
        if fwd_start.unit() != TimeUnit::Days {
            return Err(CurveError::data(
                "The forward start time unit for deposits must be expressed in days.",
            ));
        }
        let fwd_days = u32::try_from(fwd_start.length())
            .map_err(|_| CurveError::data(format!("Negative forward start in deposit quote {key}")))?;

        let helper = match &convention.index {
            Some(family) => {
                let index = match RateIndex::parse(family) {
                    Ok(index) if index.is_overnight() => index,
                    _ => RateIndex::parse_with_tenor(family, *term)?,
                };
                DepositHelper::new(
                    datum.value_f64(),
                    ctx.as_of,
                    *term,
                    fwd_days,
                    index.calendar(),
                    index.convention(),
                    index.end_of_month(),
                    index.day_counter(),
                )?
            }
            None => DepositHelper::new(
                datum.value_f64(),
                ctx.as_of,
                *term,
                fwd_days,
                &convention.calendar,
                convention.convention,
                convention.eom,
                convention.day_counter,
            )?,
        };
        helpers.push(Box::new(helper));
    }
    Ok(())
}

pub(crate) fn add_futures(ctx: &BuildContext<'_>, segment: &SimpleSegment, helpers: &mut Helpers) -> CurveResult<()> {
    let convention = ctx.conventions.future(&segment.conventions)?;
    let index = RateIndex::parse(&convention.index)?;
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        let QuoteDetail::Future { expiry, tenor, .. } = datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "future"));
        };
        let contract = Date::from_ymd(expiry.year, expiry.month, 1)?;

        if index.is_overnight() {
            datum.expect_instrument(InstrumentType::OvernightIndexFuture)?;
            let helper =
                FutureHelper::overnight(datum.value_f64(), contract, *tenor, convention.date_generation, &index)?;
            if helper.end_date() <= ctx.as_of {
                warn!(
                    "Skipping overnight index future {key}, its period ends on {} which is not after {}",
                    helper.end_date(),
                    ctx.as_of
                );
                continue;
            }
            helpers.push(Box::new(helper));
        } else {
            datum.expect_instrument(InstrumentType::MoneyMarketFuture)?;
            if convention.date_generation != FutureDateGeneration::Imm {
                return Err(CurveError::configuration(format!(
                    "Money market future conventions {} must use IMM date generation",
                    convention.id
                )));
            }
            let helper = FutureHelper::money_market(datum.value_f64(), contract, &index)?;
            if helper.start_date() < ctx.as_of {
                warn!("Skipping expired money market future {key}, IMM date {}", helper.start_date());
                continue;
            }
            helpers.push(Box::new(helper));
        }
    }
    Ok(())
}

pub(crate) fn add_fras(ctx: &BuildContext<'_>, segment: &SimpleSegment, helpers: &mut Helpers) -> CurveResult<()> {
    let convention = ctx.conventions.fra(&segment.conventions)?;
    let index = RateIndex::parse(&convention.index)?;
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        let rate = datum.value_f64();
        let helper = match (datum.instrument_type(), datum.detail()) {
            (InstrumentType::Fra, QuoteDetail::Fra { fwd_start, .. }) => {
                FraHelper::new(rate, ctx.as_of, *fwd_start, &index)?
            }
            (InstrumentType::ImmFra, QuoteDetail::ImmFra { imm1, imm2, .. }) => {
                FraHelper::imm(rate, ctx.as_of, *imm1, *imm2, &index)?
            }
            _ => return Err(CurveError::data("Market quote not of type FRA.")),
        };
        helpers.push(Box::new(helper));
    }
    Ok(())
}

/// Quote term of an `IR_SWAP` datum.
fn swap_term(datum: &MarketDatum) -> CurveResult<Period> {
    datum.expect_instrument(InstrumentType::IrSwap)?;
    match datum.detail() {
        QuoteDetail::Swap { term, .. } => Ok(*term),
        _ => Err(CurveError::quote_type(datum.key(), "swap")),
    }
}

pub(crate) fn add_ois(ctx: &BuildContext<'_>, segment: &SimpleSegment, helpers: &mut Helpers) -> CurveResult<()> {
    let convention = ctx.conventions.ois(&segment.conventions)?;
    let mut index = RateIndex::parse(&convention.index)?;
    if let Some(projection) =
        ctx.optional_curve(ctx.currency(), segment.projection_curve.as_deref(), "projection")?
    {
        index = index.clone_with_curve(projection);
    }
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        let term = swap_term(datum)?;
        let rate = datum.value_f64();
        if index.is_brl_cdi() {
            helpers.push(Box::new(BrlCdiHelper::new(rate, ctx.as_of, term, convention, &index)?));
        } else {
            helpers.push(Box::new(OisHelper::new(
                rate,
                ctx.as_of,
                term,
                convention,
                &index,
                ctx.discount_ref(),
            )?));
        }
    }
    Ok(())
}

pub(crate) fn add_swaps(ctx: &BuildContext<'_>, segment: &SimpleSegment, helpers: &mut Helpers) -> CurveResult<()> {
    if segment.projection_curve.as_deref().is_some_and(|id| !ctx.is_self(id)) {
        return Err(CurveError::configuration(
            "Solving for discount curve given the projection curve is not implemented yet",
        ));
    }
    let convention = ctx.conventions.ir_swap(&segment.conventions)?;
    let index = RateIndex::parse(&convention.index)?;
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        let term = swap_term(datum)?;
        helpers.push(Box::new(SwapHelper::new(
            datum.value_f64(),
            ctx.as_of,
            term,
            convention,
            &index,
            ctx.discount_ref(),
        )?));
    }
    Ok(())
}

/// Quotes come in pairs: a fixed rate followed by the basis spread of the
/// same maturity.
pub(crate) fn add_average_ois(
    ctx: &BuildContext<'_>,
    segment: &SimpleSegment,
    helpers: &mut Helpers,
) -> CurveResult<()> {
    if segment.quotes.len() % 2 != 0 {
        return Err(CurveError::data(format!(
            "Average OIS segment needs quotes in pairs of swap rate and basis spread, got {} quotes",
            segment.quotes.len()
        )));
    }
    let convention = ctx.conventions.average_ois(&segment.conventions)?;
    let mut index = RateIndex::parse(&convention.index)?;
    if let Some(projection) =
        ctx.optional_curve(ctx.currency(), segment.projection_curve.as_deref(), "projection")?
    {
        index = index.clone_with_curve(projection);
    }
    for pair in segment.quotes.chunks_exact(2) {
        let (Some(rate), Some(spread)) = (ctx.quote(&pair[0]), ctx.quote(&pair[1])) else {
            debug!("Skipping average OIS pair {} / {}, quote missing", pair[0], pair[1]);
            continue;
        };
        let term = swap_term(rate)?;
        spread.expect_instrument(InstrumentType::BasisSwap)?;
        let QuoteDetail::BasisSwap { term: basis_term, .. } = spread.detail() else {
            return Err(CurveError::quote_type(spread.key(), "basis swap"));
        };
        if term != *basis_term {
            return Err(CurveError::data(
                "The swap and basis swap components of the Average OIS must have the same maturity.",
            ));
        }
        helpers.push(Box::new(AverageOisHelper::new(
            rate.value_f64(),
            spread.value_f64(),
            ctx.as_of,
            term,
            convention,
            &index,
            ctx.discount_ref(),
        )?));
    }
    Ok(())
}

/// Both indices of a basis segment, each bound to its projection curve
/// when one other than the curve itself is configured.
fn basis_indices(
    ctx: &BuildContext<'_>,
    segment: &TenorBasisSegment,
    long_index: &str,
    short_index: &str,
) -> CurveResult<(RateIndex, RateIndex)> {
    let mut long = RateIndex::parse(long_index)?;
    let mut short = RateIndex::parse(short_index)?;
    if let Some(curve) = ctx.optional_curve(
        short.currency(),
        segment.short_projection_curve.as_deref(),
        "short side projection",
    )? {
        short = short.clone_with_curve(curve);
    }
    if let Some(curve) = ctx.optional_curve(
        long.currency(),
        segment.long_projection_curve.as_deref(),
        "long side projection",
    )? {
        long = long.clone_with_curve(curve);
    }
    Ok((long, short))
}

fn basis_term(datum: &MarketDatum) -> CurveResult<Period> {
    datum.expect_instrument(InstrumentType::BasisSwap)?;
    match datum.detail() {
        QuoteDetail::BasisSwap { term, .. } => Ok(*term),
        _ => Err(CurveError::quote_type(datum.key(), "basis swap")),
    }
}

pub(crate) fn add_tenor_basis(
    ctx: &BuildContext<'_>,
    segment: &TenorBasisSegment,
    helpers: &mut Helpers,
) -> CurveResult<()> {
    let convention = ctx.conventions.tenor_basis(&segment.conventions)?;
    let (long, short) = basis_indices(ctx, segment, &convention.long_index, &convention.short_index)?;
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        let term = basis_term(datum)?;
        let spread = datum.value_f64();
        let helper = if short.is_overnight() {
            TenorBasisHelper::overnight(spread, ctx.as_of, term, &long, &short, ctx.discount_ref())?
        } else {
            TenorBasisHelper::new(spread, ctx.as_of, term, convention, &long, &short, ctx.discount_ref())?
        };
        helpers.push(Box::new(helper));
    }
    Ok(())
}

pub(crate) fn add_tenor_basis_two(
    ctx: &BuildContext<'_>,
    segment: &TenorBasisSegment,
    helpers: &mut Helpers,
) -> CurveResult<()> {
    let convention = ctx.conventions.tenor_basis_two(&segment.conventions)?;
    let (long, short) = basis_indices(ctx, segment, &convention.long_index, &convention.short_index)?;
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        let term = basis_term(datum)?;
        helpers.push(Box::new(BasisTwoSwapHelper::new(
            datum.value_f64(),
            ctx.as_of,
            term,
            convention,
            &long,
            &short,
            ctx.discount_ref(),
        )?));
    }
    Ok(())
}

pub(crate) fn add_bma_basis(
    ctx: &BuildContext<'_>,
    segment: &BmaBasisSegment,
    helpers: &mut Helpers,
) -> CurveResult<()> {
    let convention = ctx.conventions.bma_basis(&segment.conventions)?;
    let libor = RateIndex::parse(&convention.libor_index)?;
    let bma = RateIndex::parse(&convention.bma_index)?;
    let libor_curve = ctx.require_curve(
        libor.currency(),
        segment.libor_projection_curve.as_deref().unwrap_or_default(),
        "libor side projection",
    )?;
    let libor = libor.clone_with_curve(libor_curve);
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::BmaSwap)?;
        datum.expect_quote_type(QuoteType::Ratio)?;
        let QuoteDetail::BmaSwap { term, .. } = datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "BMA swap"));
        };
        helpers.push(Box::new(BmaSwapHelper::new(
            datum.value_f64(),
            ctx.as_of,
            *term,
            convention,
            &libor,
            &bma,
        )?));
    }
    Ok(())
}
