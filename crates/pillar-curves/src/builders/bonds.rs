//! Fitted bond curves.

use tracing::debug;

use super::BuildContext;
use crate::config::{yield_curve_key, FittedBondSegment};
use crate::conventions::RateIndex;
use crate::error::{CurveError, CurveResult};
use crate::fitting::{BondCurveFitter, BondFit};
use crate::helpers::BondHelper;
use crate::market::{InstrumentType, QuoteDetail, QuoteType};
use crate::termstructures::FittingMethod;

/// Bond prices are quoted per unit of face and fitted per 100.
const PRICE_SCALE: f64 = 100.0;

pub(crate) fn fitted_bond_curve(ctx: &BuildContext<'_>, segment: &FittedBondSegment) -> CurveResult<BondFit> {
    for (index_name, curve_id) in &segment.ibor_index_curves {
        let index = RateIndex::parse(index_name)?;
        let key = yield_curve_key(index.currency(), curve_id);
        if ctx.curves.yield_curve(&key).is_none() {
            return Err(CurveError::dependency(
                key.clone(),
                format!(
                    "required yield curve '{key}' for iborIndex '{index_name}' not provided for fitted bond curve"
                ),
            ));
        }
        debug!("Fitted bond curve {}: {index_name} projects on {key}", ctx.name());
    }

    let mut helpers = Vec::with_capacity(segment.quotes.len());
    for key in &segment.quotes {
        let Some(datum) = ctx.quote(key) else { continue };
        datum.expect_instrument(InstrumentType::Bond)?;
        datum.expect_quote_type(QuoteType::Price)?;
        let QuoteDetail::Bond { security_id } = datum.detail() else {
            return Err(CurveError::quote_type(key.as_str(), "BOND"));
        };
        let reference_data = ctx
            .reference_data
            .ok_or_else(|| CurveError::configuration("reference data required to build fitted bond curve"))?;
        let bond = reference_data.get(security_id).ok_or_else(|| {
            CurveError::configuration(format!("No reference data found for bond {security_id}"))
        })?;
        helpers.push(BondHelper::new(bond.clone(), datum.value_f64() * PRICE_SCALE, ctx.as_of));
    }

    let config = ctx.config;
    BondCurveFitter::new(
        ctx.as_of,
        config.day_counter,
        FittingMethod::from_method(config.interpolation_method)?,
    )
    .with_config(config.bootstrap.clone())
    .with_flat_extrapolation(segment.extrapolate_flat)
    .with_extrapolation(config.extrapolation)
    .fit(helpers)
}
