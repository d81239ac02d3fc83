//! Per-segment curve builders.
//!
//! The first segment of a configuration decides how a curve is built:
//!
//! - instrument segments are turned into [`RateHelper`]s and bootstrapped
//!   together ([`instruments`], [`cross_currency`]),
//! - `Discount`, `Zero` and `ZeroSpread` segments are read directly off
//!   quotes ([`direct`]),
//! - ratio, weighted, credit-adjusted and fallback curves are composed
//!   from already built curves ([`derived`]),
//! - `FittedBond` runs a parametric fit ([`bonds`]).

pub(crate) mod bonds;
pub(crate) mod cross_currency;
pub(crate) mod derived;
pub(crate) mod direct;
pub(crate) mod instruments;

use std::collections::BTreeMap;
use std::sync::Arc;

use pillar_core::{Currency, Date};
use tracing::{debug, trace};

use crate::bootstrap::{IterativeBootstrap, PiecewiseCurve};
use crate::config::{yield_curve_key, CurveSegment, CurveSpec, YieldCurveConfig};
use crate::conventions::{ConventionRegistry, IborFallbackConfig};
use crate::error::{CurveError, CurveResult};
use crate::fitting::BondFit;
use crate::helpers::{BondReferenceData, CurveRef, RateHelper};
use crate::market::{FxTriangulation, Loader, MarketDatum};
use crate::pool::CurveLookup;
use crate::termstructures::{InterpolatedCurve, YieldTermStructure};

/// Everything a segment builder reads.
pub(crate) struct BuildContext<'a> {
    pub as_of: Date,
    pub spec: &'a CurveSpec,
    pub config: &'a YieldCurveConfig,
    pub loader: &'a dyn Loader,
    pub conventions: &'a ConventionRegistry,
    pub curves: &'a dyn CurveLookup,
    pub fx: &'a dyn FxTriangulation,
    pub reference_data: Option<&'a BondReferenceData>,
    pub fallback_config: &'a IborFallbackConfig,
    pub market_discount_curves: &'a BTreeMap<Currency, Arc<dyn YieldTermStructure>>,
    /// Discount curve named in the configuration, if it is not the curve
    /// itself.
    pub discount_curve: Option<Arc<dyn YieldTermStructure>>,
}

impl BuildContext<'_> {
    pub fn currency(&self) -> Currency {
        self.config.currency
    }

    /// Pool name of the curve being built.
    pub fn name(&self) -> String {
        self.spec.name()
    }

    /// Quote for `key` on the as-of date. Missing quotes are skipped by
    /// every builder.
    pub fn quote(&self, key: &str) -> Option<&MarketDatum> {
        let datum = self.loader.get(key, self.as_of);
        if datum.is_none() {
            trace!("Market quote {key} not found for {}", self.as_of);
        }
        datum
    }

    /// True when `id` refers to the curve being built.
    pub fn is_self(&self, id: &str) -> bool {
        id.is_empty() || id == self.config.id
    }

    /// Looks up curve `id` in `currency`, failing with a message naming
    /// the `role` it plays.
    pub fn require_curve(
        &self,
        currency: Currency,
        id: &str,
        role: &str,
    ) -> CurveResult<Arc<dyn YieldTermStructure>> {
        let key = yield_curve_key(currency, id);
        self.curves.yield_curve(&key).ok_or_else(|| {
            CurveError::dependency(
                key.clone(),
                format!(
                    "The {role} curve, {key}, required in the building of the curve, {}, was not found.",
                    self.name()
                ),
            )
        })
    }

    /// Like [`require_curve`](Self::require_curve), but `None` for an unset
    /// ID or the curve itself.
    pub fn optional_curve(
        &self,
        currency: Currency,
        id: Option<&str>,
        role: &str,
    ) -> CurveResult<Option<Arc<dyn YieldTermStructure>>> {
        match id {
            Some(id) if !self.is_self(id) => self.require_curve(currency, id, role).map(Some),
            _ => Ok(None),
        }
    }

    /// In-currency discount curve supplied by the market for `currency`.
    pub fn market_discount_curve(&self, currency: Currency) -> CurveResult<Arc<dyn YieldTermStructure>> {
        self.market_discount_curves.get(&currency).cloned().ok_or_else(|| {
            CurveError::dependency(
                currency.to_string(),
                format!(
                    "No in-currency discount curve available for {currency}, required in the building of the curve, {}.",
                    self.name()
                ),
            )
        })
    }

    /// The configured discount curve, or the curve being built.
    pub fn discount_ref(&self) -> CurveRef {
        self.discount_curve.clone().into()
    }

    pub fn no_market_data(&self) -> CurveError {
        CurveError::empty(format!(
            "No market data found for curve spec {} with as of date {}",
            self.name(),
            self.as_of
        ))
    }
}

/// Outcome of a segment builder, before publication.
pub(crate) enum BuiltCurve {
    Bootstrapped(PiecewiseCurve),
    Interpolated(InterpolatedCurve),
    Fitted(BondFit),
    Derived(Arc<dyn YieldTermStructure>),
}

/// Builds the curve the configuration's first segment calls for.
pub(crate) fn build(ctx: &BuildContext<'_>) -> CurveResult<BuiltCurve> {
    let first = ctx
        .config
        .segments
        .first()
        .ok_or_else(|| CurveError::configuration(format!("Yield curve {} has no segments", ctx.config.id)))?;
    match first {
        CurveSegment::Discount(segment) => {
            if ctx.config.segments.len() > 1 {
                return Err(CurveError::configuration(
                    "More than one discount curve segment not supported yet.",
                ));
            }
            direct::discount_curve(ctx, segment).map(BuiltCurve::Interpolated)
        }
        CurveSegment::Zero(segment) => direct::zero_curve(ctx, segment).map(BuiltCurve::Interpolated),
        CurveSegment::ZeroSpread(segment) => direct::zero_spread_curve(ctx, segment).map(BuiltCurve::Derived),
        CurveSegment::DiscountRatio(segment) => derived::discount_ratio_curve(ctx, segment).map(BuiltCurve::Derived),
        CurveSegment::WeightedAverage(segment) => {
            derived::weighted_average_curve(ctx, segment).map(BuiltCurve::Derived)
        }
        CurveSegment::YieldPlusDefault(segment) => {
            derived::yield_plus_default_curve(ctx, segment).map(BuiltCurve::Derived)
        }
        CurveSegment::IborFallback(segment) => derived::ibor_fallback_curve(ctx, segment).map(BuiltCurve::Derived),
        CurveSegment::FittedBond(segment) => bonds::fitted_bond_curve(ctx, segment).map(BuiltCurve::Fitted),
        _ => bootstrapped_curve(ctx).map(BuiltCurve::Bootstrapped),
    }
}

/// Collects the helpers of every segment and bootstraps them together.
pub(crate) fn bootstrapped_curve(ctx: &BuildContext<'_>) -> CurveResult<PiecewiseCurve> {
    let helpers = collect_helpers(ctx)?;
    if helpers.is_empty() {
        return Err(CurveError::empty(format!(
            "Empty instrument list for date = {} and curve = {}",
            ctx.as_of,
            ctx.name()
        )));
    }
    debug!("Bootstrapping {} with {} instruments", ctx.name(), helpers.len());
    let config = ctx.config;
    IterativeBootstrap::new(ctx.as_of, config.day_counter)
        .with_interpolation(config.interpolation_variable, config.interpolation_method)
        .with_config(config.bootstrap.clone())
        .with_extrapolation(config.extrapolation)
        .bootstrap(helpers)
}

fn collect_helpers(ctx: &BuildContext<'_>) -> CurveResult<Vec<Box<dyn RateHelper>>> {
    let mut helpers: Vec<Box<dyn RateHelper>> = Vec::new();
    for segment in &ctx.config.segments {
        if let Some(id) = segment_conventions(segment) {
            debug!("Adding Segment {} with conventions \"{id}\"", segment.type_name());
        }
        match segment {
            CurveSegment::Deposit(s) => instruments::add_deposits(ctx, s, &mut helpers)?,
            CurveSegment::Future(s) => instruments::add_futures(ctx, s, &mut helpers)?,
            CurveSegment::Fra(s) => instruments::add_fras(ctx, s, &mut helpers)?,
            CurveSegment::Ois(s) => instruments::add_ois(ctx, s, &mut helpers)?,
            CurveSegment::Swap(s) => instruments::add_swaps(ctx, s, &mut helpers)?,
            CurveSegment::AverageOis(s) => instruments::add_average_ois(ctx, s, &mut helpers)?,
            CurveSegment::TenorBasis(s) => instruments::add_tenor_basis(ctx, s, &mut helpers)?,
            CurveSegment::TenorBasisTwo(s) => instruments::add_tenor_basis_two(ctx, s, &mut helpers)?,
            CurveSegment::BmaBasis(s) => instruments::add_bma_basis(ctx, s, &mut helpers)?,
            CurveSegment::FxForward(s) => cross_currency::add_fx_forwards(ctx, s, &mut helpers)?,
            CurveSegment::CrossCcyBasis(s) => cross_currency::add_cross_ccy_basis(ctx, s, &mut helpers)?,
            CurveSegment::CrossCcyFixFloat(s) => cross_currency::add_cross_ccy_fix_float(ctx, s, &mut helpers)?,
            _ => return Err(CurveError::configuration("Yield curve segment type not recognized.")),
        }
    }
    Ok(helpers)
}

fn segment_conventions(segment: &CurveSegment) -> Option<&str> {
    match segment {
        CurveSegment::Deposit(s)
        | CurveSegment::Future(s)
        | CurveSegment::Fra(s)
        | CurveSegment::Ois(s)
        | CurveSegment::Swap(s)
        | CurveSegment::AverageOis(s) => Some(&s.conventions),
        CurveSegment::TenorBasis(s) | CurveSegment::TenorBasisTwo(s) => Some(&s.conventions),
        CurveSegment::BmaBasis(s) => Some(&s.conventions),
        CurveSegment::FxForward(s) => Some(&s.conventions),
        CurveSegment::CrossCcyBasis(s) | CurveSegment::CrossCcyFixFloat(s) => Some(&s.conventions),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! A small fixture: EUR conventions and a loader keyed on
    //! [`crate::helpers::test_support::as_of`].

    use std::collections::BTreeMap;
    use std::sync::Arc;

    use pillar_core::Currency;

    use super::BuildContext;
    use crate::config::{CurveSpec, YieldCurveConfig};
    use crate::conventions::{ConventionRegistry, IborFallbackConfig};
    use crate::helpers::test_support::as_of;
    use crate::market::{FxTriangulationGraph, InMemoryLoader};
    use crate::pool::DependencyPool;
    use crate::termstructures::YieldTermStructure;

    pub const CONVENTIONS: &str = r#"
        [[convention]]
        type = "Zero"
        id = "EUR-ZERO"
        day_counter = "A365"
        tenor_calendar = "TARGET"
        tenor_based = true

        [[convention]]
        type = "Deposit"
        id = "EUR-DEP"
        index = "EUR-EURIBOR"

        [[convention]]
        type = "Fra"
        id = "EUR-FRA"
        index = "EUR-EURIBOR-6M"

        [[convention]]
        type = "Future"
        id = "EUR-FUT"
        index = "EUR-EURIBOR-3M"

        [[convention]]
        type = "Future"
        id = "EUR-ON-FUT"
        index = "EUR-ESTER"
        date_generation = "FirstDayOfMonth"

        [[convention]]
        type = "Ois"
        id = "EUR-OIS"
        index = "EUR-ESTER"
        fixed_day_counter = "A360"
        payment_lag = 1

        [[convention]]
        type = "IrSwap"
        id = "EUR-6M-SWAP"
        fixed_calendar = "TARGET"
        fixed_frequency = "Annual"
        fixed_convention = "MF"
        fixed_day_counter = "30E/360"
        index = "EUR-EURIBOR-6M"

        [[convention]]
        type = "AverageOis"
        id = "USD-AVG-OIS"
        fixed_tenor = "6M"
        fixed_day_counter = "A360"
        fixed_calendar = "US"
        index = "USD-FEDFUNDS"
        on_tenor = "3M"

        [[convention]]
        type = "TenorBasisSwap"
        id = "EUR-3M-6M"
        long_index = "EUR-EURIBOR-6M"
        short_index = "EUR-EURIBOR-3M"

        [[convention]]
        type = "Fx"
        id = "EUR-USD-FX"
        source_currency = "EUR"
        target_currency = "USD"
        spot_days = 2
        points_factor = 10000.0
        advance_calendar = "TARGET,US"

        [[convention]]
        type = "CrossCcyBasis"
        id = "EUR-USD-XCCY"
        settlement_days = 2
        settlement_calendar = "TARGET,US"
        roll_convention = "MF"
        flat_index = "USD-LIBOR-3M"
        spread_index = "EUR-EURIBOR-3M"

        [[convention]]
        type = "CrossCcyFixFloat"
        id = "EUR-USD-FIXFLOAT"
        settlement_days = 2
        settlement_calendar = "TARGET,US"
        settlement_convention = "F"
        fixed_currency = "EUR"
        fixed_frequency = "Annual"
        fixed_convention = "MF"
        fixed_day_counter = "30E/360"
        index = "USD-LIBOR-3M"
    "#;

    pub struct Fixture {
        pub spec: CurveSpec,
        pub config: YieldCurveConfig,
        pub loader: InMemoryLoader,
        pub conventions: ConventionRegistry,
        pub pool: DependencyPool,
        pub fx: FxTriangulationGraph,
        pub fallback: IborFallbackConfig,
        pub market: BTreeMap<Currency, Arc<dyn YieldTermStructure>>,
    }

    impl Fixture {
        pub fn new(config: YieldCurveConfig) -> Self {
            Self {
                spec: CurveSpec::new(config.currency, config.id.clone()),
                config,
                loader: InMemoryLoader::new(),
                conventions: ConventionRegistry::from_toml_str(CONVENTIONS).unwrap(),
                pool: DependencyPool::new(),
                fx: FxTriangulationGraph::new(),
                fallback: IborFallbackConfig::default_config(),
                market: BTreeMap::new(),
            }
        }

        pub fn quote(mut self, key: &str, value: f64) -> Self {
            self.loader = self.loader.with_quote(as_of(), key, value).unwrap();
            self
        }

        pub fn context(&self) -> BuildContext<'_> {
            BuildContext {
                as_of: as_of(),
                spec: &self.spec,
                config: &self.config,
                loader: &self.loader,
                conventions: &self.conventions,
                curves: &self.pool,
                fx: &self.fx,
                reference_data: None,
                fallback_config: &self.fallback,
                market_discount_curves: &self.market,
                discount_curve: None,
            }
        }
    }
}
