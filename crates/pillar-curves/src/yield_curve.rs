//! The yield curve facade.
//!
//! [`YieldCurve::build`] looks up a configuration, resolves its discount
//! curve, dispatches on the first segment and wraps every failure in a
//! single [`CurveError::BuildFailure`] naming the curve and as-of date.
//!
//! ```rust,ignore
//! let inputs = BuildInputs::new(&loader, &configs, &conventions, &registry, &fx);
//! let curve = YieldCurve::build(as_of, &spec, &inputs, &BuildOptions::default())?;
//! curve.publish(&registry)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Currency, Date};
use tracing::{debug, info};

use crate::assembly::CalibrationInfo;
use crate::builders::{self, BuildContext, BuiltCurve};
use crate::config::{yield_curve_key, CurveConfigurations, CurveSpec, YieldCurveConfig};
use crate::conventions::{ConventionRegistry, IborFallbackConfig};
use crate::error::{CurveError, CurveResult};
use crate::helpers::BondReferenceData;
use crate::market::{FxTriangulation, Loader};
use crate::pool::{CurveLookup, CurveRegistry};
use crate::termstructures::YieldTermStructure;

/// Collaborators a build reads from.
pub struct BuildInputs<'a> {
    /// Market quotes.
    pub loader: &'a dyn Loader,
    /// Curve configurations.
    pub configs: &'a CurveConfigurations,
    /// Instrument conventions.
    pub conventions: &'a ConventionRegistry,
    /// Already built yield and default curves.
    pub curves: &'a dyn CurveLookup,
    /// FX spot rates.
    pub fx: &'a dyn FxTriangulation,
    /// Bond static data, needed by fitted bond curves only.
    pub reference_data: Option<&'a BondReferenceData>,
    /// Ibor fallback catalogue.
    pub fallback_config: IborFallbackConfig,
}

impl<'a> BuildInputs<'a> {
    /// Creates inputs with no bond data and the default fallback catalogue.
    pub fn new(
        loader: &'a dyn Loader,
        configs: &'a CurveConfigurations,
        conventions: &'a ConventionRegistry,
        curves: &'a dyn CurveLookup,
        fx: &'a dyn FxTriangulation,
    ) -> Self {
        Self {
            loader,
            configs,
            conventions,
            curves,
            fx,
            reference_data: None,
            fallback_config: IborFallbackConfig::default_config(),
        }
    }

    /// Sets the bond reference data.
    #[must_use]
    pub fn with_reference_data(mut self, reference_data: &'a BondReferenceData) -> Self {
        self.reference_data = Some(reference_data);
        self
    }

    /// Replaces the Ibor fallback catalogue.
    #[must_use]
    pub fn with_fallback_config(mut self, fallback_config: IborFallbackConfig) -> Self {
        self.fallback_config = fallback_config;
        self
    }
}

impl fmt::Debug for BuildInputs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildInputs")
            .field("has_reference_data", &self.reference_data.is_some())
            .finish_non_exhaustive()
    }
}

/// Switches controlling what a build produces.
#[derive(Clone)]
pub struct BuildOptions {
    /// Publish the live bootstrapped curve, helpers included, instead of a
    /// detached copy of its nodes.
    pub preserve_quote_linkage: bool,
    /// Record [`CalibrationInfo`] after the build.
    pub build_calibration_info: bool,
    /// In-currency discount curves used by FX and cross currency segments
    /// that name no foreign discount curve.
    pub market_discount_curves: BTreeMap<Currency, Arc<dyn YieldTermStructure>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            preserve_quote_linkage: false,
            build_calibration_info: true,
            market_discount_curves: BTreeMap::new(),
        }
    }
}

impl BuildOptions {
    /// Adds a market discount curve for `currency`.
    #[must_use]
    pub fn with_market_discount_curve(mut self, currency: Currency, curve: Arc<dyn YieldTermStructure>) -> Self {
        self.market_discount_curves.insert(currency, curve);
        self
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("preserve_quote_linkage", &self.preserve_quote_linkage)
            .field("build_calibration_info", &self.build_calibration_info)
            .field(
                "market_discount_curves",
                &self.market_discount_curves.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A built yield curve with its diagnostics.
#[derive(Clone)]
pub struct YieldCurve {
    spec: CurveSpec,
    as_of: Date,
    curve: Arc<dyn YieldTermStructure>,
    calibration_info: Option<CalibrationInfo>,
}

impl fmt::Debug for YieldCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YieldCurve")
            .field("spec", &self.spec)
            .field("as_of", &self.as_of)
            .field("max_time", &self.curve.max_time())
            .field("has_calibration_info", &self.calibration_info.is_some())
            .finish()
    }
}

impl YieldCurve {
    /// Builds the curve `spec` as of `as_of`.
    ///
    /// Any error is returned as [`CurveError::BuildFailure`] carrying the
    /// original message.
    pub fn build(
        as_of: Date,
        spec: &CurveSpec,
        inputs: &BuildInputs<'_>,
        options: &BuildOptions,
    ) -> CurveResult<Self> {
        Self::try_build(as_of, spec, inputs, options)
            .map_err(|e| e.into_build_failure(&spec.config_id, as_of))
    }

    fn try_build(
        as_of: Date,
        spec: &CurveSpec,
        inputs: &BuildInputs<'_>,
        options: &BuildOptions,
    ) -> CurveResult<Self> {
        let config = inputs.configs.yield_curve_config(&spec.config_id).ok_or_else(|| {
            CurveError::configuration(format!(
                "No yield curve configuration found for config ID {}",
                spec.config_id
            ))
        })?;
        config.validate()?;
        let discount_curve = resolve_discount_curve(spec, config, inputs.curves)?;

        let ctx = BuildContext {
            as_of,
            spec,
            config,
            loader: inputs.loader,
            conventions: inputs.conventions,
            curves: inputs.curves,
            fx: inputs.fx,
            reference_data: inputs.reference_data,
            fallback_config: &inputs.fallback_config,
            market_discount_curves: &options.market_discount_curves,
            discount_curve,
        };
        let built = builders::build(&ctx)?;

        let currency = config.currency;
        let (curve, calibration_info): (Arc<dyn YieldTermStructure>, _) = match built {
            BuiltCurve::Bootstrapped(piecewise) => {
                let info = if options.build_calibration_info {
                    Some(CalibrationInfo::sample(&piecewise, currency)?.with_bootstrap(&piecewise)?)
                } else {
                    None
                };
                let report = piecewise.report();
                debug!(
                    "Bootstrap of {} took {} passes, max error {:e}",
                    spec.name(),
                    report.passes,
                    report.max_error
                );
                if options.preserve_quote_linkage {
                    (Arc::new(piecewise), info)
                } else {
                    (Arc::new(piecewise.detach()?), info)
                }
            }
            BuiltCurve::Fitted(fit) => {
                let info = if options.build_calibration_info {
                    Some(CalibrationInfo::sample(&fit.curve, currency)?.with_fitted_bond(fit.calibration))
                } else {
                    None
                };
                (Arc::new(fit.curve), info)
            }
            BuiltCurve::Interpolated(curve) => {
                let info = sample_if(options, &curve, currency)?;
                (Arc::new(curve), info)
            }
            BuiltCurve::Derived(curve) => {
                let info = sample_if(options, curve.as_ref(), currency)?;
                (curve, info)
            }
        };

        // Surface lazily raised errors now rather than at first use.
        curve.discount(f64::EPSILON)?;

        debug!("Yield curve {} built", spec.name());
        Ok(Self {
            spec: spec.clone(),
            as_of,
            curve,
            calibration_info,
        })
    }

    /// Identity of the curve.
    pub fn spec(&self) -> &CurveSpec {
        &self.spec
    }

    /// Build date.
    pub fn as_of(&self) -> Date {
        self.as_of
    }

    /// Curve currency.
    pub fn currency(&self) -> Currency {
        self.spec.currency
    }

    /// The built term structure.
    pub fn curve(&self) -> Arc<dyn YieldTermStructure> {
        Arc::clone(&self.curve)
    }

    /// Diagnostics, when requested.
    pub fn calibration_info(&self) -> Option<&CalibrationInfo> {
        self.calibration_info.as_ref()
    }

    /// Publishes the curve under its spec name. A name can be published
    /// once.
    pub fn publish(&self, registry: &CurveRegistry) -> CurveResult<()> {
        let name = self.spec.name();
        registry.publish(&name, self.curve())?;
        info!("Published {name} as of {}", self.as_of);
        Ok(())
    }
}

impl YieldTermStructure for YieldCurve {
    fn reference_date(&self) -> Date {
        self.curve.reference_date()
    }

    fn day_counter(&self) -> DayCountConvention {
        self.curve.day_counter()
    }

    fn max_time(&self) -> f64 {
        self.curve.max_time()
    }

    fn allows_extrapolation(&self) -> bool {
        self.curve.allows_extrapolation()
    }

    fn discount_impl(&self, t: f64) -> f64 {
        self.curve.discount_impl(t)
    }

    fn pillar_dates(&self) -> Vec<Date> {
        self.curve.pillar_dates()
    }
}

fn sample_if(
    options: &BuildOptions,
    curve: &dyn YieldTermStructure,
    currency: Currency,
) -> CurveResult<Option<CalibrationInfo>> {
    if options.build_calibration_info {
        CalibrationInfo::sample(curve, currency).map(Some)
    } else {
        Ok(None)
    }
}

/// The configured discount curve when it is another curve; `None` when the
/// curve discounts on itself.
fn resolve_discount_curve(
    spec: &CurveSpec,
    config: &YieldCurveConfig,
    curves: &dyn CurveLookup,
) -> CurveResult<Option<Arc<dyn YieldTermStructure>>> {
    let Some(id) = config.discount_curve.as_deref() else {
        return Ok(None);
    };
    if id.is_empty() || id == config.id {
        return Ok(None);
    }
    let key = yield_curve_key(config.currency, id);
    curves.yield_curve(&key).map(Some).ok_or_else(|| {
        CurveError::dependency(
            key.clone(),
            format!(
                "The discount curve, {key}, required in the building of the curve, {}, was not found.",
                spec.name()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::CONVENTIONS;
    use crate::config::{CurveSegment, InterpolationMethod, InterpolationVariable, SimpleSegment};
    use crate::helpers::test_support::{as_of, flat_arc};
    use crate::market::{FxTriangulationGraph, InMemoryLoader};
    use crate::pool::DependencyPool;
    use approx::assert_relative_eq;

    fn discount_config(id: &str) -> YieldCurveConfig {
        YieldCurveConfig::new(
            id,
            Currency::EUR,
            vec![CurveSegment::Discount(SimpleSegment {
                quotes: vec!["DISCOUNT/RATE/EUR/EUR-DF/2025-01-15".into()],
                conventions: "EUR-ZERO".into(),
                projection_curve: None,
            })],
        )
        .with_interpolation(InterpolationVariable::Discount, InterpolationMethod::Linear)
    }

    struct Setup {
        loader: InMemoryLoader,
        configs: CurveConfigurations,
        conventions: ConventionRegistry,
        pool: DependencyPool,
        fx: FxTriangulationGraph,
    }

    impl Setup {
        fn new(config: YieldCurveConfig) -> Self {
            Self {
                loader: InMemoryLoader::new()
                    .with_quote(as_of(), "DISCOUNT/RATE/EUR/EUR-DF/2025-01-15", 0.98)
                    .unwrap(),
                configs: CurveConfigurations::new().with(config),
                conventions: ConventionRegistry::from_toml_str(CONVENTIONS).unwrap(),
                pool: DependencyPool::new(),
                fx: FxTriangulationGraph::new(),
            }
        }

        fn inputs(&self) -> BuildInputs<'_> {
            BuildInputs::new(&self.loader, &self.configs, &self.conventions, &self.pool, &self.fx)
        }
    }

    #[test]
    fn test_build_discount_curve() {
        let setup = Setup::new(discount_config("EUR-DF"));
        let spec = CurveSpec::new(Currency::EUR, "EUR-DF");
        let curve = YieldCurve::build(as_of(), &spec, &setup.inputs(), &BuildOptions::default()).unwrap();
        assert_eq!(curve.discount_date(as_of()).unwrap(), 1.0);
        let mid = Date::from_ymd(2024, 7, 15).unwrap();
        assert_relative_eq!(curve.discount_date(mid).unwrap(), 0.99, epsilon = 1e-3);
        let info = curve.calibration_info().unwrap();
        assert_eq!(info.pillar_dates.len(), 2);
        assert_eq!(info.currency, Some(Currency::EUR));
    }

    #[test]
    fn test_missing_configuration() {
        let setup = Setup::new(discount_config("EUR-DF"));
        let spec = CurveSpec::new(Currency::EUR, "EUR-NONE");
        let err = YieldCurve::build(as_of(), &spec, &setup.inputs(), &BuildOptions::default()).unwrap_err();
        assert!(err.is_build_failure());
        assert_eq!(
            err.to_string(),
            "yield curve building failed for curve EUR-NONE on date 2024-01-15: No yield curve configuration found for config ID EUR-NONE"
        );
    }

    #[test]
    fn test_discount_curve_dependency() {
        let setup = Setup::new(discount_config("EUR-DF").with_discount_curve("EUR-ESTER"));
        let spec = CurveSpec::new(Currency::EUR, "EUR-DF");
        let err = YieldCurve::build(as_of(), &spec, &setup.inputs(), &BuildOptions::default()).unwrap_err();
        assert!(err.to_string().ends_with(
            "The discount curve, Yield/EUR/EUR-ESTER, required in the building of the curve, Yield/EUR/EUR-DF, was not found."
        ));

        let mut setup = setup;
        setup.pool.insert_yield_curve("Yield/EUR/EUR-ESTER", flat_arc(0.03));
        assert!(YieldCurve::build(as_of(), &spec, &setup.inputs(), &BuildOptions::default()).is_ok());
    }

    #[test]
    fn test_self_discounting_needs_no_dependency() {
        let setup = Setup::new(discount_config("EUR-DF").with_discount_curve("EUR-DF"));
        let spec = CurveSpec::new(Currency::EUR, "EUR-DF");
        assert!(YieldCurve::build(as_of(), &spec, &setup.inputs(), &BuildOptions::default()).is_ok());
    }

    #[test]
    fn test_calibration_info_optional() {
        let setup = Setup::new(discount_config("EUR-DF"));
        let spec = CurveSpec::new(Currency::EUR, "EUR-DF");
        let options = BuildOptions {
            build_calibration_info: false,
            ..BuildOptions::default()
        };
        let curve = YieldCurve::build(as_of(), &spec, &setup.inputs(), &options).unwrap();
        assert!(curve.calibration_info().is_none());
    }

    #[test]
    fn test_publish_once() {
        let setup = Setup::new(discount_config("EUR-DF"));
        let spec = CurveSpec::new(Currency::EUR, "EUR-DF");
        let curve = YieldCurve::build(as_of(), &spec, &setup.inputs(), &BuildOptions::default()).unwrap();
        let registry = CurveRegistry::new();
        let handle = registry.handle("Yield/EUR/EUR-DF");
        assert!(!handle.is_linked());
        curve.publish(&registry).unwrap();
        assert!(handle.is_linked());
        assert!(curve.publish(&registry).is_err());
    }

    #[test]
    fn test_invalid_configuration_is_build_failure() {
        let config = discount_config("EUR-DF").with_bootstrap(crate::config::BootstrapConfig {
            max_attempts: 0,
            ..Default::default()
        });
        let setup = Setup::new(config);
        let spec = CurveSpec::new(Currency::EUR, "EUR-DF");
        let err = YieldCurve::build(as_of(), &spec, &setup.inputs(), &BuildOptions::default()).unwrap_err();
        assert!(err.to_string().ends_with("max attempts must be at least 1"));
    }
}
