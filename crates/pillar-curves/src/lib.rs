//! # Pillar Curves
//!
//! Yield curve construction from market quotes.
//!
//! This crate provides:
//!
//! - **Market data**: quote keys, loaders (in memory, CSV) and FX spot
//!   triangulation
//! - **Configuration**: curve configurations with typed segments, loaded
//!   from TOML or JSON
//! - **Conventions**: instrument conventions and the rate index catalogue
//! - **Rate helpers**: deposits, FRAs, futures, swaps, OIS, basis swaps, FX
//!   forwards, cross currency swaps and bonds
//! - **Bootstrap**: iterative pillar-by-pillar solving with a global pass
//!   for non-local interpolation
//! - **Fitting**: Nelson-Siegel, Svensson and spline bond curve fits
//! - **Assembly**: direct discount and zero curves, spreaded, ratio,
//!   weighted, credit-adjusted and Ibor fallback curves
//! - **Facade**: [`YieldCurve::build`] ties the above together and
//!   publishes into a [`CurveRegistry`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pillar_curves::prelude::*;
//!
//! let configs = CurveConfigurations::from_file("curves.toml")?;
//! let conventions = ConventionRegistry::from_file("conventions.toml")?;
//! let loader = CsvLoader::from_path("quotes.csv")?;
//! let fx = FxTriangulationGraph::from_loader(&loader, as_of);
//! let registry = CurveRegistry::new();
//!
//! let inputs = BuildInputs::new(&loader, &configs, &conventions, &registry, &fx);
//! let spec = CurveSpec::new(Currency::EUR, "EUR-ESTER");
//! let curve = YieldCurve::build(as_of, &spec, &inputs, &BuildOptions::default())?;
//! curve.publish(&registry)?;
//!
//! let df = curve.discount(5.0)?;
//! ```
//!
//! Builds are synchronous. Curves that depend on each other must be built
//! in dependency order; the registry only ever sees finished curves.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::float_cmp)]

pub mod assembly;
pub mod bootstrap;
mod builders;
pub mod config;
pub mod conventions;
pub mod error;
pub mod fitting;
pub mod helpers;
pub mod market;
pub mod pool;
pub mod termstructures;
pub mod yield_curve;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::assembly::{CalibrationInfo, InstrumentCheck};
    pub use crate::bootstrap::{IterativeBootstrap, PiecewiseCurve};
    pub use crate::config::{
        BootstrapConfig, CurveConfigurations, CurveSegment, CurveSpec, InterpolationMethod,
        InterpolationVariable, YieldCurveConfig,
    };
    pub use crate::conventions::{Convention, ConventionRegistry, IborFallbackConfig, RateIndex};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::fitting::{BondCurveFitter, BondFit, FittedBondCalibration};
    pub use crate::helpers::{BondReferenceData, FixedRateBond, RateHelper};
    pub use crate::market::{
        CsvLoader, FxTriangulation, FxTriangulationGraph, InMemoryLoader, Loader, MarketDatum,
    };
    pub use crate::pool::{CurveHandle, CurveLookup, CurveRegistry, DefaultCurveEntry, DependencyPool};
    pub use crate::termstructures::{InterpolatedCurve, YieldTermStructure};
    pub use crate::yield_curve::{BuildInputs, BuildOptions, YieldCurve};
    pub use pillar_core::{Currency, Date};
}

pub use config::{CurveConfigurations, CurveSpec, YieldCurveConfig};
pub use error::{CurveError, CurveResult};
pub use pool::{CurveRegistry, DependencyPool};
pub use termstructures::YieldTermStructure;
pub use yield_curve::{BuildInputs, BuildOptions, YieldCurve};
