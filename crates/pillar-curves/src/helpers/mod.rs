//! Calibration instruments for curve bootstrapping and fitting.
//!
//! A [`RateHelper`] binds one market quote to a pillar date and knows how
//! to reprice that quote off a curve. During a bootstrap the curve being
//! solved is passed to [`RateHelper::implied_quote`]; any other curve the
//! instrument needs is held as a [`CurveRef::External`].
//!
//! # Available Helpers
//!
//! ## Money Market
//! - [`DepositHelper`]: deposits, index or convention based
//! - [`FraHelper`]: forward rate agreements, plain or IMM
//! - [`FutureHelper`]: money market and overnight index futures
//!
//! ## Swaps
//! - [`OisHelper`], [`BrlCdiHelper`]: overnight index swaps
//! - [`SwapHelper`]: fixed against Ibor, optionally with sub-periods
//! - [`AverageOisHelper`]: fixed against averaged overnight plus spread
//! - [`TenorBasisHelper`], [`BasisTwoSwapHelper`], [`BmaSwapHelper`]: basis
//!
//! ## Cross Currency
//! - [`FxSwapHelper`]: FX forward points
//! - [`CrossCcyBasisHelper`], [`CrossCcyFixFloatHelper`]: with or without
//!   notional resets
//!
//! ## Bonds
//! - [`BondHelper`]: clean price of a fixed rate bond

mod basis;
mod bond;
mod deposit;
mod fra;
mod futures;
mod fx;
pub(crate) mod legs;
mod swaps;
mod xccy;

pub use basis::{BasisTwoSwapHelper, BmaSwapHelper, TenorBasisHelper};
pub use bond::{BondHelper, BondReferenceData, FixedRateBond};
pub use deposit::DepositHelper;
pub use fra::FraHelper;
pub use futures::FutureHelper;
pub use fx::FxSwapHelper;
pub use swaps::{AverageOisHelper, BrlCdiHelper, OisHelper, SwapHelper};
pub use xccy::{CrossCcyBasisHelper, CrossCcyFixFloatHelper, LegCurves};

use std::fmt;
use std::sync::Arc;

use pillar_core::Date;

use crate::conventions::RateIndex;
use crate::error::CurveResult;
use crate::termstructures::YieldTermStructure;

/// A market quote tied to a pillar date of the curve being solved.
pub trait RateHelper: Send + Sync {
    /// Date at which the helper constrains the curve.
    fn pillar_date(&self) -> Date;

    /// Market quote, in the helper's quoting convention.
    fn quote(&self) -> f64;

    /// Quote implied by `curve`, with `curve` standing in for every
    /// [`CurveRef::Building`] reference.
    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64>;

    /// Market quote minus implied quote.
    fn quote_error(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        Ok(self.quote() - self.implied_quote(curve)?)
    }

    /// Short description for logs and error messages.
    fn description(&self) -> String;
}

/// The curve a leg projects or discounts on.
#[derive(Clone, Default)]
pub enum CurveRef {
    /// The curve being built.
    #[default]
    Building,
    /// An already built curve.
    External(Arc<dyn YieldTermStructure>),
}

impl CurveRef {
    /// Picks the external curve, or `building`.
    pub fn resolve<'a>(&'a self, building: &'a dyn YieldTermStructure) -> &'a dyn YieldTermStructure {
        match self {
            CurveRef::Building => building,
            CurveRef::External(curve) => curve.as_ref(),
        }
    }

    /// Projection curve of an index: its forwarding curve if bound.
    pub fn projection(index: &RateIndex) -> Self {
        index.forwarding_curve().cloned().into()
    }

    /// True for [`CurveRef::Building`].
    pub fn is_building(&self) -> bool {
        matches!(self, CurveRef::Building)
    }
}

impl From<Option<Arc<dyn YieldTermStructure>>> for CurveRef {
    fn from(curve: Option<Arc<dyn YieldTermStructure>>) -> Self {
        curve.map_or(CurveRef::Building, CurveRef::External)
    }
}

impl fmt::Debug for CurveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveRef::Building => write!(f, "Building"),
            CurveRef::External(c) => write!(f, "External({})", c.reference_date()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use pillar_core::daycounts::DayCountConvention;
    use pillar_core::Date;

    use crate::termstructures::{FlatForward, YieldTermStructure};

    pub fn as_of() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    pub fn flat(rate: f64) -> FlatForward {
        FlatForward::new(as_of(), rate, DayCountConvention::Act365Fixed)
    }

    pub fn flat_arc(rate: f64) -> Arc<dyn YieldTermStructure> {
        Arc::new(flat(rate))
    }
}
