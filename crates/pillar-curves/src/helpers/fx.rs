//! FX forward points helper.

use pillar_core::calendars::{BusinessDayConvention, Calendar};
use pillar_core::{Date, Period};

use super::legs::growth;
use super::{CurveRef, RateHelper};
use crate::conventions::FxConvention;
use crate::error::CurveResult;
use crate::termstructures::YieldTermStructure;

/// Forward points over `[start, end]` implied by covered interest parity
/// between the curve being built and the collateral curve of the known
/// currency.
#[derive(Debug, Clone)]
pub struct FxSwapHelper {
    points: f64,
    spot: f64,
    label: String,
    start: Date,
    end: Date,
    base_is_collateral: bool,
    collateral: CurveRef,
}

impl FxSwapHelper {
    /// Creates the helper.
    ///
    /// `points` are in price units. `spot` is quoted as units of the
    /// convention's target per unit of source currency, and
    /// `base_is_collateral` is true when the collateral curve belongs to
    /// the source (base) currency.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        points: f64,
        spot: f64,
        as_of: Date,
        start_days: u32,
        tenor: Period,
        convention: &FxConvention,
        base_is_collateral: bool,
        collateral: CurveRef,
    ) -> CurveResult<Self> {
        let calendar = &convention.advance_calendar;
        let today = calendar.adjust(as_of, BusinessDayConvention::Following);
        let start = calendar.advance_business_days(today, start_days as i32);
        let end = calendar.advance(start, tenor, convention.convention, convention.end_of_month)?;
        Ok(Self {
            points,
            spot,
            label: format!(
                "FX forward {}{} {tenor} from {start}",
                convention.source_currency, convention.target_currency
            ),
            start,
            end,
            base_is_collateral,
            collateral,
        })
    }

    /// Near leg date.
    pub fn start_date(&self) -> Date {
        self.start
    }
}

impl RateHelper for FxSwapHelper {
    fn pillar_date(&self) -> Date {
        self.end
    }

    fn quote(&self) -> f64 {
        self.points
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let ratio = growth(curve, self.start, self.end)?;
        let collateral_ratio = growth(self.collateral.resolve(curve), self.start, self.end)?;
        Ok(if self.base_is_collateral {
            (ratio / collateral_ratio - 1.0) * self.spot
        } else {
            (collateral_ratio / ratio - 1.0) * self.spot
        })
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}
