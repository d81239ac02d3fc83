//! Post-processing of built curves: calibration diagnostics.
//!
//! Diagnostics are sampled at the curve's pillar dates. Curves without
//! natural pillars (spreaded, composite, fitted) are sampled on
//! [`DEFAULT_PILLAR_TENORS`] instead.

use pillar_core::daycounts::DayCountConvention;
use pillar_core::types::{Compounding, Frequency};
use pillar_core::{Currency, Date, Period};
use serde::{Deserialize, Serialize};

use crate::bootstrap::{BootstrapReport, PiecewiseCurve};
use crate::error::CurveResult;
use crate::fitting::FittedBondCalibration;
use crate::termstructures::YieldTermStructure;

/// Sampling grid for curves with no pillars of their own.
pub const DEFAULT_PILLAR_TENORS: [Period; 21] = [
    Period::days(1),
    Period::weeks(1),
    Period::weeks(2),
    Period::months(1),
    Period::months(2),
    Period::months(3),
    Period::months(6),
    Period::months(9),
    Period::years(1),
    Period::years(2),
    Period::years(3),
    Period::years(5),
    Period::years(7),
    Period::years(10),
    Period::years(12),
    Period::years(15),
    Period::years(20),
    Period::years(25),
    Period::years(30),
    Period::years(40),
    Period::years(50),
];

/// Market against implied quote of one calibration instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentCheck {
    /// Instrument description.
    pub description: String,
    /// Pillar date.
    pub pillar: Date,
    /// Market quote.
    pub market: f64,
    /// Quote implied by the built curve.
    pub implied: f64,
}

impl InstrumentCheck {
    /// Absolute repricing error.
    pub fn error(&self) -> f64 {
        (self.market - self.implied).abs()
    }
}

/// Diagnostics recorded once after a successful build.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationInfo {
    /// Curve currency.
    pub currency: Option<Currency>,
    /// Day counter used for times and zero rates.
    pub day_counter: Option<DayCountConvention>,
    /// Sample dates.
    pub pillar_dates: Vec<Date>,
    /// Sample times.
    pub times: Vec<f64>,
    /// Continuously compounded zero rates.
    pub zero_rates: Vec<f64>,
    /// Discount factors.
    pub discount_factors: Vec<f64>,
    /// Instantaneous forwards.
    pub forward_rates: Vec<f64>,
    /// Bootstrap run summary, for bootstrapped curves.
    pub bootstrap: Option<BootstrapReportInfo>,
    /// Repricing of each bootstrap instrument.
    pub instruments: Vec<InstrumentCheck>,
    /// Fit diagnostics, for fitted bond curves.
    pub fitted_bond: Option<FittedBondCalibration>,
}

/// Serializable copy of a [`BootstrapReport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapReportInfo {
    /// Full passes over the pillars.
    pub passes: usize,
    /// Largest absolute quote error.
    pub max_error: f64,
    /// False when a best-effort value was accepted.
    pub converged: bool,
}

impl From<BootstrapReport> for BootstrapReportInfo {
    fn from(r: BootstrapReport) -> Self {
        Self {
            passes: r.passes,
            max_error: r.max_error,
            converged: r.converged,
        }
    }
}

impl CalibrationInfo {
    /// Samples `curve` at its pillars, or on the default grid.
    pub fn sample(curve: &dyn YieldTermStructure, currency: Currency) -> CurveResult<Self> {
        let mut dates = curve.pillar_dates();
        if dates.is_empty() {
            dates = default_pillar_dates(curve.reference_date())?;
        }
        let reference = curve.reference_date();
        let day_counter = curve.day_counter();
        let mut info = Self {
            currency: Some(currency),
            day_counter: Some(day_counter),
            ..Self::default()
        };
        for date in dates {
            if date < reference {
                continue;
            }
            let t = curve.time_from_reference(date);
            if t > curve.max_time() && !curve.allows_extrapolation() {
                continue;
            }
            let zero = curve.zero_rate(date, day_counter, Compounding::Continuous, Frequency::Annual)?;
            info.pillar_dates.push(date);
            info.times.push(t);
            info.zero_rates.push(zero.rate);
            info.discount_factors.push(curve.discount(t)?);
            info.forward_rates.push(curve.instantaneous_forward(t)?);
        }
        Ok(info)
    }

    /// Adds the run summary and per-instrument repricing of a bootstrap.
    pub fn with_bootstrap(mut self, curve: &PiecewiseCurve) -> CurveResult<Self> {
        self.bootstrap = Some(curve.report().into());
        for helper in curve.helpers() {
            self.instruments.push(InstrumentCheck {
                description: helper.description(),
                pillar: helper.pillar_date(),
                market: helper.quote(),
                implied: helper.implied_quote(curve)?,
            });
        }
        Ok(self)
    }

    /// Adds fitted bond diagnostics.
    #[must_use]
    pub fn with_fitted_bond(mut self, fit: FittedBondCalibration) -> Self {
        self.fitted_bond = Some(fit);
        self
    }

    /// Largest repricing error over the bootstrap instruments.
    pub fn max_instrument_error(&self) -> f64 {
        self.instruments
            .iter()
            .map(InstrumentCheck::error)
            .fold(0.0, f64::max)
    }
}

/// The default grid rolled from `as_of`.
pub fn default_pillar_dates(as_of: Date) -> CurveResult<Vec<Date>> {
    let mut dates = Vec::with_capacity(DEFAULT_PILLAR_TENORS.len());
    for tenor in DEFAULT_PILLAR_TENORS {
        dates.push(as_of.add_period(tenor, false)?);
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::{as_of, flat};
    use approx::assert_relative_eq;

    #[test]
    fn test_default_grid_for_flat_curve() {
        let info = CalibrationInfo::sample(&flat(0.02), Currency::EUR).unwrap();
        assert_eq!(info.pillar_dates.len(), DEFAULT_PILLAR_TENORS.len());
        assert_eq!(info.pillar_dates[0], Date::from_ymd(2024, 1, 16).unwrap());
        for ((z, df), t) in info.zero_rates.iter().zip(&info.discount_factors).zip(&info.times) {
            assert_relative_eq!(*z, 0.02, epsilon = 1e-12);
            assert_relative_eq!(*df, (-0.02 * t).exp(), epsilon = 1e-14);
        }
        assert_eq!(info.currency, Some(Currency::EUR));
        assert!(info.bootstrap.is_none());
        assert_eq!(info.max_instrument_error(), 0.0);
    }

    #[test]
    fn test_grid_dates_increase() {
        let dates = default_pillar_dates(as_of()).unwrap();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*dates.last().unwrap(), Date::from_ymd(2074, 1, 15).unwrap());
    }
}
