//! Parametric discount functions for fitted bond curves.

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;

use super::YieldTermStructure;
use crate::config::InterpolationMethod;
use crate::error::{CurveError, CurveResult};

const EPS: f64 = f64::EPSILON;

/// Parametric family of a fitted discount curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FittingMethod {
    /// Four parameters: level, slope, curvature, decay.
    NelsonSiegel,
    /// Nelson-Siegel plus a second hump: six parameters.
    Svensson,
    /// Eight exponential coefficients plus a decay, constrained to `d(0) = 1`.
    ExponentialSplines,
}

impl FittingMethod {
    /// Maps a configured method to its fitting family.
    pub fn from_method(method: InterpolationMethod) -> CurveResult<Self> {
        match method {
            InterpolationMethod::NelsonSiegel => Ok(FittingMethod::NelsonSiegel),
            InterpolationMethod::Svensson => Ok(FittingMethod::Svensson),
            InterpolationMethod::ExponentialSplines => Ok(FittingMethod::ExponentialSplines),
            other => Err(CurveError::configuration(format!(
                "unknown fitting method {other} for fitted bond curve"
            ))),
        }
    }

    /// Number of parameters.
    pub fn size(self) -> usize {
        match self {
            FittingMethod::NelsonSiegel => 4,
            FittingMethod::Svensson => 6,
            FittingMethod::ExponentialSplines => 9,
        }
    }

    /// Name used in calibration reports.
    pub fn name(self) -> &'static str {
        match self {
            FittingMethod::NelsonSiegel => "NelsonSiegel",
            FittingMethod::Svensson => "Svensson",
            FittingMethod::ExponentialSplines => "ExponentialSplines",
        }
    }

    /// Discount factor at `t` for parameters `x`.
    pub fn discount_function(self, x: &[f64], t: f64) -> f64 {
        match self {
            FittingMethod::NelsonSiegel => {
                let kappa = x[3];
                let decay = (-kappa * t).exp();
                let zero = x[0] + (x[1] + x[2]) * (1.0 - decay) / ((kappa + EPS) * (t + EPS))
                    - x[2] * decay;
                (-zero * t).exp()
            }
            FittingMethod::Svensson => {
                let kappa = x[4];
                let kappa1 = x[5];
                let decay = (-kappa * t).exp();
                let decay1 = (-kappa1 * t).exp();
                let zero = x[0]
                    + (x[1] + x[2]) * (1.0 - decay) / ((kappa + EPS) * (t + EPS))
                    - x[2] * decay
                    + x[3] * ((1.0 - decay1) / ((kappa1 + EPS) * (t + EPS)) - decay1);
                (-zero * t).exp()
            }
            FittingMethod::ExponentialSplines => {
                let n = self.size();
                let kappa = x[n - 1];
                let mut d = 0.0;
                let mut coeff = 0.0;
                for (i, xi) in x.iter().take(n - 1).enumerate() {
                    d += xi * (-kappa * (i as f64 + 2.0) * t).exp();
                    coeff += xi;
                }
                d + (1.0 - coeff) * (-kappa * t).exp()
            }
        }
    }
}

/// A fitted discount function.
///
/// With cut-offs set, the curve is flat in the zero rate before the first
/// cut-off and flat in the instantaneous forward after the second.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedBondDiscountCurve {
    reference_date: Date,
    day_counter: DayCountConvention,
    method: FittingMethod,
    parameters: Vec<f64>,
    max_time: f64,
    cut_offs: Option<(f64, f64)>,
    extrapolate: bool,
}

impl FittedBondDiscountCurve {
    /// Creates the curve.
    pub fn new(
        reference_date: Date,
        day_counter: DayCountConvention,
        method: FittingMethod,
        parameters: Vec<f64>,
        max_time: f64,
    ) -> CurveResult<Self> {
        if parameters.len() != method.size() {
            return Err(CurveError::configuration(format!(
                "{} needs {} parameters, {} given",
                method.name(),
                method.size(),
                parameters.len()
            )));
        }
        Ok(Self {
            reference_date,
            day_counter,
            method,
            parameters,
            max_time,
            cut_offs: None,
            extrapolate: true,
        })
    }

    /// Holds the curve flat outside `[min, max]`.
    #[must_use]
    pub fn with_flat_extrapolation(mut self, min: f64, max: f64) -> Self {
        self.cut_offs = Some((min, max));
        self
    }

    /// Sets whether queries beyond the last maturity are allowed.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Fitting family.
    pub fn method(&self) -> FittingMethod {
        self.method
    }

    /// Solved parameters.
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    fn raw(&self, t: f64) -> f64 {
        self.method.discount_function(&self.parameters, t)
    }
}

impl YieldTermStructure for FittedBondDiscountCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn max_time(&self) -> f64 {
        self.max_time
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    fn discount_impl(&self, t: f64) -> f64 {
        match self.cut_offs {
            Some((min, _)) if t < min && min > 0.0 => (self.raw(min).ln() / min * t).exp(),
            Some((_, max)) if t > max => {
                let h = 1.0e-4;
                let d_max = self.raw(max);
                let fwd = (self.raw(max + h).ln() - d_max.ln()) / h;
                d_max * (fwd * (t - max)).exp()
            }
            _ => self.raw(t),
        }
    }
}
