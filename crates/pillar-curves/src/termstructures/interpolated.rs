//! Curves interpolated between pillar values.

use std::fmt;

use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::Date;
use pillar_math::interpolation::{
    CubicBoundary, CubicInterpolator, CubicScheme, Interpolator, LinearInterpolator, LogLinearInterpolator,
    LogQuadraticInterpolator, MonotoneConvex, QuadraticInterpolator,
};

use super::YieldTermStructure;
use crate::config::{InterpolationMethod, InterpolationVariable};
use crate::error::{CurveError, CurveResult};

/// Builds the interpolator for a pillar method.
///
/// Fitting families have no pillar interpolation and are rejected.
pub fn make_interpolator(
    method: InterpolationMethod,
    xs: Vec<f64>,
    ys: Vec<f64>,
) -> CurveResult<Box<dyn Interpolator>> {
    let interpolator: Box<dyn Interpolator> = match method {
        InterpolationMethod::Linear => Box::new(LinearInterpolator::new(xs, ys)?),
        InterpolationMethod::LogLinear => Box::new(LogLinearInterpolator::new(xs, ys)?),
        InterpolationMethod::NaturalCubic => {
            Box::new(CubicInterpolator::new(xs, ys, CubicScheme::Kruger, true)?)
        }
        // Flat forward slope at the long end.
        InterpolationMethod::FinancialCubic => Box::new(CubicInterpolator::with_end_conditions(
            xs,
            ys,
            CubicScheme::Kruger,
            true,
            Some(CubicBoundary::SecondDerivative(0.0)),
            Some(CubicBoundary::FirstDerivative(0.0)),
        )?),
        InterpolationMethod::ConvexMonotone => Box::new(MonotoneConvex::new(xs, ys)?),
        InterpolationMethod::Quadratic => Box::new(QuadraticInterpolator::new(xs, ys)?),
        InterpolationMethod::LogQuadratic => Box::new(LogQuadraticInterpolator::new(xs, ys)?),
        InterpolationMethod::Hermite => {
            Box::new(CubicInterpolator::new(xs, ys, CubicScheme::Parabolic, false)?)
        }
        InterpolationMethod::CubicSpline => {
            Box::new(CubicInterpolator::new(xs, ys, CubicScheme::natural_spline(), false)?)
        }
        InterpolationMethod::ExponentialSplines
        | InterpolationMethod::NelsonSiegel
        | InterpolationMethod::Svensson => {
            return Err(CurveError::configuration(format!(
                "Interpolation method {method} is only supported for fitted bond curves"
            )));
        }
    };
    Ok(interpolator)
}

/// A curve through `(date, value)` nodes.
///
/// The value is a discount factor, a continuously compounded zero rate or
/// an instantaneous forward depending on the [`InterpolationVariable`].
/// Beyond the last node the instantaneous forward is held flat.
pub struct InterpolatedCurve {
    reference_date: Date,
    dates: Vec<Date>,
    times: Vec<f64>,
    values: Vec<f64>,
    variable: InterpolationVariable,
    method: InterpolationMethod,
    day_counter: DayCountConvention,
    extrapolate: bool,
    forward_offset: f64,
    interpolator: Box<dyn Interpolator>,
}

impl fmt::Debug for InterpolatedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolatedCurve")
            .field("reference_date", &self.reference_date)
            .field("dates", &self.dates)
            .field("values", &self.values)
            .field("variable", &self.variable)
            .field("method", &self.method)
            .field("day_counter", &self.day_counter)
            .field("extrapolate", &self.extrapolate)
            .finish_non_exhaustive()
    }
}

impl InterpolatedCurve {
    /// Creates a curve from dated nodes.
    ///
    /// # Errors
    ///
    /// Fails for fewer than two nodes, dates that do not increase, dates
    /// before the reference date, or values the method cannot interpolate.
    pub fn new(
        reference_date: Date,
        dates: Vec<Date>,
        values: Vec<f64>,
        variable: InterpolationVariable,
        method: InterpolationMethod,
        day_counter: DayCountConvention,
    ) -> CurveResult<Self> {
        if dates.len() < 2 {
            return Err(CurveError::interpolation(format!(
                "at least 2 pillars required, {} given",
                dates.len()
            )));
        }
        if dates.len() != values.len() {
            return Err(CurveError::interpolation(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if dates[0] < reference_date {
            return Err(CurveError::interpolation(format!(
                "first pillar {} is before the reference date {reference_date}",
                dates[0]
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(CurveError::interpolation(format!(
                "pillar dates must increase: {} followed by {}",
                w[0], w[1]
            )));
        }
        let times: Vec<f64> = dates
            .iter()
            .map(|d| day_counter.year_fraction_f64(reference_date, *d))
            .collect();
        Self::from_parts(reference_date, dates, times, values, variable, method, day_counter)
    }

    pub(crate) fn from_parts(
        reference_date: Date,
        dates: Vec<Date>,
        times: Vec<f64>,
        values: Vec<f64>,
        variable: InterpolationVariable,
        method: InterpolationMethod,
        day_counter: DayCountConvention,
    ) -> CurveResult<Self> {
        let interpolator = make_interpolator(method, times.clone(), values.clone())?;
        let forward_offset = match variable {
            InterpolationVariable::Forward => values[0] * times[0],
            _ => 0.0,
        };
        Ok(Self {
            reference_date,
            dates,
            times,
            values,
            variable,
            method,
            day_counter,
            extrapolate: true,
            forward_offset,
            interpolator,
        })
    }

    /// Sets whether queries beyond the last pillar are allowed.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    pub(crate) fn set_extrapolation(&mut self, extrapolate: bool) {
        self.extrapolate = extrapolate;
    }

    /// Node dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Node times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Node values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Interpolated quantity.
    pub fn variable(&self) -> InterpolationVariable {
        self.variable
    }

    /// Interpolation method.
    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// A fixed copy with the same nodes.
    pub fn snapshot(&self) -> CurveResult<Self> {
        Ok(Self::from_parts(
            self.reference_date,
            self.dates.clone(),
            self.times.clone(),
            self.values.clone(),
            self.variable,
            self.method,
            self.day_counter,
        )?
        .with_extrapolation(self.extrapolate))
    }

    fn last_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}

impl YieldTermStructure for InterpolatedCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn max_time(&self) -> f64 {
        self.last_time()
    }

    fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    fn pillar_dates(&self) -> Vec<Date> {
        self.dates.clone()
    }

    fn discount_impl(&self, t: f64) -> f64 {
        let t_max = self.last_time();
        let interp = &self.interpolator;
        match self.variable {
            InterpolationVariable::Discount => {
                if t <= t_max {
                    interp.interpolate(t)
                } else {
                    let d_max = interp.interpolate(t_max);
                    let fwd = -interp.derivative(t_max) / d_max;
                    d_max * (-fwd * (t - t_max)).exp()
                }
            }
            InterpolationVariable::Zero => {
                if t == 0.0 {
                    return 1.0;
                }
                let z = if t <= t_max {
                    interp.interpolate(t)
                } else {
                    let z_max = interp.interpolate(t_max);
                    let fwd = z_max + t_max * interp.derivative(t_max);
                    (z_max * t_max + fwd * (t - t_max)) / t
                };
                (-z * t).exp()
            }
            InterpolationVariable::Forward => {
                let integral = if t <= t_max {
                    interp.primitive(t)
                } else {
                    interp.primitive(t_max) + interp.interpolate(t_max) * (t - t_max)
                };
                (-(self.forward_offset + integral)).exp()
            }
        }
    }
}
