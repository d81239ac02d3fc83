//! Iterative bootstrap of piecewise interpolated curves.
//!
//! Helpers are sorted by pillar date and solved one node at a time: the
//! node value at pillar `i` is the root of the helper's quote error with
//! every earlier node held fixed. Methods whose interpolant is not local
//! (cubic, monotone convex, quadratic) repeat the full pass until node
//! values stop moving.

use std::cell::RefCell;

use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::Date;
use pillar_math::solvers::{brent, SolverConfig};
use tracing::{debug, warn};

use crate::config::{BootstrapConfig, InterpolationMethod, InterpolationVariable};
use crate::error::{CurveError, CurveResult};
use crate::helpers::RateHelper;
use crate::termstructures::{InterpolatedCurve, YieldTermStructure};

/// Lowest forward rate of the first search bracket.
const MIN_RATE: f64 = -0.05;
/// Highest forward rate of the first search bracket.
const MAX_RATE: f64 = 0.30;
/// Cap on full passes for non-local interpolation.
const MAX_GLOBAL_PASSES: usize = 100;
/// Root finder evaluations per bracket.
const MAX_SOLVER_ITERATIONS: u32 = 200;

/// Summary of a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapReport {
    /// Full passes over the pillars.
    pub passes: usize,
    /// Largest absolute quote error on the final curve.
    pub max_error: f64,
    /// False when a best-effort value was accepted.
    pub converged: bool,
}

/// A bootstrapped curve together with the helpers it was solved from.
pub struct PiecewiseCurve {
    curve: InterpolatedCurve,
    helpers: Vec<Box<dyn RateHelper>>,
    report: BootstrapReport,
}

impl std::fmt::Debug for PiecewiseCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiecewiseCurve")
            .field("curve", &self.curve)
            .field("helpers", &self.helpers.len())
            .field("report", &self.report)
            .finish()
    }
}

impl PiecewiseCurve {
    /// The solved nodes.
    pub fn curve(&self) -> &InterpolatedCurve {
        &self.curve
    }

    /// Helpers, sorted by pillar date.
    pub fn helpers(&self) -> &[Box<dyn RateHelper>] {
        &self.helpers
    }

    /// Run summary.
    pub fn report(&self) -> BootstrapReport {
        self.report
    }

    /// A fixed curve with the same nodes, no longer tied to the helpers.
    pub fn detach(&self) -> CurveResult<InterpolatedCurve> {
        self.curve.snapshot()
    }

    /// Drops the helpers and keeps the nodes.
    pub fn into_curve(self) -> InterpolatedCurve {
        self.curve
    }
}

impl YieldTermStructure for PiecewiseCurve {
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

/// Pillar-by-pillar solver.
///
/// # Example
///
/// ```rust,ignore
/// let curve = IterativeBootstrap::new(as_of, DayCountConvention::Act365Fixed)
///     .with_interpolation(InterpolationVariable::Discount, InterpolationMethod::LogLinear)
///     .bootstrap(helpers)?;
/// ```
#[derive(Debug, Clone)]
pub struct IterativeBootstrap {
    reference_date: Date,
    day_counter: DayCountConvention,
    variable: InterpolationVariable,
    method: InterpolationMethod,
    config: BootstrapConfig,
    extrapolate: bool,
}

impl IterativeBootstrap {
    /// Log-linear discount bootstrap with default tolerances.
    pub fn new(reference_date: Date, day_counter: DayCountConvention) -> Self {
        Self {
            reference_date,
            day_counter,
            variable: InterpolationVariable::Discount,
            method: InterpolationMethod::LogLinear,
            config: BootstrapConfig::default(),
            extrapolate: true,
        }
    }

    /// Sets the interpolated quantity and method.
    #[must_use]
    pub fn with_interpolation(
        mut self,
        variable: InterpolationVariable,
        method: InterpolationMethod,
    ) -> Self {
        self.variable = variable;
        self.method = method;
        self
    }

    /// Sets tolerances and retry policy.
    #[must_use]
    pub fn with_config(mut self, config: BootstrapConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets extrapolation on the result.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Solves one node per helper.
    ///
    /// # Errors
    ///
    /// Fails when there are no helpers, two helpers share a pillar date, a
    /// pillar is not after the reference date, or a node cannot be solved
    /// and `dont_throw` is off.
    pub fn bootstrap(&self, mut helpers: Vec<Box<dyn RateHelper>>) -> CurveResult<PiecewiseCurve> {
        self.config.validate()?;
        if self.method.is_fitting() {
            return Err(CurveError::configuration(format!(
                "Interpolation method {} cannot be bootstrapped",
                self.method
            )));
        }
        if helpers.is_empty() {
            return Err(CurveError::empty("no instruments to bootstrap"));
        }

        helpers.sort_by_key(|h| h.pillar_date());
        if let Some(w) = helpers.windows(2).find(|w| w[0].pillar_date() == w[1].pillar_date()) {
            return Err(CurveError::data(format!(
                "more than one instrument with pillar {}: {} and {}",
                w[0].pillar_date(),
                w[0].description(),
                w[1].description()
            )));
        }
        if helpers[0].pillar_date() <= self.reference_date {
            return Err(CurveError::data(format!(
                "{} has pillar {} on or before the reference date {}",
                helpers[0].description(),
                helpers[0].pillar_date(),
                self.reference_date
            )));
        }

        let mut dates = Vec::with_capacity(helpers.len() + 1);
        dates.push(self.reference_date);
        dates.extend(helpers.iter().map(|h| h.pillar_date()));
        let times: Vec<f64> = dates
            .iter()
            .map(|d| self.day_counter.year_fraction_f64(self.reference_date, *d))
            .collect();
        let mut values = vec![self.anchor_value(); dates.len()];

        let tolerance = self.config.global_accuracy.unwrap_or(self.config.accuracy);
        let max_passes = if self.method.is_global() { MAX_GLOBAL_PASSES } else { 1 };
        let mut converged = true;
        let mut passes = 0;
        loop {
            let previous = values.clone();
            for (i, helper) in helpers.iter().enumerate() {
                let node = i + 1;
                let last = if passes == 0 { node } else { dates.len() - 1 };
                let solved = self.solve_node(helper.as_ref(), &dates, &times, &values, node, last)?;
                if !solved.converged {
                    converged = false;
                }
                values[node] = solved.value;
                if node == 1 && self.variable != InterpolationVariable::Discount {
                    values[0] = solved.value;
                }
            }
            passes += 1;
            if max_passes == 1 {
                break;
            }
            let change = values
                .iter()
                .zip(&previous)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            if passes > 1 && change < tolerance {
                break;
            }
            if passes >= max_passes {
                if !self.config.dont_throw {
                    return Err(CurveError::convergence(format!(
                        "convergence not reached after {passes} passes, last change {change:e} above {tolerance:e}"
                    )));
                }
                warn!(passes, change, "bootstrap passes exhausted, keeping last values");
                converged = false;
                break;
            }
        }

        let curve = self
            .trial_curve(&dates, &times, values)?
            .with_extrapolation(self.extrapolate);
        let mut max_error: f64 = 0.0;
        for helper in &helpers {
            max_error = max_error.max(helper.quote_error(&curve)?.abs());
        }
        debug!(
            pillars = helpers.len(),
            passes,
            max_error,
            "bootstrap finished"
        );
        Ok(PiecewiseCurve {
            curve,
            helpers,
            report: BootstrapReport {
                passes,
                max_error,
                converged,
            },
        })
    }

    fn anchor_value(&self) -> f64 {
        match self.variable {
            InterpolationVariable::Discount => 1.0,
            InterpolationVariable::Zero | InterpolationVariable::Forward => 0.0,
        }
    }

    fn trial_curve(
        &self,
        dates: &[Date],
        times: &[f64],
        values: Vec<f64>,
    ) -> CurveResult<InterpolatedCurve> {
        InterpolatedCurve::from_parts(
            self.reference_date,
            dates.to_vec(),
            times.to_vec(),
            values,
            self.variable,
            self.method,
            self.day_counter,
        )
    }

    /// Search interval for node `i` on a given attempt, from a band of
    /// forward rates over the last pillar interval.
    fn bracket(&self, attempt: usize, values: &[f64], times: &[f64], i: usize) -> (f64, f64) {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let lo_rate = MIN_RATE * self.config.min_factor.powi(exponent);
        let hi_rate = MAX_RATE * self.config.max_factor.powi(exponent);
        let dt = times[i] - times[i - 1];
        let (a, b) = match self.variable {
            InterpolationVariable::Discount => (
                values[i - 1] * (-hi_rate * dt).exp(),
                values[i - 1] * (-lo_rate * dt).exp(),
            ),
            InterpolationVariable::Zero => {
                let prev = if i == 1 { 0.0 } else { values[i - 1] * times[i - 1] };
                ((prev + lo_rate * dt) / times[i], (prev + hi_rate * dt) / times[i])
            }
            InterpolationVariable::Forward => (lo_rate, hi_rate),
        };
        let (a, b) = (a.min(b), a.max(b));
        let logarithmic = matches!(
            self.method,
            InterpolationMethod::LogLinear | InterpolationMethod::LogQuadratic
        );
        if logarithmic && self.variable != InterpolationVariable::Discount {
            (a.max(f64::EPSILON), b)
        } else {
            (a, b)
        }
    }

    fn solve_node(
        &self,
        helper: &dyn RateHelper,
        dates: &[Date],
        times: &[f64],
        values: &[f64],
        node: usize,
        last: usize,
    ) -> CurveResult<Solved> {
        let failure = RefCell::new(None::<String>);
        let objective = |x: f64| {
            let mut trial = values[..=last].to_vec();
            trial[node] = x;
            if node == 1 && self.variable != InterpolationVariable::Discount {
                trial[0] = x;
            }
            match self
                .trial_curve(&dates[..=last], &times[..=last], trial)
                .and_then(|curve| helper.quote_error(&curve))
            {
                Ok(error) => error,
                Err(e) => {
                    failure.borrow_mut().get_or_insert_with(|| e.to_string());
                    f64::NAN
                }
            }
        };

        let solver = SolverConfig::new(self.config.accuracy, MAX_SOLVER_ITERATIONS);
        let mut last_error = String::new();
        let mut bracket = (0.0, 0.0);
        for attempt in 0..self.config.max_attempts {
            bracket = self.bracket(attempt, values, times, node);
            match brent(&objective, bracket.0, bracket.1, &solver) {
                Ok(result) => {
                    return Ok(Solved {
                        value: result.root,
                        converged: true,
                    })
                }
                Err(e) => {
                    last_error = failure.borrow_mut().take().unwrap_or_else(|| e.to_string());
                    debug!(
                        attempt,
                        low = bracket.0,
                        high = bracket.1,
                        instrument = %helper.description(),
                        "bootstrap attempt failed"
                    );
                }
            }
        }

        if !self.config.dont_throw {
            return Err(CurveError::convergence(format!(
                "{} at pillar {} could not be solved after {} attempts: {last_error}",
                helper.description(),
                dates[node],
                self.config.max_attempts
            )));
        }

        let steps = self.config.dont_throw_steps.max(1);
        let mut best: Option<(f64, f64)> = None;
        for k in 0..=steps {
            let x = bracket.0 + (bracket.1 - bracket.0) * k as f64 / steps as f64;
            let error = objective(x).abs();
            if error.is_finite() && best.map_or(true, |(_, e)| error < e) {
                best = Some((x, error));
            }
        }
        match best {
            Some((value, error)) => {
                warn!(
                    instrument = %helper.description(),
                    pillar = %dates[node],
                    error,
                    "bootstrap did not converge, using closest value"
                );
                Ok(Solved {
                    value,
                    converged: false,
                })
            }
            None => Err(CurveError::convergence(format!(
                "{} at pillar {} has no valid value in [{}, {}]: {last_error}",
                helper.description(),
                dates[node],
                bracket.0,
                bracket.1
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Solved {
    value: f64,
    converged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::as_of;
    use crate::helpers::DepositHelper;
    use approx::assert_relative_eq;
    use pillar_core::calendars::{BusinessDayConvention, CalendarId};
    use pillar_core::Period;

    fn deposit(rate: f64, months: i32) -> Box<dyn RateHelper> {
        Box::new(
            DepositHelper::new(
                rate,
                as_of(),
                Period::months(months),
                2,
                &CalendarId::Target,
                BusinessDayConvention::ModifiedFollowing,
                false,
                DayCountConvention::Act360,
            )
            .unwrap(),
        )
    }

    fn strip() -> Vec<Box<dyn RateHelper>> {
        vec![deposit(0.036, 6), deposit(0.035, 1), deposit(0.0355, 3), deposit(0.037, 12)]
    }

    #[test]
    fn test_reprices_every_helper() {
        for variable in [
            InterpolationVariable::Discount,
            InterpolationVariable::Zero,
            InterpolationVariable::Forward,
        ] {
            for method in [
                InterpolationMethod::Linear,
                InterpolationMethod::LogLinear,
                InterpolationMethod::CubicSpline,
                InterpolationMethod::ConvexMonotone,
            ] {
                let curve = IterativeBootstrap::new(as_of(), DayCountConvention::Act365Fixed)
                    .with_interpolation(variable, method)
                    .bootstrap(strip())
                    .unwrap();
                assert_eq!(curve.discount(0.0).unwrap(), 1.0);
                for h in curve.helpers() {
                    assert_relative_eq!(h.implied_quote(&curve).unwrap(), h.quote(), epsilon = 1e-9);
                }
                assert!(curve.report().converged, "{variable:?} {method:?}");
            }
        }
    }

    #[test]
    fn test_helpers_sorted_and_detached() {
        let curve = IterativeBootstrap::new(as_of(), DayCountConvention::Act365Fixed)
            .bootstrap(strip())
            .unwrap();
        let pillars: Vec<Date> = curve.helpers().iter().map(|h| h.pillar_date()).collect();
        assert!(pillars.windows(2).all(|w| w[0] < w[1]));
        let detached = curve.detach().unwrap();
        for d in curve.pillar_dates() {
            assert_eq!(detached.discount_date(d).unwrap(), curve.discount_date(d).unwrap());
        }
    }

    #[test]
    fn test_duplicate_pillar_rejected() {
        let err = IterativeBootstrap::new(as_of(), DayCountConvention::Act365Fixed)
            .bootstrap(vec![deposit(0.03, 3), deposit(0.031, 3)])
            .unwrap_err();
        assert!(matches!(err, CurveError::Data { .. }));
        assert!(err.to_string().contains("more than one instrument"));
    }

    #[test]
    fn test_empty_and_fitting_rejected() {
        let boot = IterativeBootstrap::new(as_of(), DayCountConvention::Act365Fixed);
        assert!(matches!(boot.bootstrap(Vec::new()), Err(CurveError::EmptyCurveData { .. })));
        let err = boot
            .clone()
            .with_interpolation(InterpolationVariable::Discount, InterpolationMethod::NelsonSiegel)
            .bootstrap(strip())
            .unwrap_err();
        assert!(matches!(err, CurveError::Configuration { .. }));
    }

    #[test]
    fn test_unreachable_quote_fails_or_degrades() {
        // A 1M deposit at 900% lies outside every bracket.
        let config = BootstrapConfig {
            max_attempts: 2,
            ..BootstrapConfig::default()
        };
        let boot = IterativeBootstrap::new(as_of(), DayCountConvention::Act365Fixed)
            .with_config(config.clone());
        let err = boot.bootstrap(vec![deposit(9.0, 1)]).unwrap_err();
        assert!(matches!(err, CurveError::Convergence { .. }));

        let lenient = IterativeBootstrap::new(as_of(), DayCountConvention::Act365Fixed)
            .with_config(BootstrapConfig {
                dont_throw: true,
                ..config
            });
        let curve = lenient.bootstrap(vec![deposit(9.0, 1)]).unwrap();
        assert!(!curve.report().converged);
        assert!(curve.report().max_error > 0.0);
    }
}
