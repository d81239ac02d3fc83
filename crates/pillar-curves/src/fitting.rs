//! Parametric fit of a discount function to bond prices.

use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::Date;
use pillar_math::optimization::{nelder_mead, OptimizationConfig};
use pillar_math::sequences::HaltonSequence;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BootstrapConfig;
use crate::error::{CurveError, CurveResult};
use crate::helpers::{BondHelper, RateHelper};
use crate::termstructures::{FittedBondDiscountCurve, FittingMethod};

const HALTON_SEED: u64 = 42;
const FIT_TOLERANCE: f64 = 1.0e-16;
const FIT_MAX_ITERATIONS: u32 = 10_000;
const SMALL_SOLUTION: f64 = 1.0e-4;

/// Diagnostics of a fitted bond curve.
///
/// Prices are fractions of face value, yields continuously compounded
/// Act/Act ISDA.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FittedBondCalibration {
    /// Security IDs of the bonds used.
    pub securities: Vec<String>,
    /// Their maturities.
    pub maturities: Vec<Date>,
    /// Quoted clean prices.
    pub market_prices: Vec<f64>,
    /// Yields at the quoted prices.
    pub market_yields: Vec<f64>,
    /// Clean prices off the fitted curve.
    pub model_prices: Vec<f64>,
    /// Yields at the model prices.
    pub model_yields: Vec<f64>,
    /// Acceptance threshold on the cost.
    pub tolerance: f64,
    /// Root of the weighted squared price errors.
    pub cost: f64,
    /// Solved parameters.
    pub solution: Vec<f64>,
    /// Optimiser iterations of the kept trial.
    pub iterations: u32,
    /// Fitting family name.
    pub fitting_method: String,
}

/// A fitted curve and its diagnostics.
#[derive(Debug, Clone)]
pub struct BondFit {
    /// The fitted discount curve.
    pub curve: FittedBondDiscountCurve,
    /// Fit diagnostics.
    pub calibration: FittedBondCalibration,
}

/// Multi-start least squares fit of a [`FittingMethod`].
#[derive(Debug, Clone)]
pub struct BondCurveFitter {
    reference_date: Date,
    day_counter: DayCountConvention,
    method: FittingMethod,
    config: BootstrapConfig,
    extrapolate_flat: bool,
    extrapolate: bool,
}

struct UsableBond {
    helper: BondHelper,
    market_yield: f64,
    weight: f64,
}

impl BondCurveFitter {
    /// Creates a fitter with default tolerances.
    pub fn new(reference_date: Date, day_counter: DayCountConvention, method: FittingMethod) -> Self {
        Self {
            reference_date,
            day_counter,
            method,
            config: BootstrapConfig::default(),
            extrapolate_flat: false,
            extrapolate: true,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: BootstrapConfig) -> Self {
        self.config = config;
        self
    }

    /// Holds the curve flat before the first and after the last maturity.
    #[must_use]
    pub fn with_flat_extrapolation(mut self, flat: bool) -> Self {
        self.extrapolate_flat = flat;
        self
    }

    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Fits the curve to the bonds that can settle after the reference date.
    ///
    /// # Errors
    ///
    /// Fails when no bond is usable, or when the best cost is above the
    /// tolerance and `dont_throw` is off.
    pub fn fit(&self, helpers: Vec<BondHelper>) -> CurveResult<BondFit> {
        self.config.validate()?;
        let bonds = self.usable(helpers)?;
        if bonds.is_empty() {
            return Err(CurveError::empty("no bonds for fitting bond curve"));
        }
        debug!(bonds = bonds.len(), method = self.method.name(), "fitting bond curve");

        let first = bonds
            .iter()
            .map(|b| b.helper.pillar_date())
            .min()
            .unwrap_or(self.reference_date);
        let last = bonds
            .iter()
            .map(|b| b.helper.pillar_date())
            .max()
            .unwrap_or(self.reference_date);
        let max_time = self.time(last);
        let cut_offs = self
            .extrapolate_flat
            .then(|| (self.time(first), max_time));

        let trials = match self.method {
            FittingMethod::NelsonSiegel => self.config.max_attempts,
            _ => {
                if self.config.max_attempts > 1 {
                    warn!(
                        method = self.method.name(),
                        "randomised optimisation seeds not implemented for this fitting method"
                    );
                }
                1
            }
        };

        let cost = |x: &[f64]| -> f64 {
            let Ok(curve) = self.curve(x.to_vec(), max_time, cut_offs) else {
                return f64::NAN;
            };
            let mut sum = 0.0;
            for b in &bonds {
                match b.helper.quote_error(&curve) {
                    Ok(e) => sum += b.weight * e * e,
                    Err(_) => return f64::NAN,
                }
            }
            sum
        };
        let optimizer = OptimizationConfig::default()
            .with_tolerance(FIT_TOLERANCE)
            .with_max_iterations(FIT_MAX_ITERATIONS);

        let mut halton = HaltonSequence::randomized(self.method.size(), HALTON_SEED);
        let mut best: Option<(f64, Vec<f64>, u32)> = None;
        for trial in 0..trials {
            let guess = if trial == 0 {
                self.initial_guess(&bonds)
            } else {
                let u = halton.next_vec();
                vec![u[0] * 0.10 - 0.05, u[1] * 0.10 - 0.05, u[2] * 0.10 - 0.05, u[3] * 5.0]
            };
            let result = nelder_mead(&cost, &guess, &optimizer)?;
            let trial_cost = result.objective_value.sqrt();
            debug!(
                trial = trial + 1,
                trials,
                cost = trial_cost,
                "calibration trial finished"
            );
            if best.as_ref().map_or(true, |(c, _, _)| trial_cost < *c) {
                best = Some((trial_cost, result.parameters, result.iterations));
            }
            if trial_cost < self.config.accuracy {
                debug!(accuracy = self.config.accuracy, "reached desired accuracy");
                break;
            }
        }
        let Some((min_cost, solution, iterations)) = best else {
            return Err(CurveError::convergence(
                "no best solution found for fitted bond curve",
            ));
        };

        if solution.iter().map(|x| x * x).sum::<f64>().sqrt() < SMALL_SOLUTION {
            warn!("Fit solution is close to 0. The curve fitting should be reviewed.");
        }

        let tolerance = self.config.global_accuracy.unwrap_or(self.config.accuracy);
        if !self.config.dont_throw && !(min_cost < tolerance) {
            return Err(CurveError::convergence(format!(
                "Fitted Bond Curve cost value ({min_cost}) exceeds tolerance ({tolerance})"
            )));
        }

        let curve = self
            .curve(solution.clone(), max_time, cut_offs)?
            .with_extrapolation(self.extrapolate);
        let mut calibration = FittedBondCalibration {
            tolerance,
            cost: min_cost,
            solution,
            iterations,
            fitting_method: self.method.name().to_string(),
            ..FittedBondCalibration::default()
        };
        for b in &bonds {
            let model = b.helper.implied_quote(&curve)?;
            calibration.securities.push(b.helper.bond().security_id.clone());
            calibration.maturities.push(b.helper.pillar_date());
            calibration.market_prices.push(b.helper.quote() / 100.0);
            calibration.market_yields.push(b.market_yield);
            calibration.model_prices.push(model / 100.0);
            calibration
                .model_yields
                .push(b.helper.bond().market_yield(model, b.helper.settlement_date())?);
        }
        debug!(cost = min_cost, iterations, "fitted bond curve built");
        Ok(BondFit { curve, calibration })
    }

    fn time(&self, date: Date) -> f64 {
        self.day_counter.year_fraction_f64(self.reference_date, date)
    }

    fn curve(
        &self,
        parameters: Vec<f64>,
        max_time: f64,
        cut_offs: Option<(f64, f64)>,
    ) -> CurveResult<FittedBondDiscountCurve> {
        let curve = FittedBondDiscountCurve::new(
            self.reference_date,
            self.day_counter,
            self.method,
            parameters,
            max_time,
        )?;
        Ok(match cut_offs {
            Some((min, max)) => curve.with_flat_extrapolation(min, max),
            None => curve,
        })
    }

    fn usable(&self, helpers: Vec<BondHelper>) -> CurveResult<Vec<UsableBond>> {
        let mut bonds = Vec::with_capacity(helpers.len());
        for helper in helpers {
            let settlement = helper.settlement_date();
            let id = helper.bond().security_id.clone();
            if settlement <= self.reference_date || !helper.bond().is_tradable(settlement) {
                debug!(security = %id, %settlement, "skipped bond");
                continue;
            }
            let market_yield = helper.market_yield()?;
            let duration = helper.bond().duration(market_yield, settlement)?;
            debug!(
                security = %id,
                maturity = %helper.pillar_date(),
                clean_price = helper.quote(),
                market_yield,
                "added bond"
            );
            bonds.push(UsableBond {
                helper,
                market_yield,
                weight: 1.0 / duration,
            });
        }
        let total: f64 = bonds.iter().map(|b| b.weight).sum();
        if total > 0.0 {
            for b in &mut bonds {
                b.weight /= total;
            }
        }
        Ok(bonds)
    }

    fn initial_guess(&self, bonds: &[UsableBond]) -> Vec<f64> {
        let long = bonds
            .iter()
            .max_by_key(|b| b.helper.pillar_date())
            .map_or(0.0, |b| b.market_yield);
        let short = bonds
            .iter()
            .min_by_key(|b| b.helper.pillar_date())
            .map_or(0.0, |b| b.market_yield);
        match self.method {
            FittingMethod::NelsonSiegel => vec![long, short - long, 0.0, 5.0],
            FittingMethod::Svensson => vec![long, short - long, 0.0, 0.0, 5.0, 1.0],
            FittingMethod::ExponentialSplines => {
                let mut x = vec![0.0; self.method.size()];
                x[self.method.size() - 1] = long.max(0.01);
                x
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::{as_of, flat};
    use crate::helpers::FixedRateBond;
    use approx::assert_relative_eq;
    use pillar_core::calendars::{BusinessDayConvention, CalendarId};
    use pillar_core::types::Frequency;
    use rust_decimal::Decimal;

    fn bond(id: &str, years: i32, coupon: Decimal) -> FixedRateBond {
        FixedRateBond {
            security_id: id.into(),
            issue_date: Date::from_ymd(2023, 6, 15).unwrap(),
            maturity_date: Date::from_ymd(2023 + years, 6, 15).unwrap(),
            coupon,
            frequency: Frequency::Annual,
            day_counter: DayCountConvention::ActActIsda,
            calendar: CalendarId::Target,
            convention: BusinessDayConvention::Following,
            settlement_days: 2,
            redemption: Decimal::ONE_HUNDRED,
        }
    }

    fn helpers(rate: f64) -> Vec<BondHelper> {
        let curve = flat(rate);
        [(2, "0.02"), (3, "0.025"), (5, "0.03"), (7, "0.03"), (10, "0.035")]
            .iter()
            .enumerate()
            .map(|(i, (years, coupon))| {
                let b = bond(&format!("B{i}"), *years, coupon.parse().unwrap());
                let settle = b.settlement_date(as_of());
                let price = b.clean_price(&curve, settle).unwrap();
                BondHelper::new(b, price, as_of())
            })
            .collect()
    }

    fn config() -> BootstrapConfig {
        BootstrapConfig {
            accuracy: 1e-6,
            ..BootstrapConfig::default()
        }
    }

    #[test]
    fn test_nelson_siegel_recovers_flat_curve() {
        let fit = BondCurveFitter::new(as_of(), DayCountConvention::Act365Fixed, FittingMethod::NelsonSiegel)
            .with_config(config())
            .fit(helpers(0.03))
            .unwrap();
        let cal = &fit.calibration;
        assert!(cal.cost < 1e-6, "{}", cal.cost);
        assert_eq!(cal.fitting_method, "NelsonSiegel");
        assert_eq!(cal.securities.len(), 5);
        for (market, model) in cal.market_prices.iter().zip(&cal.model_prices) {
            assert_relative_eq!(market, model, epsilon = 1e-6);
        }
        assert_relative_eq!(fit.curve.parameters()[0], 0.03, epsilon = 1e-3);
    }

    #[test]
    fn test_flat_extrapolation_outside_maturities() {
        let fit = BondCurveFitter::new(as_of(), DayCountConvention::Act365Fixed, FittingMethod::NelsonSiegel)
            .with_config(config())
            .with_flat_extrapolation(true)
            .fit(helpers(0.03))
            .unwrap();
        use crate::termstructures::YieldTermStructure;
        let f1 = (fit.curve.discount(20.0).unwrap() / fit.curve.discount(21.0).unwrap()).ln();
        let f2 = (fit.curve.discount(30.0).unwrap() / fit.curve.discount(31.0).unwrap()).ln();
        assert_relative_eq!(f1, f2, epsilon = 1e-10);
    }

    #[test]
    fn test_matured_bonds_skipped_and_empty_rejected() {
        let matured = bond("OLD", 0, Decimal::ONE);
        let h = BondHelper::new(matured, 100.0, as_of());
        let err = BondCurveFitter::new(as_of(), DayCountConvention::Act365Fixed, FittingMethod::NelsonSiegel)
            .fit(vec![h])
            .unwrap_err();
        assert!(matches!(err, CurveError::EmptyCurveData { .. }));
    }

    #[test]
    fn test_tolerance_gate() {
        // Accuracy no fit can reach.
        let strict = BootstrapConfig {
            accuracy: 1e-30,
            max_attempts: 1,
            ..BootstrapConfig::default()
        };
        let fitter = BondCurveFitter::new(as_of(), DayCountConvention::Act365Fixed, FittingMethod::Svensson);
        let err = fitter.clone().with_config(strict.clone()).fit(helpers(0.03)).unwrap_err();
        assert!(err.to_string().contains("exceeds tolerance"));
        let lenient = BootstrapConfig {
            dont_throw: true,
            ..strict
        };
        assert!(fitter.with_config(lenient).fit(helpers(0.03)).is_ok());
    }
}
