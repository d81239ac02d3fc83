//! Curve configurations.
//!
//! A [`YieldCurveConfig`] declares the segments a curve is built from,
//! the interpolation scheme and the bootstrap tolerances. Segments are a
//! closed tagged union; each variant carries only the references its family
//! needs.
//!
//! ```toml
//! [[yield_curve]]
//! id = "EUR-ESTER"
//! currency = "EUR"
//! interpolation_variable = "Discount"
//! interpolation_method = "LogLinear"
//!
//! [[yield_curve.segments]]
//! type = "Deposit"
//! conventions = "EUR-DEP"
//! quotes = ["MM/RATE/EUR/0D/1D"]
//!
//! [[yield_curve.segments]]
//! type = "Ois"
//! conventions = "EUR-ESTER-OIS"
//! quotes = ["IR_SWAP/RATE/EUR/2D/1D/1Y", "IR_SWAP/RATE/EUR/2D/1D/2Y"]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Currency;
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// Identity of a curve: currency plus configuration ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurveSpec {
    /// Curve currency.
    pub currency: Currency,
    /// Curve configuration ID.
    pub config_id: String,
}

impl CurveSpec {
    /// Creates a spec.
    pub fn new(currency: Currency, config_id: impl Into<String>) -> Self {
        Self {
            currency,
            config_id: config_id.into(),
        }
    }

    /// Pool key, `Yield/{CCY}/{ID}`.
    pub fn name(&self) -> String {
        yield_curve_key(self.currency, &self.config_id)
    }
}

impl fmt::Display for CurveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Yield/{}/{}", self.currency, self.config_id)
    }
}

/// Pool key of a yield curve.
pub fn yield_curve_key(currency: Currency, id: &str) -> String {
    format!("Yield/{currency}/{id}")
}

/// The quantity interpolated between pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InterpolationVariable {
    /// Continuously compounded zero rate.
    Zero,
    /// Discount factor.
    #[default]
    Discount,
    /// Instantaneous forward rate.
    Forward,
}

impl fmt::Display for InterpolationVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterpolationVariable::Zero => "Zero",
            InterpolationVariable::Discount => "Discount",
            InterpolationVariable::Forward => "Forward",
        })
    }
}

impl FromStr for InterpolationVariable {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Zero" => Ok(InterpolationVariable::Zero),
            "Discount" => Ok(InterpolationVariable::Discount),
            "Forward" => Ok(InterpolationVariable::Forward),
            _ => Err(CurveError::configuration(format!(
                "Yield curve interpolation variable {s} not recognized"
            ))),
        }
    }
}

impl TryFrom<String> for InterpolationVariable {
    type Error = CurveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InterpolationVariable> for String {
    fn from(value: InterpolationVariable) -> Self {
        value.to_string()
    }
}

/// Interpolation between pillars, or a parametric family for fitted curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InterpolationMethod {
    /// Linear.
    Linear,
    /// Linear in the logarithm.
    #[default]
    LogLinear,
    /// Natural cubic.
    NaturalCubic,
    /// Financial cubic.
    FinancialCubic,
    /// Hagan-West monotone convex.
    ConvexMonotone,
    /// Exponential splines (fitted curves only).
    ExponentialSplines,
    /// C1 quadratic.
    Quadratic,
    /// C1 quadratic in the logarithm.
    LogQuadratic,
    /// Parabolic Hermite cubic.
    Hermite,
    /// Natural cubic spline without monotonicity filter.
    CubicSpline,
    /// Nelson-Siegel (fitted curves only).
    NelsonSiegel,
    /// Svensson (fitted curves only).
    Svensson,
}

impl InterpolationMethod {
    /// True for the parametric families used by fitted bond curves.
    pub fn is_fitting(self) -> bool {
        matches!(
            self,
            InterpolationMethod::ExponentialSplines
                | InterpolationMethod::NelsonSiegel
                | InterpolationMethod::Svensson
        )
    }

    /// True when moving one node changes the interpolant away from it.
    pub fn is_global(self) -> bool {
        !matches!(self, InterpolationMethod::Linear | InterpolationMethod::LogLinear)
    }

    fn name(self) -> &'static str {
        match self {
            InterpolationMethod::Linear => "Linear",
            InterpolationMethod::LogLinear => "LogLinear",
            InterpolationMethod::NaturalCubic => "NaturalCubic",
            InterpolationMethod::FinancialCubic => "FinancialCubic",
            InterpolationMethod::ConvexMonotone => "ConvexMonotone",
            InterpolationMethod::ExponentialSplines => "ExponentialSplines",
            InterpolationMethod::Quadratic => "Quadratic",
            InterpolationMethod::LogQuadratic => "LogQuadratic",
            InterpolationMethod::Hermite => "Hermite",
            InterpolationMethod::CubicSpline => "CubicSpline",
            InterpolationMethod::NelsonSiegel => "NelsonSiegel",
            InterpolationMethod::Svensson => "Svensson",
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterpolationMethod {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [InterpolationMethod; 12] = [
            InterpolationMethod::Linear,
            InterpolationMethod::LogLinear,
            InterpolationMethod::NaturalCubic,
            InterpolationMethod::FinancialCubic,
            InterpolationMethod::ConvexMonotone,
            InterpolationMethod::ExponentialSplines,
            InterpolationMethod::Quadratic,
            InterpolationMethod::LogQuadratic,
            InterpolationMethod::Hermite,
            InterpolationMethod::CubicSpline,
            InterpolationMethod::NelsonSiegel,
            InterpolationMethod::Svensson,
        ];
        ALL.into_iter().find(|m| m.name() == s).ok_or_else(|| {
            CurveError::configuration(format!("Yield curve interpolation method {s} not recognized"))
        })
    }
}

impl TryFrom<String> for InterpolationMethod {
    type Error = CurveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InterpolationMethod> for String {
    fn from(value: InterpolationMethod) -> Self {
        value.to_string()
    }
}

fn default_accuracy() -> f64 {
    1.0e-12
}

fn default_max_attempts() -> usize {
    5
}

fn default_factor() -> f64 {
    2.0
}

fn default_dont_throw_steps() -> usize {
    10
}

/// Bootstrap and fit tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Per-pillar solver accuracy; also the fit cost threshold.
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Accuracy of the outer loop for global interpolation, and the fit
    /// tolerance when set.
    #[serde(default)]
    pub global_accuracy: Option<f64>,
    /// Accept a best-effort result instead of failing.
    #[serde(default)]
    pub dont_throw: bool,
    /// Bracket widenings per pillar; multi-start trials for fits.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Growth factor of the upper bracket between attempts.
    #[serde(default = "default_factor")]
    pub max_factor: f64,
    /// Growth factor of the lower bracket between attempts.
    #[serde(default = "default_factor")]
    pub min_factor: f64,
    /// Grid points scanned when a pillar fails under `dont_throw`.
    #[serde(default = "default_dont_throw_steps")]
    pub dont_throw_steps: usize,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy(),
            global_accuracy: None,
            dont_throw: false,
            max_attempts: default_max_attempts(),
            max_factor: default_factor(),
            min_factor: default_factor(),
            dont_throw_steps: default_dont_throw_steps(),
        }
    }
}

impl BootstrapConfig {
    /// Checks the tolerances are usable.
    pub fn validate(&self) -> CurveResult<()> {
        if !(self.accuracy > 0.0) {
            return Err(CurveError::configuration(format!(
                "accuracy ({}) must be positive",
                self.accuracy
            )));
        }
        if let Some(g) = self.global_accuracy {
            if !(g > 0.0) {
                return Err(CurveError::configuration(format!(
                    "global accuracy ({g}) must be positive"
                )));
            }
        }
        if self.max_attempts == 0 {
            return Err(CurveError::configuration("max attempts must be at least 1"));
        }
        if self.max_factor < 1.0 || self.min_factor < 1.0 {
            return Err(CurveError::configuration(format!(
                "min factor ({}) and max factor ({}) must not be below 1",
                self.min_factor, self.max_factor
            )));
        }
        if self.dont_throw && self.dont_throw_steps == 0 {
            return Err(CurveError::configuration("dont throw steps must be at least 1"));
        }
        Ok(())
    }
}

/// Quotes plus a convention, with an optional projection curve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleSegment {
    /// Market datum keys.
    pub quotes: Vec<String>,
    /// Convention ID.
    pub conventions: String,
    /// Projection curve ID; the curve being built when unset.
    #[serde(default)]
    pub projection_curve: Option<String>,
}

/// Quotes over a reference curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroSpreadSegment {
    /// `ZERO/YIELD_SPREAD` keys.
    pub quotes: Vec<String>,
    /// Zero convention ID.
    pub conventions: String,
    /// Reference curve ID.
    pub reference_curve: String,
}

/// Basis swaps against up to two projection curves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TenorBasisSegment {
    /// Market datum keys.
    pub quotes: Vec<String>,
    /// Convention ID.
    pub conventions: String,
    /// Curve projecting the long leg index.
    #[serde(default)]
    pub long_projection_curve: Option<String>,
    /// Curve projecting the short leg index.
    #[serde(default)]
    pub short_projection_curve: Option<String>,
}

/// BMA ratio swaps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BmaBasisSegment {
    /// Market datum keys.
    pub quotes: Vec<String>,
    /// Convention ID.
    pub conventions: String,
    /// Curve projecting the Libor leg; also used to discount both legs.
    #[serde(default)]
    pub libor_projection_curve: Option<String>,
}

/// FX forwards against a known curve in the other currency.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FxForwardSegment {
    /// Market datum keys.
    pub quotes: Vec<String>,
    /// FX convention ID.
    pub conventions: String,
    /// FX spot ID.
    pub spot_rate: String,
    /// Discount curve of the other currency; the market fallback when unset.
    #[serde(default)]
    pub foreign_discount_curve: Option<String>,
}

/// Cross currency swaps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrossCcySegment {
    /// Market datum keys.
    pub quotes: Vec<String>,
    /// Convention ID.
    pub conventions: String,
    /// FX spot ID.
    pub spot_rate: String,
    /// Discount curve of the other currency; the market fallback when unset.
    #[serde(default)]
    pub foreign_discount_curve: Option<String>,
    /// Curve projecting the index of the curve currency.
    #[serde(default)]
    pub domestic_projection_curve: Option<String>,
    /// Curve projecting the index of the other currency.
    #[serde(default)]
    pub foreign_projection_curve: Option<String>,
}

/// `base * numerator / denominator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRatioSegment {
    /// Base curve ID.
    pub base_curve: String,
    /// Base curve currency; the curve currency when unset.
    #[serde(default)]
    pub base_currency: Option<Currency>,
    /// Numerator curve ID.
    pub numerator_curve: String,
    /// Numerator curve currency.
    #[serde(default)]
    pub numerator_currency: Option<Currency>,
    /// Denominator curve ID.
    pub denominator_curve: String,
    /// Denominator curve currency.
    #[serde(default)]
    pub denominator_currency: Option<Currency>,
}

/// Bond prices fitted with a parametric family.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FittedBondSegment {
    /// `BOND/PRICE/SECID` keys.
    pub quotes: Vec<String>,
    /// Ibor index name to curve ID, for floating reference bonds.
    #[serde(default)]
    pub ibor_index_curves: BTreeMap<String, String>,
    /// Hold the curve flat outside the first and last bond maturity.
    #[serde(default)]
    pub extrapolate_flat: bool,
}

/// `P1^w1 * P2^w2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedAverageSegment {
    /// First reference curve ID.
    pub reference_curve1: String,
    /// Second reference curve ID.
    pub reference_curve2: String,
    /// Weight of the first curve.
    pub weight1: f64,
    /// Weight of the second curve.
    pub weight2: f64,
}

/// A yield curve plus weighted credit spreads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPlusDefaultSegment {
    /// Reference yield curve ID.
    pub reference_curve: String,
    /// Default curve names.
    pub default_curves: Vec<String>,
    /// One weight per default curve.
    pub weights: Vec<f64>,
}

/// Replacement curve for a discontinued Ibor index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IborFallbackSegment {
    /// Ibor index being replaced.
    pub ibor_index: String,
    /// Curve of the risk-free overnight index.
    pub rfr_curve: String,
    /// Overnight index; taken from the fallback catalogue when unset.
    #[serde(default)]
    pub rfr_index: Option<String>,
    /// Fallback spread; taken from the fallback catalogue when unset.
    #[serde(default)]
    pub spread: Option<f64>,
}

/// One building block of a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CurveSegment {
    /// Discount factors.
    Discount(SimpleSegment),
    /// Zero rates.
    Zero(SimpleSegment),
    /// Zero spreads over a reference curve.
    ZeroSpread(ZeroSpreadSegment),
    /// Deposits.
    Deposit(SimpleSegment),
    /// FRAs and IMM FRAs.
    Fra(SimpleSegment),
    /// Money market and overnight index futures.
    Future(SimpleSegment),
    /// Overnight index swaps.
    Ois(SimpleSegment),
    /// Fixed versus Ibor swaps.
    Swap(SimpleSegment),
    /// Average OIS, swap and basis quotes in pairs.
    AverageOis(SimpleSegment),
    /// Tenor basis swaps.
    TenorBasis(TenorBasisSegment),
    /// Tenor basis as two swaps.
    TenorBasisTwo(TenorBasisSegment),
    /// BMA ratio swaps.
    BmaBasis(BmaBasisSegment),
    /// FX forwards.
    FxForward(FxForwardSegment),
    /// Cross currency basis swaps.
    CrossCcyBasis(CrossCcySegment),
    /// Cross currency fixed versus float swaps.
    CrossCcyFixFloat(CrossCcySegment),
    /// Ratio of three curves.
    DiscountRatio(DiscountRatioSegment),
    /// Fitted bond curve.
    FittedBond(FittedBondSegment),
    /// Weighted average of two curves.
    WeightedAverage(WeightedAverageSegment),
    /// Yield curve plus default spreads.
    YieldPlusDefault(YieldPlusDefaultSegment),
    /// Ibor fallback curve.
    IborFallback(IborFallbackSegment),
}

impl CurveSegment {
    /// Human readable segment type.
    pub fn type_name(&self) -> &'static str {
        match self {
            CurveSegment::Discount(_) => "Discount",
            CurveSegment::Zero(_) => "Zero",
            CurveSegment::ZeroSpread(_) => "Zero Spread",
            CurveSegment::Deposit(_) => "Deposit",
            CurveSegment::Fra(_) => "FRA",
            CurveSegment::Future(_) => "Future",
            CurveSegment::Ois(_) => "OIS",
            CurveSegment::Swap(_) => "Swap",
            CurveSegment::AverageOis(_) => "Average OIS",
            CurveSegment::TenorBasis(_) => "Tenor Basis Swap",
            CurveSegment::TenorBasisTwo(_) => "Tenor Basis Two Swaps",
            CurveSegment::BmaBasis(_) => "BMA Basis Swap",
            CurveSegment::FxForward(_) => "FX Forward",
            CurveSegment::CrossCcyBasis(_) => "Cross Currency Basis Swap",
            CurveSegment::CrossCcyFixFloat(_) => "Cross Currency Fix Float Swap",
            CurveSegment::DiscountRatio(_) => "Discount Ratio",
            CurveSegment::FittedBond(_) => "Fitted Bond",
            CurveSegment::WeightedAverage(_) => "Weighted Average",
            CurveSegment::YieldPlusDefault(_) => "Yield Plus Default",
            CurveSegment::IborFallback(_) => "Ibor Fallback",
        }
    }

    /// True for segment types that make up a whole curve on their own.
    pub fn is_exclusive(&self) -> bool {
        matches!(
            self,
            CurveSegment::Zero(_)
                | CurveSegment::ZeroSpread(_)
                | CurveSegment::DiscountRatio(_)
                | CurveSegment::FittedBond(_)
                | CurveSegment::WeightedAverage(_)
                | CurveSegment::YieldPlusDefault(_)
                | CurveSegment::IborFallback(_)
        )
    }

    /// Market datum keys of the segment.
    pub fn quotes(&self) -> &[String] {
        match self {
            CurveSegment::Discount(s)
            | CurveSegment::Zero(s)
            | CurveSegment::Deposit(s)
            | CurveSegment::Fra(s)
            | CurveSegment::Future(s)
            | CurveSegment::Ois(s)
            | CurveSegment::Swap(s)
            | CurveSegment::AverageOis(s) => &s.quotes,
            CurveSegment::ZeroSpread(s) => &s.quotes,
            CurveSegment::TenorBasis(s) | CurveSegment::TenorBasisTwo(s) => &s.quotes,
            CurveSegment::BmaBasis(s) => &s.quotes,
            CurveSegment::FxForward(s) => &s.quotes,
            CurveSegment::CrossCcyBasis(s) | CurveSegment::CrossCcyFixFloat(s) => &s.quotes,
            CurveSegment::FittedBond(s) => &s.quotes,
            CurveSegment::DiscountRatio(_)
            | CurveSegment::WeightedAverage(_)
            | CurveSegment::YieldPlusDefault(_)
            | CurveSegment::IborFallback(_) => &[],
        }
    }
}

fn default_day_counter() -> DayCountConvention {
    DayCountConvention::Act365Fixed
}

fn default_extrapolation() -> bool {
    true
}

/// Configuration of one yield curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldCurveConfig {
    /// Configuration ID.
    pub id: String,
    /// Curve currency.
    pub currency: Currency,
    /// Discount curve for the instruments; the curve itself when unset.
    #[serde(default)]
    pub discount_curve: Option<String>,
    /// Ordered segments.
    pub segments: Vec<CurveSegment>,
    /// Interpolated quantity.
    #[serde(default)]
    pub interpolation_variable: InterpolationVariable,
    /// Interpolation method, or fitting family for bond curves.
    #[serde(default)]
    pub interpolation_method: InterpolationMethod,
    /// Day counter of curve times.
    #[serde(default = "default_day_counter")]
    pub day_counter: DayCountConvention,
    /// Allow queries beyond the last pillar.
    #[serde(default = "default_extrapolation")]
    pub extrapolation: bool,
    /// Bootstrap tolerances.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl YieldCurveConfig {
    /// Creates a configuration with default interpolation and tolerances.
    pub fn new(id: impl Into<String>, currency: Currency, segments: Vec<CurveSegment>) -> Self {
        Self {
            id: id.into(),
            currency,
            discount_curve: None,
            segments,
            interpolation_variable: InterpolationVariable::default(),
            interpolation_method: InterpolationMethod::default(),
            day_counter: default_day_counter(),
            extrapolation: true,
            bootstrap: BootstrapConfig::default(),
        }
    }

    /// Sets the interpolation variable and method.
    #[must_use]
    pub fn with_interpolation(
        mut self,
        variable: InterpolationVariable,
        method: InterpolationMethod,
    ) -> Self {
        self.interpolation_variable = variable;
        self.interpolation_method = method;
        self
    }

    /// Sets the discount curve ID.
    #[must_use]
    pub fn with_discount_curve(mut self, id: impl Into<String>) -> Self {
        self.discount_curve = Some(id.into());
        self
    }

    /// Sets the bootstrap tolerances.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Sets the day counter.
    #[must_use]
    pub fn with_day_counter(mut self, day_counter: DayCountConvention) -> Self {
        self.day_counter = day_counter;
        self
    }

    /// Sets whether the curve extrapolates.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: bool) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Checks segment structure and tolerances.
    pub fn validate(&self) -> CurveResult<()> {
        let first = self.segments.first().ok_or_else(|| {
            CurveError::configuration(format!("Yield curve {} has no segments", self.id))
        })?;
        if first.is_exclusive() && self.segments.len() != 1 {
            return Err(CurveError::configuration(format!(
                "{} curve must contain exactly one segment.",
                first.type_name()
            )));
        }
        if let Some(s) = self.segments.iter().skip(1).find(|s| s.is_exclusive()) {
            return Err(CurveError::configuration(format!(
                "{} curve must contain exactly one segment.",
                s.type_name()
            )));
        }
        self.bootstrap.validate()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigurationFile {
    #[serde(default, rename = "yield_curve")]
    yield_curves: Vec<YieldCurveConfig>,
}

/// Yield curve configurations keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct CurveConfigurations {
    yield_curves: BTreeMap<String, YieldCurveConfig>,
}

impl CurveConfigurations {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a configuration, replacing one with the same ID.
    pub fn add(&mut self, config: YieldCurveConfig) {
        self.yield_curves.insert(config.id.clone(), config);
    }

    /// Builder-style [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, config: YieldCurveConfig) -> Self {
        self.add(config);
        self
    }

    /// Looks up a configuration.
    pub fn yield_curve_config(&self, id: &str) -> Option<&YieldCurveConfig> {
        self.yield_curves.get(id)
    }

    /// All configurations in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &YieldCurveConfig> {
        self.yield_curves.values()
    }

    /// Parses `[[yield_curve]]` tables.
    pub fn from_toml_str(text: &str) -> CurveResult<Self> {
        let file: ConfigurationFile = toml::from_str(text)
            .map_err(|e| CurveError::parse("curve configurations", e.to_string()))?;
        Ok(Self::from_contents(file))
    }

    /// Parses `{"yield_curve": [...]}`.
    pub fn from_json_str(text: &str) -> CurveResult<Self> {
        let file: ConfigurationFile = serde_json::from_str(text)
            .map_err(|e| CurveError::parse("curve configurations", e.to_string()))?;
        Ok(Self::from_contents(file))
    }

    /// Reads a `.json` or `.toml` file.
    pub fn from_file(path: impl AsRef<Path>) -> CurveResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CurveError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    fn from_contents(file: ConfigurationFile) -> Self {
        let mut configs = Self::new();
        for c in file.yield_curves {
            configs.add(c);
        }
        configs
    }
}
