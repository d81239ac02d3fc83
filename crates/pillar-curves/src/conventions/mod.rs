//! Instrument conventions.
//!
//! A curve segment names the convention its quotes follow. Each family
//! carries only the fields its helpers need; asking for a convention under
//! the wrong family is a configuration error.
//!
//! Conventions load from TOML or JSON:
//!
//! ```toml
//! [[convention]]
//! type = "Deposit"
//! id = "EUR-DEPOSIT"
//! index = "EUR-EURIBOR"
//!
//! [[convention]]
//! type = "Ois"
//! id = "EUR-ESTER-OIS"
//! index = "EUR-ESTER"
//! fixed_day_counter = "A360"
//! ```

mod indices;

pub use indices::{FallbackData, IborFallbackConfig, RateIndex};

use std::collections::BTreeMap;
use std::path::Path;

use pillar_core::calendars::{BusinessDayConvention, CalendarId};
use pillar_core::daycounts::DayCountConvention;
use pillar_core::schedule::DateGenerationRule;
use pillar_core::types::{Compounding, Currency, Frequency, Period};
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

fn modified_following() -> BusinessDayConvention {
    BusinessDayConvention::ModifiedFollowing
}

fn act360() -> DayCountConvention {
    DayCountConvention::Act360
}

fn two() -> u32 {
    2
}

fn yes() -> bool {
    true
}

/// Conventions for zero rate and discount factor quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroRateConvention {
    /// Convention ID.
    pub id: String,
    /// Day counter of the quoted rates.
    pub day_counter: DayCountConvention,
    /// Compounding of the quoted rates.
    #[serde(default)]
    pub compounding: Compounding,
    /// Compounding frequency, used with `Compounded`.
    #[serde(default)]
    pub compounding_frequency: Frequency,
    /// Calendar for tenor-based quotes.
    #[serde(default)]
    pub tenor_calendar: CalendarId,
    /// Business days from the as-of date to the tenor start.
    #[serde(default)]
    pub spot_lag: u32,
    /// Calendar for the spot lag.
    #[serde(default)]
    pub spot_calendar: CalendarId,
    /// Roll convention for tenor dates.
    #[serde(default)]
    pub roll_convention: BusinessDayConvention,
    /// End-of-month rule for tenor dates.
    #[serde(default)]
    pub eom: bool,
    /// Whether quotes may be given by tenor.
    #[serde(default)]
    pub tenor_based: bool,
}

/// Deposit conventions, either index based or explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositConvention {
    /// Convention ID.
    pub id: String,
    /// Index family such as `EUR-EURIBOR`; when set the remaining fields
    /// are taken from the index.
    #[serde(default)]
    pub index: Option<String>,
    /// Calendar.
    #[serde(default)]
    pub calendar: CalendarId,
    /// Roll convention.
    #[serde(default = "modified_following")]
    pub convention: BusinessDayConvention,
    /// End-of-month rule.
    #[serde(default)]
    pub eom: bool,
    /// Accrual day counter.
    #[serde(default = "act360")]
    pub day_counter: DayCountConvention,
}

impl DepositConvention {
    /// True when calendar and day counter come from an index.
    pub fn index_based(&self) -> bool {
        self.index.is_some()
    }
}

/// How the accrual period of a futures contract is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FutureDateGeneration {
    /// IMM dates around the contract month.
    #[default]
    Imm,
    /// First day of the contract month.
    FirstDayOfMonth,
}

/// Futures conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureConvention {
    /// Convention ID.
    pub id: String,
    /// Underlying index.
    pub index: String,
    /// Date generation rule.
    #[serde(default)]
    pub date_generation: FutureDateGeneration,
}

/// FRA conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraConvention {
    /// Convention ID.
    pub id: String,
    /// Underlying index.
    pub index: String,
}

/// Overnight index swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OisConvention {
    /// Convention ID.
    pub id: String,
    /// Overnight index.
    pub index: String,
    /// Business days from the as-of date to the effective date.
    #[serde(default = "two")]
    pub spot_lag: u32,
    /// Fixed leg day counter.
    pub fixed_day_counter: DayCountConvention,
    /// Payment lag in business days.
    #[serde(default)]
    pub payment_lag: u32,
    /// End-of-month rule.
    #[serde(default)]
    pub eom: bool,
    /// Fixed leg frequency.
    #[serde(default)]
    pub fixed_frequency: Frequency,
    /// Fixed leg roll convention.
    #[serde(default)]
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg payment convention.
    #[serde(default)]
    pub fixed_payment_convention: BusinessDayConvention,
    /// Schedule generation rule.
    #[serde(default)]
    pub rule: DateGenerationRule,
    /// Fixed leg calendar; the index calendar when unset.
    #[serde(default)]
    pub fixed_calendar: Option<CalendarId>,
}

/// How sub-period index fixings combine into one coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubPeriodsCouponType {
    /// Compounded.
    #[default]
    Compounding,
    /// Arithmetic average.
    Averaging,
}

/// Fixed versus Ibor swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrSwapConvention {
    /// Convention ID.
    pub id: String,
    /// Fixed leg calendar.
    pub fixed_calendar: CalendarId,
    /// Fixed leg frequency.
    pub fixed_frequency: Frequency,
    /// Fixed leg roll convention.
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg day counter.
    pub fixed_day_counter: DayCountConvention,
    /// Floating index.
    pub index: String,
    /// Floating payment frequency when it differs from the index tenor.
    #[serde(default)]
    pub float_frequency: Option<Frequency>,
    /// How sub-period fixings combine.
    #[serde(default)]
    pub sub_periods_coupon_type: SubPeriodsCouponType,
}

impl IrSwapConvention {
    /// True when the float leg pays less often than the index fixes.
    pub fn has_sub_period(&self) -> bool {
        self.float_frequency.is_some()
    }
}

/// Average overnight index swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageOisConvention {
    /// Convention ID.
    pub id: String,
    /// Business days from the as-of date to the effective date.
    #[serde(default = "two")]
    pub spot_lag: u32,
    /// Fixed leg tenor.
    pub fixed_tenor: Period,
    /// Fixed leg day counter.
    pub fixed_day_counter: DayCountConvention,
    /// Fixed leg calendar.
    pub fixed_calendar: CalendarId,
    /// Fixed leg roll convention.
    #[serde(default)]
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg payment convention.
    #[serde(default)]
    pub fixed_payment_convention: BusinessDayConvention,
    /// Overnight index.
    pub index: String,
    /// Float leg payment tenor.
    pub on_tenor: Period,
    /// Days before period end after which the rate is frozen.
    #[serde(default)]
    pub rate_cutoff: u32,
}

/// Single currency tenor basis swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorBasisSwapConvention {
    /// Convention ID.
    pub id: String,
    /// Index of the long tenor leg.
    pub long_index: String,
    /// Index of the short tenor leg.
    pub short_index: String,
    /// Payment tenor of the short leg; the short index tenor when unset.
    #[serde(default)]
    pub short_pay_tenor: Option<Period>,
    /// Whether the quoted spread sits on the short leg.
    #[serde(default = "yes")]
    pub spread_on_short: bool,
    /// Whether the spread is compounded with the sub-period fixings.
    #[serde(default)]
    pub include_spread: bool,
    /// How sub-period fixings combine.
    #[serde(default)]
    pub sub_periods_coupon_type: SubPeriodsCouponType,
}

/// Tenor basis quoted as the difference of two fixed versus float swaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorBasisTwoSwapConvention {
    /// Convention ID.
    pub id: String,
    /// Calendar of both swaps.
    pub calendar: CalendarId,
    /// Long swap fixed frequency.
    pub long_fixed_frequency: Frequency,
    /// Long swap fixed roll convention.
    pub long_fixed_convention: BusinessDayConvention,
    /// Long swap fixed day counter.
    pub long_fixed_day_counter: DayCountConvention,
    /// Long swap index.
    pub long_index: String,
    /// Short swap fixed frequency.
    pub short_fixed_frequency: Frequency,
    /// Short swap fixed roll convention.
    pub short_fixed_convention: BusinessDayConvention,
    /// Short swap fixed day counter.
    pub short_fixed_day_counter: DayCountConvention,
    /// Short swap index.
    pub short_index: String,
    /// Quote is long minus short when set.
    #[serde(default = "yes")]
    pub long_minus_short: bool,
}

/// BMA (SIFMA) versus Libor ratio swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmaBasisSwapConvention {
    /// Convention ID.
    pub id: String,
    /// Libor index.
    pub libor_index: String,
    /// BMA index.
    pub bma_index: String,
}

/// FX forward conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxConvention {
    /// Convention ID.
    pub id: String,
    /// Source (unit) currency.
    pub source_currency: Currency,
    /// Target (quote) currency.
    pub target_currency: Currency,
    /// Business days to spot.
    pub spot_days: u32,
    /// Divisor turning quoted points into a rate difference.
    pub points_factor: f64,
    /// Calendar used to roll spot and forward dates.
    #[serde(default)]
    pub advance_calendar: CalendarId,
    /// Roll convention.
    #[serde(default)]
    pub convention: BusinessDayConvention,
    /// End-of-month rule.
    #[serde(default)]
    pub end_of_month: bool,
}

/// Cross currency basis swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCcyBasisConvention {
    /// Convention ID.
    pub id: String,
    /// Business days to the effective date.
    pub settlement_days: u32,
    /// Settlement calendar.
    pub settlement_calendar: CalendarId,
    /// Roll convention.
    pub roll_convention: BusinessDayConvention,
    /// Index of the leg without spread.
    pub flat_index: String,
    /// Index of the leg paying the spread.
    pub spread_index: String,
    /// Payment tenor of the flat leg; the index tenor when unset.
    #[serde(default)]
    pub flat_tenor: Option<Period>,
    /// Payment tenor of the spread leg; the index tenor when unset.
    #[serde(default)]
    pub spread_tenor: Option<Period>,
    /// End-of-month rule.
    #[serde(default)]
    pub eom: bool,
    /// Whether the notional of one leg resets with FX.
    #[serde(default)]
    pub is_resettable: bool,
    /// Whether the resetting leg is the flat leg.
    #[serde(default = "yes")]
    pub flat_index_is_resettable: bool,
}

/// Cross currency fixed versus float swap conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCcyFixFloatConvention {
    /// Convention ID.
    pub id: String,
    /// Business days to the effective date.
    pub settlement_days: u32,
    /// Settlement calendar.
    pub settlement_calendar: CalendarId,
    /// Settlement roll convention.
    pub settlement_convention: BusinessDayConvention,
    /// Fixed leg currency.
    pub fixed_currency: Currency,
    /// Fixed leg frequency.
    pub fixed_frequency: Frequency,
    /// Fixed leg roll convention.
    pub fixed_convention: BusinessDayConvention,
    /// Fixed leg day counter.
    pub fixed_day_counter: DayCountConvention,
    /// Floating index.
    pub index: String,
    /// End-of-month rule.
    #[serde(default)]
    pub eom: bool,
    /// Whether the notional of one leg resets with FX.
    #[serde(default)]
    pub is_resettable: bool,
    /// Whether the resetting leg is the float leg.
    #[serde(default = "yes")]
    pub float_index_is_resettable: bool,
}

/// A named convention of one instrument family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Convention {
    /// Zero rate and discount quotes.
    Zero(ZeroRateConvention),
    /// Deposits.
    Deposit(DepositConvention),
    /// Futures.
    Future(FutureConvention),
    /// FRAs.
    Fra(FraConvention),
    /// Overnight index swaps.
    Ois(OisConvention),
    /// Fixed versus Ibor swaps.
    IrSwap(IrSwapConvention),
    /// Average OIS.
    AverageOis(AverageOisConvention),
    /// Tenor basis swaps.
    TenorBasisSwap(TenorBasisSwapConvention),
    /// Tenor basis as two swaps.
    TenorBasisTwoSwap(TenorBasisTwoSwapConvention),
    /// BMA ratio swaps.
    BmaBasisSwap(BmaBasisSwapConvention),
    /// FX forwards.
    Fx(FxConvention),
    /// Cross currency basis swaps.
    CrossCcyBasis(CrossCcyBasisConvention),
    /// Cross currency fixed versus float swaps.
    CrossCcyFixFloat(CrossCcyFixFloatConvention),
}

impl Convention {
    /// Convention ID.
    pub fn id(&self) -> &str {
        match self {
            Convention::Zero(c) => &c.id,
            Convention::Deposit(c) => &c.id,
            Convention::Future(c) => &c.id,
            Convention::Fra(c) => &c.id,
            Convention::Ois(c) => &c.id,
            Convention::IrSwap(c) => &c.id,
            Convention::AverageOis(c) => &c.id,
            Convention::TenorBasisSwap(c) => &c.id,
            Convention::TenorBasisTwoSwap(c) => &c.id,
            Convention::BmaBasisSwap(c) => &c.id,
            Convention::Fx(c) => &c.id,
            Convention::CrossCcyBasis(c) => &c.id,
            Convention::CrossCcyFixFloat(c) => &c.id,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConventionFile {
    #[serde(default, rename = "convention")]
    conventions: Vec<Convention>,
}

/// Conventions keyed by ID.
///
/// # Example
///
/// ```rust
/// use pillar_curves::conventions::ConventionRegistry;
///
/// let registry = ConventionRegistry::from_toml_str(r#"
///     [[convention]]
///     type = "Fra"
///     id = "EUR-FRA"
///     index = "EUR-EURIBOR-6M"
/// "#).unwrap();
/// assert_eq!(registry.fra("EUR-FRA").unwrap().index, "EUR-EURIBOR-6M");
/// assert!(registry.deposit("EUR-FRA").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConventionRegistry {
    conventions: BTreeMap<String, Convention>,
}

impl ConventionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a convention, replacing one with the same ID.
    pub fn add(&mut self, convention: Convention) {
        self.conventions
            .insert(convention.id().to_string(), convention);
    }

    /// Builder-style [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, convention: Convention) -> Self {
        self.add(convention);
        self
    }

    /// Parses a TOML document of `[[convention]]` tables.
    pub fn from_toml_str(text: &str) -> CurveResult<Self> {
        let file: ConventionFile =
            toml::from_str(text).map_err(|e| CurveError::parse("conventions", e.to_string()))?;
        Ok(Self::from_file_contents(file))
    }

    /// Parses a JSON document `{"convention": [...]}`.
    pub fn from_json_str(text: &str) -> CurveResult<Self> {
        let file: ConventionFile = serde_json::from_str(text)
            .map_err(|e| CurveError::parse("conventions", e.to_string()))?;
        Ok(Self::from_file_contents(file))
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

    fn from_file_contents(file: ConventionFile) -> Self {
        let mut registry = Self::new();
        for c in file.conventions {
            registry.add(c);
        }
        registry
    }

    /// Looks up a convention of any family.
    pub fn get(&self, id: &str) -> Option<&Convention> {
        self.conventions.get(id)
    }

    /// Number of conventions.
    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }

    fn typed<'a, T>(
        &'a self,
        id: &str,
        family: &'static str,
        pick: impl FnOnce(&'a Convention) -> Option<&'a T>,
    ) -> CurveResult<&'a T> {
        let convention = self
            .get(id)
            .ok_or_else(|| CurveError::missing_convention(id))?;
        pick(convention).ok_or_else(|| CurveError::ConventionTypeMismatch {
            id: id.to_string(),
            family,
        })
    }

    /// Zero rate conventions.
    pub fn zero(&self, id: &str) -> CurveResult<&ZeroRateConvention> {
        self.typed(id, "zero rate", |c| match c {
            Convention::Zero(z) => Some(z),
            _ => None,
        })
    }

    /// Deposit conventions.
    pub fn deposit(&self, id: &str) -> CurveResult<&DepositConvention> {
        self.typed(id, "deposit rate", |c| match c {
            Convention::Deposit(d) => Some(d),
            _ => None,
        })
    }

    /// Futures conventions.
    pub fn future(&self, id: &str) -> CurveResult<&FutureConvention> {
        self.typed(id, "future", |c| match c {
            Convention::Future(f) => Some(f),
            _ => None,
        })
    }

    /// FRA conventions.
    pub fn fra(&self, id: &str) -> CurveResult<&FraConvention> {
        self.typed(id, "FRA", |c| match c {
            Convention::Fra(f) => Some(f),
            _ => None,
        })
    }

    /// OIS conventions.
    pub fn ois(&self, id: &str) -> CurveResult<&OisConvention> {
        self.typed(id, "OIS", |c| match c {
            Convention::Ois(o) => Some(o),
            _ => None,
        })
    }

    /// Swap conventions.
    pub fn ir_swap(&self, id: &str) -> CurveResult<&IrSwapConvention> {
        self.typed(id, "swap", |c| match c {
            Convention::IrSwap(s) => Some(s),
            _ => None,
        })
    }

    /// Average OIS conventions.
    pub fn average_ois(&self, id: &str) -> CurveResult<&AverageOisConvention> {
        self.typed(id, "average OIS", |c| match c {
            Convention::AverageOis(a) => Some(a),
            _ => None,
        })
    }

    /// Tenor basis swap conventions.
    pub fn tenor_basis(&self, id: &str) -> CurveResult<&TenorBasisSwapConvention> {
        self.typed(id, "tenor basis swap", |c| match c {
            Convention::TenorBasisSwap(t) => Some(t),
            _ => None,
        })
    }

    /// Tenor basis two swap conventions.
    pub fn tenor_basis_two(&self, id: &str) -> CurveResult<&TenorBasisTwoSwapConvention> {
        self.typed(id, "tenor basis two swap", |c| match c {
            Convention::TenorBasisTwoSwap(t) => Some(t),
            _ => None,
        })
    }

    /// BMA basis swap conventions.
    pub fn bma_basis(&self, id: &str) -> CurveResult<&BmaBasisSwapConvention> {
        self.typed(id, "BMA basis swap", |c| match c {
            Convention::BmaBasisSwap(b) => Some(b),
            _ => None,
        })
    }

    /// FX conventions.
    pub fn fx(&self, id: &str) -> CurveResult<&FxConvention> {
        self.typed(id, "FX forward", |c| match c {
            Convention::Fx(f) => Some(f),
            _ => None,
        })
    }

    /// Cross currency basis swap conventions.
    pub fn cross_ccy_basis(&self, id: &str) -> CurveResult<&CrossCcyBasisConvention> {
        self.typed(id, "cross currency basis swap", |c| match c {
            Convention::CrossCcyBasis(x) => Some(x),
            _ => None,
        })
    }

    /// Cross currency fixed versus float swap conventions.
    pub fn cross_ccy_fix_float(&self, id: &str) -> CurveResult<&CrossCcyFixFloatConvention> {
        self.typed(id, "cross currency fix float swap", |c| match c {
            Convention::CrossCcyFixFloat(x) => Some(x),
            _ => None,
        })
    }
}
