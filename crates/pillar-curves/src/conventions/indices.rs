//! Interest rate index catalogue.
//!
//! Index names follow the `CCY-FAMILY[-TENOR]` pattern: `EUR-EURIBOR-6M`,
//! `USD-SOFR`, `GBP-LIBOR-3M`. Overnight indices have no tenor suffix.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pillar_core::calendars::{BusinessDayConvention, Calendar, CalendarId};
use pillar_core::daycounts::DayCountConvention;
use pillar_core::{CoreResult, Currency, Date, Period};
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

/// Static description of an index family.
#[derive(Debug, Clone)]
struct FamilySpec {
    currency: Currency,
    overnight: bool,
    fixing_days: u32,
    calendar: CalendarId,
    convention: BusinessDayConvention,
    eom: bool,
    day_counter: DayCountConvention,
    fixed_tenor: Option<Period>,
}

fn family_spec(family: &str) -> Option<FamilySpec> {
    use BusinessDayConvention::{Following, ModifiedFollowing};
    use DayCountConvention::{Act360, Act365Fixed, ActActIsda};

    let overnight = |currency, calendar, day_counter| FamilySpec {
        currency,
        overnight: true,
        fixing_days: 0,
        calendar,
        convention: Following,
        eom: false,
        day_counter,
        fixed_tenor: None,
    };
    let term = |currency, fixing_days, calendar, day_counter| FamilySpec {
        currency,
        overnight: false,
        fixing_days,
        calendar,
        convention: ModifiedFollowing,
        eom: true,
        day_counter,
        fixed_tenor: None,
    };

    let spec = match family {
        "EUR-ESTER" | "EUR-ESTR" | "EUR-EONIA" => overnight(Currency::EUR, CalendarId::Target, Act360),
        "USD-SOFR" | "USD-FEDFUNDS" => overnight(Currency::USD, CalendarId::UnitedStates, Act360),
        "GBP-SONIA" => overnight(Currency::GBP, CalendarId::UnitedKingdom, Act365Fixed),
        "CHF-SARON" => overnight(Currency::CHF, CalendarId::WeekendsOnly, Act360),
        "JPY-TONAR" => overnight(Currency::JPY, CalendarId::WeekendsOnly, Act365Fixed),
        "BRL-CDI" => overnight(Currency::BRL, CalendarId::Brazil, Act365Fixed),
        "EUR-EURIBOR" => term(Currency::EUR, 2, CalendarId::Target, Act360),
        "USD-LIBOR" => term(
            Currency::USD,
            2,
            CalendarId::Joint(vec![CalendarId::UnitedKingdom, CalendarId::UnitedStates]),
            Act360,
        ),
        "GBP-LIBOR" => term(Currency::GBP, 0, CalendarId::UnitedKingdom, Act365Fixed),
        "CHF-LIBOR" => term(Currency::CHF, 2, CalendarId::WeekendsOnly, Act360),
        "JPY-TIBOR" => term(Currency::JPY, 2, CalendarId::WeekendsOnly, Act365Fixed),
        "USD-SIFMA" => FamilySpec {
            currency: Currency::USD,
            overnight: false,
            fixing_days: 1,
            calendar: CalendarId::UnitedStates,
            convention: Following,
            eom: false,
            day_counter: ActActIsda,
            fixed_tenor: Some(Period::weeks(1)),
        },
        _ => return None,
    };
    Some(spec)
}

/// A floating rate index, optionally bound to a forwarding curve.
///
/// An index without a forwarding curve projects off whatever curve the
/// caller is building.
#[derive(Clone)]
pub struct RateIndex {
    name: String,
    family: String,
    currency: Currency,
    tenor: Period,
    overnight: bool,
    fixing_days: u32,
    calendar: CalendarId,
    convention: BusinessDayConvention,
    eom: bool,
    day_counter: DayCountConvention,
    forwarding: Option<Arc<dyn YieldTermStructure>>,
}

impl fmt::Debug for RateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateIndex")
            .field("name", &self.name)
            .field("currency", &self.currency)
            .field("tenor", &self.tenor)
            .field("overnight", &self.overnight)
            .field("fixing_days", &self.fixing_days)
            .field("calendar", &self.calendar)
            .field("day_counter", &self.day_counter)
            .field("has_forwarding_curve", &self.forwarding.is_some())
            .finish()
    }
}

impl RateIndex {
    /// Resolves an index by name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pillar_curves::conventions::RateIndex;
    ///
    /// let euribor = RateIndex::parse("EUR-EURIBOR-6M").unwrap();
    /// assert!(!euribor.is_overnight());
    /// assert_eq!(euribor.fixing_days(), 2);
    /// assert!(RateIndex::parse("USD-SOFR").unwrap().is_overnight());
    /// ```
    pub fn parse(name: &str) -> CurveResult<Self> {
        let name = name.trim();
        let unknown = || CurveError::configuration(format!("Index name {name} not recognized"));

        if let Some(spec) = family_spec(name) {
            if spec.overnight {
                return Ok(Self::from_spec(name, name, Period::days(1), spec));
            }
            if let Some(tenor) = spec.fixed_tenor {
                return Ok(Self::from_spec(name, name, tenor, spec));
            }
            return Err(unknown());
        }

        let (family, tenor) = name.rsplit_once('-').ok_or_else(unknown)?;
        let spec = family_spec(family).ok_or_else(unknown)?;
        let tenor: Period = tenor.parse().map_err(|_| unknown())?;
        if spec.overnight || tenor.length() <= 0 {
            return Err(unknown());
        }
        let tenor = spec.fixed_tenor.unwrap_or(tenor);
        Ok(Self::from_spec(name, family, tenor, spec))
    }

    /// Resolves `family` combined with `tenor`, as a deposit quote does.
    ///
    /// Overnight families keep their own name.
    pub fn parse_with_tenor(family: &str, tenor: Period) -> CurveResult<Self> {
        let overnight = family_spec(family).is_some_and(|s| s.overnight);
        if overnight {
            Self::parse(family)
        } else {
            Self::parse(&format!("{family}-{}", tenor.short_name()))
        }
    }

    fn from_spec(name: &str, family: &str, tenor: Period, spec: FamilySpec) -> Self {
        Self {
            name: name.to_string(),
            family: family.to_string(),
            currency: spec.currency,
            tenor,
            overnight: spec.overnight,
            fixing_days: spec.fixing_days,
            calendar: spec.calendar,
            convention: spec.convention,
            eom: spec.eom,
            day_counter: spec.day_counter,
            forwarding: None,
        }
    }

    /// Returns a copy projecting off `curve`.
    #[must_use]
    pub fn clone_with_curve(&self, curve: Arc<dyn YieldTermStructure>) -> Self {
        let mut index = self.clone();
        index.forwarding = Some(curve);
        index
    }

    /// Full index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Family name without the tenor.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Index currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Index tenor, `1D` for overnight indices.
    pub fn tenor(&self) -> Period {
        self.tenor
    }

    /// True for overnight indices.
    pub fn is_overnight(&self) -> bool {
        self.overnight
    }

    /// True for the Brazilian CDI index.
    pub fn is_brl_cdi(&self) -> bool {
        self.family == "BRL-CDI"
    }

    /// Business days between fixing and value date.
    pub fn fixing_days(&self) -> u32 {
        self.fixing_days
    }

    /// Fixing and value calendar.
    pub fn calendar(&self) -> &CalendarId {
        &self.calendar
    }

    /// Roll convention for the maturity date.
    pub fn convention(&self) -> BusinessDayConvention {
        self.convention
    }

    /// End-of-month rule for the maturity date.
    pub fn end_of_month(&self) -> bool {
        self.eom
    }

    /// Accrual day counter.
    pub fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    /// Forwarding curve, if the index is bound to one.
    pub fn forwarding_curve(&self) -> Option<&Arc<dyn YieldTermStructure>> {
        self.forwarding.as_ref()
    }

    /// Value date for a fixing on `fixing_date`.
    pub fn value_date(&self, fixing_date: Date) -> Date {
        self.calendar
            .advance_business_days(fixing_date, self.fixing_days as i32)
    }

    /// End of the deposit period starting on `value_date`.
    pub fn maturity_date(&self, value_date: Date) -> CoreResult<Date> {
        self.calendar
            .advance(value_date, self.tenor, self.convention, self.eom)
    }
}

/// Replacement rule for a discontinued term index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackData {
    /// Overnight index that replaces the term index.
    pub rfr_index: String,
    /// Spread added to the compounded overnight rate.
    pub spread: f64,
    /// First date on which the fallback applies.
    pub switch_date: Date,
}

/// Catalogue of term index fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IborFallbackConfig {
    /// Fallback rules keyed by term index name.
    #[serde(default)]
    pub fallbacks: BTreeMap<String, FallbackData>,
}

impl Default for IborFallbackConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl IborFallbackConfig {
    /// An empty catalogue.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            fallbacks: BTreeMap::new(),
        }
    }

    /// ISDA fallback spreads for the USD and GBP Libor tenors.
    #[must_use]
    pub fn default_config() -> Self {
        let mut fallbacks = BTreeMap::new();
        let mut add = |name: &str, rfr: &str, spread: f64, y: i32, m: u32| {
            if let Ok(switch_date) = Date::from_ymd(y, m, 1) {
                fallbacks.insert(
                    name.to_string(),
                    FallbackData {
                        rfr_index: rfr.to_string(),
                        spread,
                        switch_date,
                    },
                );
            }
        };
        add("USD-LIBOR-1M", "USD-SOFR", 0.0011448, 2023, 7);
        add("USD-LIBOR-3M", "USD-SOFR", 0.0026161, 2023, 7);
        add("USD-LIBOR-6M", "USD-SOFR", 0.0042826, 2023, 7);
        add("USD-LIBOR-12M", "USD-SOFR", 0.0071513, 2023, 7);
        add("GBP-LIBOR-1M", "GBP-SONIA", 0.000326, 2022, 1);
        add("GBP-LIBOR-3M", "GBP-SONIA", 0.001193, 2022, 1);
        add("GBP-LIBOR-6M", "GBP-SONIA", 0.0027766, 2022, 1);
        Self { fallbacks }
    }

    /// True if the catalogue carries a rule for the index.
    pub fn is_index_replaced(&self, name: &str) -> bool {
        self.fallbacks.contains_key(name)
    }

    /// Fallback rule for the index.
    pub fn fallback_data(&self, name: &str) -> CurveResult<&FallbackData> {
        self.fallbacks.get(name).ok_or_else(|| {
            CurveError::configuration(format!("No fallback data found for index {name}"))
        })
    }
}
