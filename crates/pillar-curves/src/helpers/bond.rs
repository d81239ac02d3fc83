//! Fixed rate bonds for fitted bond curves.

use std::collections::BTreeMap;
use std::path::Path;

use pillar_core::calendars::{BusinessDayConvention, Calendar, CalendarId};
use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::schedule::{Schedule, ScheduleConfig};
use pillar_core::types::Frequency;
use pillar_core::Date;
use pillar_math::solvers::{brent, SolverConfig};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::legs::frequency_tenor;
use super::RateHelper;
use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

fn hundred() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn two() -> u32 {
    2
}

/// Static data of a fixed rate bullet bond.
///
/// Amounts are per 100 face value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedRateBond {
    /// Security identifier, as used in `BOND/PRICE/{id}` quotes.
    pub security_id: String,
    /// Accrual start of the first coupon.
    pub issue_date: Date,
    /// Final redemption date.
    pub maturity_date: Date,
    /// Annual coupon rate, e.g. `0.035`.
    pub coupon: Decimal,
    /// Coupon frequency.
    pub frequency: Frequency,
    /// Accrual day counter.
    pub day_counter: DayCountConvention,
    /// Payment calendar.
    #[serde(default)]
    pub calendar: CalendarId,
    /// Payment roll convention.
    #[serde(default)]
    pub convention: BusinessDayConvention,
    /// Business days from trade to settlement.
    #[serde(default = "two")]
    pub settlement_days: u32,
    /// Redemption amount.
    #[serde(default = "hundred")]
    pub redemption: Decimal,
}

/// A dated cash flow per 100 face.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Flow {
    accrual_start: Date,
    accrual_end: Date,
    payment: Date,
    amount: f64,
}

impl FixedRateBond {
    /// Settlement date for a trade on `as_of`.
    pub fn settlement_date(&self, as_of: Date) -> Date {
        let today = self.calendar.adjust(as_of, BusinessDayConvention::Following);
        self.calendar
            .advance_business_days(today, self.settlement_days as i32)
    }

    /// True if the bond can still settle on `settlement`.
    pub fn is_tradable(&self, settlement: Date) -> bool {
        settlement < self.maturity_date && settlement >= self.issue_date
    }

    fn coupon_f64(&self) -> f64 {
        self.coupon.to_f64().unwrap_or(0.0)
    }

    fn flows(&self) -> CurveResult<Vec<Flow>> {
        let tenor = match self.frequency {
            Frequency::Once => None,
            f => Some(frequency_tenor(f)?),
        };
        let coupon = self.coupon_f64() * 100.0;
        let mut flows = Vec::new();
        let periods: Vec<(Date, Date)> = match tenor {
            Some(tenor) => {
                let config = ScheduleConfig::new(self.issue_date, self.maturity_date, tenor)
                    .with_calendar(self.calendar.clone())
                    .with_convention(BusinessDayConvention::Unadjusted)
                    .with_termination_convention(BusinessDayConvention::Unadjusted);
                Schedule::generate(&config)?.periods().collect()
            }
            None => vec![(self.issue_date, self.maturity_date)],
        };
        for (start, end) in periods {
            flows.push(Flow {
                accrual_start: start,
                accrual_end: end,
                payment: self.calendar.adjust(end, self.convention),
                amount: coupon * self.day_counter.year_fraction_f64(start, end),
            });
        }
        let redemption = self.redemption.to_f64().unwrap_or(100.0);
        if let Some(last) = flows.last_mut() {
            last.amount += redemption;
        }
        Ok(flows)
    }

    /// Accrued interest at `settlement`, per 100 face.
    pub fn accrued_interest(&self, settlement: Date) -> CurveResult<f64> {
        let coupon = self.coupon_f64() * 100.0;
        Ok(self
            .flows()?
            .iter()
            .find(|f| f.accrual_start <= settlement && settlement < f.accrual_end)
            .map_or(0.0, |f| coupon * self.day_counter.year_fraction_f64(f.accrual_start, settlement)))
    }

    /// Payments strictly after `settlement` as `(date, amount)`.
    pub fn cash_flows(&self, settlement: Date) -> CurveResult<Vec<(Date, f64)>> {
        Ok(self
            .flows()?
            .into_iter()
            .filter(|f| f.payment > settlement)
            .map(|f| (f.payment, f.amount))
            .collect())
    }

    /// Clean price off `curve`, discounting to `settlement`.
    pub fn clean_price(&self, curve: &dyn YieldTermStructure, settlement: Date) -> CurveResult<f64> {
        let settle_df = curve.discount_date(settlement)?;
        let mut dirty = 0.0;
        for (date, amount) in self.cash_flows(settlement)? {
            dirty += amount * curve.discount_date(date)?;
        }
        Ok(dirty / settle_df - self.accrued_interest(settlement)?)
    }

    /// Dirty price at a continuously compounded Act/Act ISDA yield.
    pub fn dirty_price_from_yield(&self, yield_rate: f64, settlement: Date) -> CurveResult<f64> {
        Ok(self
            .cash_flows(settlement)?
            .iter()
            .map(|(date, amount)| {
                let t = DayCountConvention::ActActIsda.year_fraction_f64(settlement, *date);
                amount * (-yield_rate * t).exp()
            })
            .sum())
    }

    /// Continuously compounded Act/Act ISDA yield matching a clean price.
    pub fn market_yield(&self, clean_price: f64, settlement: Date) -> CurveResult<f64> {
        let dirty = clean_price + self.accrued_interest(settlement)?;
        let flows = self.cash_flows(settlement)?;
        let times: Vec<(f64, f64)> = flows
            .iter()
            .map(|(d, a)| (DayCountConvention::ActActIsda.year_fraction_f64(settlement, *d), *a))
            .collect();
        let price = |y: f64| times.iter().map(|(t, a)| a * (-y * t).exp()).sum::<f64>() - dirty;
        let solved = brent(price, -0.5, 1.0, &SolverConfig::new(1.0e-12, 200)).map_err(|e| {
            CurveError::data(format!(
                "cannot solve yield of bond {} at clean price {clean_price}: {e}",
                self.security_id
            ))
        })?;
        Ok(solved.root)
    }

    /// Macaulay duration in years at a continuously compounded yield.
    pub fn duration(&self, yield_rate: f64, settlement: Date) -> CurveResult<f64> {
        let mut pv = 0.0;
        let mut weighted = 0.0;
        for (date, amount) in self.cash_flows(settlement)? {
            let t = DayCountConvention::ActActIsda.year_fraction_f64(settlement, date);
            let v = amount * (-yield_rate * t).exp();
            pv += v;
            weighted += t * v;
        }
        if pv <= 0.0 {
            return Err(CurveError::data(format!(
                "bond {} has no cash flows after {settlement}",
                self.security_id
            )));
        }
        Ok(weighted / pv)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReferenceDataFile {
    #[serde(default)]
    bond: Vec<FixedRateBond>,
}

/// Bond static data keyed by security ID.
#[derive(Debug, Clone, Default)]
pub struct BondReferenceData {
    bonds: BTreeMap<String, FixedRateBond>,
}

impl BondReferenceData {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a bond.
    pub fn add(&mut self, bond: FixedRateBond) {
        self.bonds.insert(bond.security_id.clone(), bond);
    }

    /// Builder-style [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, bond: FixedRateBond) -> Self {
        self.add(bond);
        self
    }

    /// Looks up a bond.
    pub fn get(&self, security_id: &str) -> Option<&FixedRateBond> {
        self.bonds.get(security_id)
    }

    /// Number of bonds.
    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Parses `[[bond]]` tables.
    pub fn from_toml_str(text: &str) -> CurveResult<Self> {
        let file: ReferenceDataFile =
            toml::from_str(text).map_err(|e| CurveError::parse("bond reference data", e.to_string()))?;
        Ok(Self::from_bonds(file.bond))
    }

    /// Parses `{"bond": [...]}`.
    pub fn from_json_str(text: &str) -> CurveResult<Self> {
        let file: ReferenceDataFile = serde_json::from_str(text)
            .map_err(|e| CurveError::parse("bond reference data", e.to_string()))?;
        Ok(Self::from_bonds(file.bond))
    }

    /// Reads a `.toml` or `.json` file.
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

    fn from_bonds(bonds: Vec<FixedRateBond>) -> Self {
        let mut data = Self::new();
        for b in bonds {
            data.add(b);
        }
        data
    }
}

/// A bond quoted at a clean price per 100 face.
#[derive(Debug, Clone)]
pub struct BondHelper {
    bond: FixedRateBond,
    clean_price: f64,
    settlement: Date,
}

impl BondHelper {
    /// Creates the helper for a trade on `as_of`.
    pub fn new(bond: FixedRateBond, clean_price: f64, as_of: Date) -> Self {
        let settlement = bond.settlement_date(as_of);
        Self {
            bond,
            clean_price,
            settlement,
        }
    }

    /// The bond.
    pub fn bond(&self) -> &FixedRateBond {
        &self.bond
    }

    /// Settlement date.
    pub fn settlement_date(&self) -> Date {
        self.settlement
    }

    /// Market yield at the quoted price.
    pub fn market_yield(&self) -> CurveResult<f64> {
        self.bond.market_yield(self.clean_price, self.settlement)
    }
}

impl RateHelper for BondHelper {
    fn pillar_date(&self) -> Date {
        self.bond.maturity_date
    }

    fn quote(&self) -> f64 {
        self.clean_price
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        self.bond.clean_price(curve, self.settlement)
    }

    fn description(&self) -> String {
        format!("Bond {} maturing {}", self.bond.security_id, self.bond.maturity_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::{as_of, flat};
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn bond(maturity: Date) -> FixedRateBond {
        FixedRateBond {
            security_id: "DE0001102580".into(),
            issue_date: Date::from_ymd(2022, 2, 15).unwrap(),
            maturity_date: maturity,
            coupon: dec!(0.03),
            frequency: Frequency::Annual,
            day_counter: DayCountConvention::ActActIsda,
            calendar: CalendarId::Target,
            convention: BusinessDayConvention::Following,
            settlement_days: 2,
            redemption: dec!(100),
        }
    }

    #[test]
    fn test_flows_and_accrued() {
        let b = bond(Date::from_ymd(2027, 2, 15).unwrap());
        let settle = b.settlement_date(as_of());
        assert_eq!(settle, Date::from_ymd(2024, 1, 17).unwrap());
        let flows = b.cash_flows(settle).unwrap();
        assert_eq!(flows.len(), 4);
        assert!(flows[3].1 > 100.0);
        let accrued = b.accrued_interest(settle).unwrap();
        assert!(accrued > 2.5 && accrued < 3.0, "{accrued}");
    }

    #[test]
    fn test_yield_round_trip() {
        let b = bond(Date::from_ymd(2030, 2, 15).unwrap());
        let settle = b.settlement_date(as_of());
        let dirty = b.dirty_price_from_yield(0.031, settle).unwrap();
        let clean = dirty - b.accrued_interest(settle).unwrap();
        assert_relative_eq!(b.market_yield(clean, settle).unwrap(), 0.031, epsilon = 1e-9);
        let d = b.duration(0.031, settle).unwrap();
        assert!(d > 5.0 && d < 6.1, "{d}");
    }

    #[test]
    fn test_helper_prices_off_curve() {
        let b = bond(Date::from_ymd(2029, 2, 15).unwrap());
        let h = BondHelper::new(b.clone(), 100.0, as_of());
        let curve = flat(0.03);
        let model = h.implied_quote(&curve).unwrap();
        let settle = h.settlement_date();
        let model_yield = b.market_yield(model, settle).unwrap();
        // Act/365 flat 3% against Act/Act yield.
        assert!((model_yield - 0.03).abs() < 2e-4, "{model_yield}");
    }

    #[test]
    fn test_reference_data_toml() {
        let data = BondReferenceData::from_toml_str(
            r#"
            [[bond]]
            security_id = "US912828Z781"
            issue_date = "2020-01-31"
            maturity_date = "2027-01-31"
            coupon = 0.015
            frequency = "Semiannual"
            day_counter = "ActActIsda"
            calendar = "UnitedStates"
            "#,
        )
        .unwrap();
        let b = data.get("US912828Z781").unwrap();
        assert_eq!(b.settlement_days, 2);
        assert_eq!(b.redemption, dec!(100));
        assert!(data.get("missing").is_none());
    }
}
