//! Money market and overnight index futures.

use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::imm::next_imm_date;
use pillar_core::{Date, Period, TimeUnit};

use super::legs::growth;
use super::RateHelper;
use crate::conventions::{FutureDateGeneration, RateIndex};
use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FutureKind {
    MoneyMarket,
    OvernightIndex,
}

/// A futures price `100 * (1 - rate)` over the contract's accrual period.
///
/// Money market futures accrue over one index period from the contract's
/// IMM date. Overnight index futures compound the index over the
/// reference period; any part of that period already fixed is projected
/// from the curve's reference date.
#[derive(Debug, Clone)]
pub struct FutureHelper {
    price: f64,
    kind: FutureKind,
    index_name: String,
    start: Date,
    end: Date,
    day_counter: DayCountConvention,
}

impl FutureHelper {
    /// Money market future for the contract month containing `expiry`.
    pub fn money_market(price: f64, expiry: Date, index: &RateIndex) -> CurveResult<Self> {
        let start = next_imm_date(expiry.start_of_month(), false)?;
        let end = index.maturity_date(start)?;
        Ok(Self {
            price,
            kind: FutureKind::MoneyMarket,
            index_name: index.name().to_string(),
            start,
            end,
            day_counter: index.day_counter(),
        })
    }

    /// Overnight index future with reference period `tenor` for the
    /// contract month containing `expiry`.
    pub fn overnight(
        price: f64,
        expiry: Date,
        tenor: Period,
        rule: FutureDateGeneration,
        index: &RateIndex,
    ) -> CurveResult<Self> {
        if !matches!(tenor.unit(), TimeUnit::Months | TimeUnit::Years) {
            return Err(CurveError::data(format!(
                "Future tenor {tenor} must be given in months or years"
            )));
        }
        let month_start = expiry.start_of_month();
        let (start, end) = match rule {
            FutureDateGeneration::Imm => {
                let ref_start = month_start.sub_period(tenor, false)?;
                (next_imm_date(ref_start, false)?, next_imm_date(month_start, false)?)
            }
            FutureDateGeneration::FirstDayOfMonth => {
                let end = month_start.add_months(1)?;
                (end.sub_period(tenor, false)?, end)
            }
        };
        Ok(Self {
            price,
            kind: FutureKind::OvernightIndex,
            index_name: index.name().to_string(),
            start,
            end,
            day_counter: index.day_counter(),
        })
    }

    /// Start of the reference period.
    pub fn start_date(&self) -> Date {
        self.start
    }

    /// End of the reference period.
    pub fn end_date(&self) -> Date {
        self.end
    }
}

impl RateHelper for FutureHelper {
    fn pillar_date(&self) -> Date {
        self.end
    }

    fn quote(&self) -> f64 {
        self.price
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        let start = match self.kind {
            FutureKind::MoneyMarket => self.start,
            FutureKind::OvernightIndex => self.start.max(curve.reference_date()),
        };
        let tau = self.day_counter.year_fraction_f64(start, self.end);
        if tau <= 0.0 {
            return Err(CurveError::data(format!(
                "future on {} has no accrual left after {start}",
                self.index_name
            )));
        }
        let rate = (growth(curve, start, self.end)? - 1.0) / tau;
        Ok(100.0 * (1.0 - rate))
    }

    fn description(&self) -> String {
        let kind = match self.kind {
            FutureKind::MoneyMarket => "MM future",
            FutureKind::OvernightIndex => "OI future",
        };
        format!("{kind} {} {} to {}", self.index_name, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::flat;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_money_market_dates_and_price() {
        let index = RateIndex::parse("EUR-EURIBOR-3M").unwrap();
        let h = FutureHelper::money_market(96.5, d(2024, 3, 15), &index).unwrap();
        assert_eq!(h.start_date(), d(2024, 3, 20));
        assert_eq!(h.end_date(), d(2024, 6, 20));

        let curve = flat(0.03);
        let tau = 92.0 / 360.0;
        let fwd = (growth(&curve, h.start_date(), h.end_date()).unwrap() - 1.0) / tau;
        assert_relative_eq!(h.implied_quote(&curve).unwrap(), 100.0 * (1.0 - fwd), epsilon = 1e-10);
    }

    #[test]
    fn test_overnight_first_day_of_month() {
        let index = RateIndex::parse("USD-SOFR").unwrap();
        let h = FutureHelper::overnight(
            94.7,
            d(2024, 2, 28),
            Period::months(1),
            FutureDateGeneration::FirstDayOfMonth,
            &index,
        )
        .unwrap();
        assert_eq!(h.start_date(), d(2024, 2, 1));
        assert_eq!(h.pillar_date(), d(2024, 3, 1));
    }

    #[test]
    fn test_overnight_imm_started_period() {
        let index = RateIndex::parse("USD-SOFR").unwrap();
        let h = FutureHelper::overnight(
            94.7,
            d(2024, 3, 1),
            Period::months(3),
            FutureDateGeneration::Imm,
            &index,
        )
        .unwrap();
        assert_eq!(h.start_date(), d(2023, 12, 20));
        assert_eq!(h.end_date(), d(2024, 3, 20));
        // Started before the reference date; priced from it.
        let price = h.implied_quote(&flat(0.05)).unwrap();
        assert!(price > 94.0 && price < 95.5);
    }

    #[test]
    fn test_overnight_tenor_in_days_rejected() {
        let index = RateIndex::parse("USD-SOFR").unwrap();
        let err = FutureHelper::overnight(
            94.7,
            d(2024, 3, 1),
            Period::days(30),
            FutureDateGeneration::Imm,
            &index,
        );
        assert!(err.is_err());
    }
}
