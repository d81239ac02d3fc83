//! Forward rate agreement helper.

use pillar_core::calendars::{BusinessDayConvention, Calendar};
use pillar_core::daycounts::DayCount;
use pillar_core::imm::nth_imm_date;
use pillar_core::{Date, Period};

use super::legs::simple_forward;
use super::{CurveRef, RateHelper};
use crate::conventions::RateIndex;
use crate::error::{CurveError, CurveResult};
use crate::termstructures::YieldTermStructure;

/// A FRA on an Ibor index, starting either a period after spot or on an
/// IMM date.
#[derive(Debug, Clone)]
pub struct FraHelper {
    rate: f64,
    label: String,
    start: Date,
    end: Date,
    tau: f64,
    projection: CurveRef,
}

impl FraHelper {
    /// FRA starting `period_to_start` after the index spot date.
    pub fn new(rate: f64, as_of: Date, period_to_start: Period, index: &RateIndex) -> CurveResult<Self> {
        let calendar = index.calendar();
        let spot = index.value_date(calendar.adjust(as_of, BusinessDayConvention::Following));
        let start = calendar.advance(spot, period_to_start, index.convention(), index.end_of_month())?;
        let label = format!("FRA {}x{} {}", period_to_start, index.tenor(), index.name());
        Self::from_dates(rate, label, start, index.maturity_date(start)?, index)
    }

    /// FRA between the `imm1`-th and `imm2`-th IMM dates after spot.
    pub fn imm(rate: f64, as_of: Date, imm1: u32, imm2: u32, index: &RateIndex) -> CurveResult<Self> {
        if imm1 >= imm2 {
            return Err(CurveError::data(format!(
                "IMM FRA start {imm1} must be before end {imm2}"
            )));
        }
        let spot = index.value_date(index.calendar().adjust(as_of, BusinessDayConvention::Following));
        let start = nth_imm_date(spot, imm1, true)?;
        let end = nth_imm_date(spot, imm2, true)?;
        let label = format!("IMM FRA {imm1}x{imm2} {}", index.name());
        Self::from_dates(rate, label, start, end, index)
    }

    fn from_dates(rate: f64, label: String, start: Date, end: Date, index: &RateIndex) -> CurveResult<Self> {
        Ok(Self {
            rate,
            label,
            start,
            end,
            tau: index.day_counter().year_fraction_f64(start, end),
            projection: CurveRef::projection(index),
        })
    }

    /// Fixing period start.
    pub fn start_date(&self) -> Date {
        self.start
    }
}

impl RateHelper for FraHelper {
    fn pillar_date(&self) -> Date {
        self.end
    }

    fn quote(&self) -> f64 {
        self.rate
    }

    fn implied_quote(&self, curve: &dyn YieldTermStructure) -> CurveResult<f64> {
        simple_forward(self.projection.resolve(curve), self.start, self.end, self.tau)
    }

    fn description(&self) -> String {
        format!("{} {} to {}", self.label, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::{as_of, flat, flat_arc};
    use approx::assert_relative_eq;

    #[test]
    fn test_fra_dates() {
        let index = RateIndex::parse("EUR-EURIBOR-6M").unwrap();
        let h = FraHelper::new(0.03, as_of(), Period::months(3), &index).unwrap();
        assert_eq!(h.start_date(), Date::from_ymd(2024, 4, 17).unwrap());
        assert_eq!(h.pillar_date(), Date::from_ymd(2024, 10, 17).unwrap());
    }

    #[test]
    fn test_imm_fra_dates() {
        let index = RateIndex::parse("EUR-EURIBOR-3M").unwrap();
        let h = FraHelper::imm(0.03, as_of(), 1, 2, &index).unwrap();
        assert_eq!(h.start_date(), Date::from_ymd(2024, 3, 20).unwrap());
        assert_eq!(h.pillar_date(), Date::from_ymd(2024, 6, 19).unwrap());
        assert!(FraHelper::imm(0.03, as_of(), 2, 2, &index).is_err());
    }

    #[test]
    fn test_external_projection_ignores_building_curve() {
        let index = RateIndex::parse("EUR-EURIBOR-6M")
            .unwrap()
            .clone_with_curve(flat_arc(0.02));
        let h = FraHelper::new(0.03, as_of(), Period::months(1), &index).unwrap();
        let a = h.implied_quote(&flat(0.01)).unwrap();
        let b = h.implied_quote(&flat(0.05)).unwrap();
        assert_relative_eq!(a, b, epsilon = 1e-15);
        assert!((a - 0.02).abs() < 5e-4);
    }
}
