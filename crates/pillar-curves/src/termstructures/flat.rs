//! Flat forward curve.

use pillar_core::daycounts::DayCountConvention;
use pillar_core::Date;

use super::YieldTermStructure;

/// Constant continuously compounded rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForward {
    reference_date: Date,
    rate: f64,
    day_counter: DayCountConvention,
}

impl FlatForward {
    /// Creates a flat curve at a continuously compounded `rate`.
    pub fn new(reference_date: Date, rate: f64, day_counter: DayCountConvention) -> Self {
        Self {
            reference_date,
            rate,
            day_counter,
        }
    }

    /// The continuously compounded rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl YieldTermStructure for FlatForward {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCountConvention {
        self.day_counter
    }

    fn max_time(&self) -> f64 {
        f64::MAX
    }

    fn allows_extrapolation(&self) -> bool {
        true
    }

    fn discount_impl(&self, t: f64) -> f64 {
        (-self.rate * t).exp()
    }
}
