//! Domain types shared by every curve component.
//!
//! - [`Date`]: calendar date with period arithmetic
//! - [`Period`] / [`TimeUnit`]: tenors such as `6M` or `10Y`
//! - [`Frequency`] / [`Compounding`]: rate conventions
//! - [`Currency`]: ISO currency codes

mod currency;
mod date;
mod frequency;
mod period;

pub use currency::Currency;
pub use date::Date;
pub use frequency::{Compounding, Frequency};
pub use period::{Period, TimeUnit};
