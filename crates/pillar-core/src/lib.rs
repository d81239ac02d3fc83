//! # Pillar Core
//!
//! Foundational date and convention machinery for the Pillar curve engine.
//!
//! This crate provides the building blocks every curve helper relies on:
//!
//! - **Types**: `Date`, `Period`, `Frequency`, `Compounding`, `Currency`
//! - **Day Count Conventions**: year fractions for money-market and swap legs
//! - **Business Day Calendars**: rule-based holiday calendars and adjustment conventions
//! - **Schedules**: forward/backward date generation for swap legs and bonds
//! - **IMM Dates**: third-Wednesday arithmetic for futures and IMM FRAs
//!
//! ## Example
//!
//! ```rust
//! use pillar_core::prelude::*;
//!
//! let spot = Date::from_ymd(2024, 1, 17).unwrap();
//! let cal = CalendarId::Target;
//! let end = cal
//!     .advance(spot, "6M".parse().unwrap(), BusinessDayConvention::ModifiedFollowing, false)
//!     .unwrap();
//! assert_eq!(end, Date::from_ymd(2024, 7, 17).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![allow(clippy::match_same_arms)]

pub mod calendars;
pub mod daycounts;
pub mod error;
pub mod imm;
pub mod schedule;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{BusinessDayConvention, Calendar, CalendarId};
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::imm::{is_imm_date, next_imm_date};
    pub use crate::schedule::{DateGenerationRule, Schedule};
    pub use crate::types::{Compounding, Currency, Date, Frequency, Period, TimeUnit};
}

// Re-export commonly used types at crate root
pub use error::{CoreError, CoreResult};
pub use types::{Currency, Date, Period, TimeUnit};
