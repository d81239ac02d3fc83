//! Property tests for calendar, day count and IMM conventions.
//!
//! These check the invariants curve helpers rely on when they turn a quote
//! tenor into start and maturity dates.

use pillar_core::calendars::{BusinessDayConvention, Calendar, CalendarId};
use pillar_core::daycounts::{DayCount, DayCountConvention};
use pillar_core::imm::{is_imm_date, next_imm_date};
use pillar_core::schedule::{Schedule, ScheduleConfig};
use pillar_core::types::{Date, Period};
use proptest::prelude::*;

// =============================================================================
// GENERATORS
// =============================================================================

fn any_date() -> impl Strategy<Value = Date> {
    (0i64..20_000).prop_map(|offset| Date::from_ymd(1990, 1, 1).unwrap().add_days(offset))
}

fn any_calendar() -> impl Strategy<Value = CalendarId> {
    prop_oneof![
        Just(CalendarId::Target),
        Just(CalendarId::UnitedStates),
        Just(CalendarId::UnitedKingdom),
        Just(CalendarId::Brazil),
        Just(CalendarId::WeekendsOnly),
        Just(CalendarId::Joint(vec![
            CalendarId::Target,
            CalendarId::UnitedStates
        ])),
    ]
}

fn any_convention() -> impl Strategy<Value = BusinessDayConvention> {
    prop_oneof![
        Just(BusinessDayConvention::Following),
        Just(BusinessDayConvention::ModifiedFollowing),
        Just(BusinessDayConvention::Preceding),
        Just(BusinessDayConvention::ModifiedPreceding),
        Just(BusinessDayConvention::Nearest),
    ]
}

fn any_tenor() -> impl Strategy<Value = Period> {
    prop_oneof![
        (1i32..10).prop_map(Period::days),
        (1i32..5).prop_map(Period::weeks),
        (1i32..36).prop_map(Period::months),
        (1i32..30).prop_map(Period::years),
    ]
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn adjusted_dates_are_business_days(
        date in any_date(),
        cal in any_calendar(),
        bdc in any_convention(),
    ) {
        let adjusted = cal.adjust(date, bdc);
        prop_assert!(cal.is_business_day(adjusted));
        prop_assert!(adjusted.days_between(&date).abs() < 10);
    }

    #[test]
    fn modified_conventions_stay_in_month(date in any_date(), cal in any_calendar()) {
        let mf = cal.adjust(date, BusinessDayConvention::ModifiedFollowing);
        let mp = cal.adjust(date, BusinessDayConvention::ModifiedPreceding);
        prop_assert_eq!(mf.month(), date.month());
        prop_assert_eq!(mp.month(), date.month());
    }

    #[test]
    fn advance_moves_forward_to_business_day(
        date in any_date(),
        cal in any_calendar(),
        tenor in any_tenor(),
        eom in any::<bool>(),
    ) {
        let end = cal.advance(date, tenor, BusinessDayConvention::ModifiedFollowing, eom).unwrap();
        prop_assert!(end > date);
        prop_assert!(cal.is_business_day(end));
    }

    #[test]
    fn business_day_count_is_additive(
        a in any_date(),
        gap1 in 0i64..400,
        gap2 in 0i64..400,
        cal in any_calendar(),
    ) {
        let b = a.add_days(gap1);
        let c = b.add_days(gap2);
        prop_assert_eq!(
            cal.business_days_between(a, c),
            cal.business_days_between(a, b) + cal.business_days_between(b, c)
        );
    }

    #[test]
    fn year_fractions_are_antisymmetric(a in any_date(), b in any_date()) {
        for dc in DayCountConvention::all() {
            let fwd = dc.year_fraction_f64(a, b);
            let back = dc.year_fraction_f64(b, a);
            prop_assert!((fwd + back).abs() < 1e-12);
        }
    }

    #[test]
    fn next_imm_is_next(date in any_date(), main_cycle in any::<bool>()) {
        let next = next_imm_date(date, main_cycle).unwrap();
        prop_assert!(next > date);
        prop_assert!(is_imm_date(next, main_cycle));
        // nothing in between
        let mut probe = date.add_days(1);
        while probe < next {
            prop_assert!(!is_imm_date(probe, main_cycle));
            probe = probe.add_days(1);
        }
    }

    #[test]
    fn schedules_are_increasing_and_cover_range(
        start in any_date(),
        years in 1i32..15,
        tenor_months in prop_oneof![Just(1i32), Just(3), Just(6), Just(12)],
        cal in any_calendar(),
    ) {
        let end = cal.adjust(start.add_years(years).unwrap(), BusinessDayConvention::Following);
        let start = cal.adjust(start, BusinessDayConvention::Following);
        let config = ScheduleConfig::new(start, end, Period::months(tenor_months))
            .with_calendar(cal);
        let schedule = Schedule::generate(&config).unwrap();
        prop_assert!(schedule.dates().windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(schedule.start_date(), start);
    }
}

#[test]
fn spot_lag_over_target_easter() {
    let cal = CalendarId::Target;
    let trade = Date::from_ymd(2024, 3, 27).unwrap();
    let spot = cal
        .advance(trade, Period::days(2), BusinessDayConvention::Following, false)
        .unwrap();
    // Good Friday 29th and Easter Monday 1st April are closed
    assert_eq!(spot, Date::from_ymd(2024, 4, 2).unwrap());
}
