//! End-to-end curve builds through the public facade.

use std::io::Write;
use std::sync::Arc;

use approx::assert_relative_eq;
use pillar_core::calendars::{BusinessDayConvention, CalendarId};
use pillar_core::daycounts::DayCountConvention;
use pillar_core::types::{Compounding, Frequency};
use pillar_curves::prelude::*;
use pillar_curves::termstructures::FlatForward;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

const CONVENTIONS: &str = r#"
    [[convention]]
    type = "Zero"
    id = "EUR-ZERO"
    day_counter = "A365"
    tenor_calendar = "TARGET"
    tenor_based = true

    [[convention]]
    type = "Deposit"
    id = "EUR-DEP"
    index = "EUR-EURIBOR"

    [[convention]]
    type = "Ois"
    id = "EUR-OIS"
    index = "EUR-ESTER"
    fixed_day_counter = "A360"
    payment_lag = 1

    [[convention]]
    type = "AverageOis"
    id = "USD-AVG-OIS"
    fixed_tenor = "6M"
    fixed_day_counter = "A360"
    fixed_calendar = "US"
    index = "USD-FEDFUNDS"
    on_tenor = "3M"

    [[convention]]
    type = "CrossCcyBasis"
    id = "EUR-USD-XCCY"
    settlement_days = 2
    settlement_calendar = "TARGET,US"
    roll_convention = "MF"
    flat_index = "USD-LIBOR-3M"
    spread_index = "EUR-EURIBOR-3M"
"#;

const CURVES: &str = r#"
    [[yield_curve]]
    id = "EUR-DF"
    currency = "EUR"
    interpolation_variable = "Discount"
    interpolation_method = "Linear"

    [[yield_curve.segments]]
    type = "Discount"
    conventions = "EUR-ZERO"
    quotes = ["DISCOUNT/RATE/EUR/EUR-DF/2025-01-15"]

    [[yield_curve]]
    id = "EUR-ESTER"
    currency = "EUR"
    interpolation_variable = "Discount"
    interpolation_method = "LogLinear"

    [[yield_curve.segments]]
    type = "Deposit"
    conventions = "EUR-DEP"
    quotes = ["MM/RATE/EUR/2D/1M", "MM/RATE/EUR/2D/3M", "MM/RATE/EUR/2D/6M"]

    [[yield_curve.segments]]
    type = "Ois"
    conventions = "EUR-OIS"
    quotes = ["IR_SWAP/RATE/EUR/2D/1D/2Y", "IR_SWAP/RATE/EUR/2D/1D/5Y", "IR_SWAP/RATE/EUR/2D/1D/10Y"]

    [[yield_curve]]
    id = "EUR-BANK"
    currency = "EUR"

    [[yield_curve.segments]]
    type = "ZeroSpread"
    conventions = "EUR-ZERO"
    reference_curve = "EUR-ESTER"
    quotes = ["ZERO/YIELD_SPREAD/EUR/BANK/A365/5Y", "ZERO/YIELD_SPREAD/EUR/BANK/A365/10Y"]

    [[yield_curve]]
    id = "EUR-EMPTY"
    currency = "EUR"

    [[yield_curve.segments]]
    type = "Deposit"
    conventions = "EUR-DEP"
    quotes = ["MM/RATE/EUR/2D/9M"]

    [[yield_curve]]
    id = "USD-FF"
    currency = "USD"

    [[yield_curve.segments]]
    type = "AverageOis"
    conventions = "USD-AVG-OIS"
    quotes = [
        "IR_SWAP/RATE/USD/2D/3M/1Y", "BASIS_SWAP/BASIS_SPREAD/3M/1D/USD/1Y",
        "IR_SWAP/RATE/USD/2D/3M/2Y", "BASIS_SWAP/BASIS_SPREAD/3M/1D/USD/2Y",
        "IR_SWAP/RATE/USD/2D/3M/3Y", "BASIS_SWAP/BASIS_SPREAD/3M/1D/USD/5Y",
    ]

    [[yield_curve]]
    id = "USD-FF-ODD"
    currency = "USD"

    [[yield_curve.segments]]
    type = "AverageOis"
    conventions = "USD-AVG-OIS"
    quotes = ["IR_SWAP/RATE/USD/2D/3M/1Y", "BASIS_SWAP/BASIS_SPREAD/3M/1D/USD/1Y", "IR_SWAP/RATE/USD/2D/3M/2Y"]

    [[yield_curve]]
    id = "EUR-XCCY"
    currency = "EUR"

    [[yield_curve.segments]]
    type = "CrossCcyBasis"
    conventions = "EUR-USD-XCCY"
    spot_rate = "FX/RATE/EUR/USD"
    foreign_discount_curve = "USD-SOFR"
    quotes = ["CC_BASIS_SWAP/BASIS_SPREAD/USD/3M/EUR/3M/5Y"]

    [[yield_curve]]
    id = "EUR-BONDS"
    currency = "EUR"
    interpolation_variable = "Discount"
    interpolation_method = "NelsonSiegel"

    [yield_curve.bootstrap]
    accuracy = 1e-6

    [[yield_curve.segments]]
    type = "FittedBond"
    quotes = ["BOND/PRICE/DE2Y", "BOND/PRICE/DE4Y", "BOND/PRICE/DE6Y", "BOND/PRICE/DE9Y", "BOND/PRICE/DE12Y"]
"#;

const QUOTES: [(&str, f64); 22] = [
    ("DISCOUNT/RATE/EUR/EUR-DF/2025-01-15", 0.98),
    ("MM/RATE/EUR/2D/1M", 0.0385),
    ("MM/RATE/EUR/2D/3M", 0.0390),
    ("MM/RATE/EUR/2D/6M", 0.0388),
    ("IR_SWAP/RATE/EUR/2D/1D/2Y", 0.0330),
    ("IR_SWAP/RATE/EUR/2D/1D/5Y", 0.0280),
    ("IR_SWAP/RATE/EUR/2D/1D/10Y", 0.0275),
    ("ZERO/YIELD_SPREAD/EUR/BANK/A365/5Y", 0.0100),
    ("ZERO/YIELD_SPREAD/EUR/BANK/A365/10Y", 0.0120),
    ("IR_SWAP/RATE/USD/2D/3M/1Y", 0.0480),
    ("BASIS_SWAP/BASIS_SPREAD/3M/1D/USD/1Y", 0.0010),
    ("IR_SWAP/RATE/USD/2D/3M/2Y", 0.0450),
    ("BASIS_SWAP/BASIS_SPREAD/3M/1D/USD/2Y", 0.0011),
    ("IR_SWAP/RATE/USD/2D/3M/3Y", 0.0430),
    ("BASIS_SWAP/BASIS_SPREAD/3M/1D/USD/5Y", 0.0012),
    ("FX/RATE/EUR/USD", 1.10),
    ("CC_BASIS_SWAP/BASIS_SPREAD/USD/3M/EUR/3M/5Y", -0.0015),
    ("BOND/PRICE/DE2Y", 0.0),
    ("BOND/PRICE/DE4Y", 0.0),
    ("BOND/PRICE/DE6Y", 0.0),
    ("BOND/PRICE/DE9Y", 0.0),
    ("BOND/PRICE/DE12Y", 0.0),
];

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn as_of() -> Date {
    Date::from_ymd(2024, 1, 15).unwrap()
}

fn bond(years: i32, coupon: Decimal) -> FixedRateBond {
    FixedRateBond {
        security_id: format!("DE{years}Y"),
        issue_date: Date::from_ymd(2023, 3, 1).unwrap(),
        maturity_date: Date::from_ymd(2023 + years, 3, 1).unwrap(),
        coupon,
        frequency: Frequency::Annual,
        day_counter: DayCountConvention::ActActIsda,
        calendar: CalendarId::Target,
        convention: BusinessDayConvention::Following,
        settlement_days: 2,
        redemption: Decimal::ONE_HUNDRED,
    }
}

struct Market {
    loader: InMemoryLoader,
    configs: CurveConfigurations,
    conventions: ConventionRegistry,
    pool: DependencyPool,
    fx: FxTriangulationGraph,
    bonds: BondReferenceData,
}

impl Market {
    fn new() -> Self {
        init_logging();
        let bonds = BondReferenceData::new()
            .with(bond(2, dec!(0.02)))
            .with(bond(4, dec!(0.03)))
            .with(bond(6, dec!(0.03)))
            .with(bond(9, dec!(0.035)))
            .with(bond(12, dec!(0.04)));
        let flat = FlatForward::new(as_of(), 0.03, DayCountConvention::Act365Fixed);

        let mut loader = InMemoryLoader::new();
        for (key, value) in QUOTES {
            let value = match key.strip_prefix("BOND/PRICE/") {
                Some(id) => {
                    let b = bonds.get(id).unwrap();
                    b.clean_price(&flat, b.settlement_date(as_of())).unwrap() / 100.0
                }
                None => value,
            };
            loader = loader.with_quote(as_of(), key, value).unwrap();
        }
        let fx = FxTriangulationGraph::from_loader(&loader, as_of());
        Self {
            loader,
            configs: CurveConfigurations::from_toml_str(CURVES).unwrap(),
            conventions: ConventionRegistry::from_toml_str(CONVENTIONS).unwrap(),
            pool: DependencyPool::new(),
            fx,
            bonds,
        }
    }

    fn inputs(&self) -> BuildInputs<'_> {
        BuildInputs::new(&self.loader, &self.configs, &self.conventions, &self.pool, &self.fx)
            .with_reference_data(&self.bonds)
    }

    fn build(&self, id: &str, currency: Currency, options: &BuildOptions) -> CurveResult<YieldCurve> {
        YieldCurve::build(as_of(), &CurveSpec::new(currency, id), &self.inputs(), options)
    }
}

#[test]
fn test_two_pillar_discount_curve_midpoint() {
    let market = Market::new();
    let curve = market.build("EUR-DF", Currency::EUR, &BuildOptions::default()).unwrap();
    assert_eq!(curve.discount_date(as_of()).unwrap(), 1.0);
    let mid = Date::from_ymd(2024, 7, 15).unwrap();
    assert_relative_eq!(curve.discount_date(mid).unwrap(), 0.99, epsilon = 1e-3);
}

#[test]
fn test_bootstrapped_curve_reprices_instruments() {
    let market = Market::new();
    let curve = market.build("EUR-ESTER", Currency::EUR, &BuildOptions::default()).unwrap();
    assert_eq!(curve.discount(0.0).unwrap(), 1.0);

    let info = curve.calibration_info().unwrap();
    assert_eq!(info.instruments.len(), 6);
    assert!(info.max_instrument_error() < 1e-8, "{}", info.max_instrument_error());
    assert!(info.bootstrap.unwrap().converged);
    assert!(info.discount_factors.iter().all(|df| *df > 0.0));
    assert!(info.discount_factors.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn test_builds_are_deterministic() {
    let market = Market::new();
    let a = market.build("EUR-ESTER", Currency::EUR, &BuildOptions::default()).unwrap();
    let b = market.build("EUR-ESTER", Currency::EUR, &BuildOptions::default()).unwrap();
    assert_eq!(a.pillar_dates(), b.pillar_dates());
    for date in a.pillar_dates() {
        assert_eq!(
            a.discount_date(date).unwrap().to_bits(),
            b.discount_date(date).unwrap().to_bits()
        );
    }
}

#[test]
fn test_detached_curve_matches_live_curve() {
    let market = Market::new();
    let live = market
        .build(
            "EUR-ESTER",
            Currency::EUR,
            &BuildOptions {
                preserve_quote_linkage: true,
                ..BuildOptions::default()
            },
        )
        .unwrap();
    let detached = market.build("EUR-ESTER", Currency::EUR, &BuildOptions::default()).unwrap();
    assert!(!live.pillar_dates().is_empty());
    for date in live.pillar_dates() {
        assert_eq!(live.discount_date(date).unwrap(), detached.discount_date(date).unwrap());
    }
}

#[test]
fn test_zero_rates_rebuild_discount_curve() {
    let market = Market::new();
    let source = market.build("EUR-ESTER", Currency::EUR, &BuildOptions::default()).unwrap();

    let mut quotes = Vec::new();
    let mut loader = InMemoryLoader::new();
    for date in source.pillar_dates().into_iter().filter(|d| *d > as_of()) {
        let zero = source
            .zero_rate(date, DayCountConvention::Act365Fixed, Compounding::Continuous, Frequency::Annual)
            .unwrap();
        let key = format!("ZERO/RATE/EUR/EUR-ZC/A365/{date}");
        loader = loader.with_quote(as_of(), &key, zero.rate).unwrap();
        quotes.push(key);
    }
    let config = YieldCurveConfig::new(
        "EUR-ZC",
        Currency::EUR,
        vec![CurveSegment::Zero(pillar_curves::config::SimpleSegment {
            quotes,
            conventions: "EUR-ZERO".into(),
            projection_curve: None,
        })],
    )
    .with_interpolation(InterpolationVariable::Zero, InterpolationMethod::Linear);
    let configs = CurveConfigurations::new().with(config);
    let inputs = BuildInputs::new(&loader, &configs, &market.conventions, &market.pool, &market.fx);
    let rebuilt = YieldCurve::build(
        as_of(),
        &CurveSpec::new(Currency::EUR, "EUR-ZC"),
        &inputs,
        &BuildOptions::default(),
    )
    .unwrap();

    for date in source.pillar_dates() {
        assert_relative_eq!(
            rebuilt.discount_date(date).unwrap(),
            source.discount_date(date).unwrap(),
            epsilon = 1e-10
        );
    }
}

#[test]
fn test_segment_without_quotes_fails() {
    let market = Market::new();
    let err = market.build("EUR-EMPTY", Currency::EUR, &BuildOptions::default()).unwrap_err();
    assert!(err.is_build_failure());
    assert!(err.to_string().contains("Empty instrument list"), "{err}");
    assert!(err.to_string().contains("EUR-EMPTY on date 2024-01-15"), "{err}");
}

#[test]
fn test_average_ois_maturity_mismatch_fails() {
    let market = Market::new();
    let err = market.build("USD-FF", Currency::USD, &BuildOptions::default()).unwrap_err();
    assert!(err.is_build_failure());
    assert!(err
        .to_string()
        .ends_with("The swap and basis swap components of the Average OIS must have the same maturity."));
}

#[test]
fn test_average_ois_odd_quote_list_fails() {
    let market = Market::new();
    let err = market.build("USD-FF-ODD", Currency::USD, &BuildOptions::default()).unwrap_err();
    assert!(err.to_string().contains("pairs of swap rate and basis spread, got 3 quotes"), "{err}");
}

#[test]
fn test_cross_currency_curve_names_missing_discount_curve() {
    let market = Market::new();
    let err = market.build("EUR-XCCY", Currency::EUR, &BuildOptions::default()).unwrap_err();
    assert!(err.is_build_failure());
    assert!(err.to_string().contains("Yield/USD/USD-SOFR"), "{err}");
}

#[test]
fn test_cross_currency_curve_with_foreign_discount() {
    let mut market = Market::new();
    market.pool.insert_yield_curve(
        "Yield/USD/USD-SOFR",
        Arc::new(FlatForward::new(as_of(), 0.045, DayCountConvention::Act365Fixed)),
    );
    let curve = market.build("EUR-XCCY", Currency::EUR, &BuildOptions::default()).unwrap();
    assert_eq!(curve.discount(0.0).unwrap(), 1.0);
    assert!(curve.discount(5.0).unwrap() < 1.0);
}

#[test]
fn test_nelson_siegel_bond_curve() {
    let market = Market::new();
    let curve = market.build("EUR-BONDS", Currency::EUR, &BuildOptions::default()).unwrap();
    let fit = curve.calibration_info().unwrap().fitted_bond.as_ref().unwrap();
    assert_eq!(fit.fitting_method, "NelsonSiegel");
    assert!(fit.cost < 1e-6, "{}", fit.cost);
    assert_relative_eq!(fit.solution[0], 0.03, epsilon = 1e-3);
}

#[test]
fn test_dependent_curve_reads_published_curve() {
    let market = Market::new();
    let registry = CurveRegistry::new();
    let ester = market.build("EUR-ESTER", Currency::EUR, &BuildOptions::default()).unwrap();

    let inputs = BuildInputs::new(&market.loader, &market.configs, &market.conventions, &registry, &market.fx);
    let spec = CurveSpec::new(Currency::EUR, "EUR-BANK");
    let err = YieldCurve::build(as_of(), &spec, &inputs, &BuildOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Yield/EUR/EUR-ESTER"), "{err}");

    ester.publish(&registry).unwrap();
    let bank = YieldCurve::build(as_of(), &spec, &inputs, &BuildOptions::default()).unwrap();
    assert!(bank.discount(5.0).unwrap() < ester.discount(5.0).unwrap());
    bank.publish(&registry).unwrap();
    assert_eq!(registry.len(), 2);
    assert!(ester.publish(&registry).is_err());
}

#[test]
fn test_build_from_csv_quotes() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# date,key,value").unwrap();
    writeln!(file, "2024-01-15,DISCOUNT/RATE/EUR/EUR-DF/2025-01-15,0.98").unwrap();
    let loader = CsvLoader::from_path(file.path()).unwrap();
    assert_eq!(loader.len(), 1);

    let market = Market::new();
    let inputs = BuildInputs::new(&loader, &market.configs, &market.conventions, &market.pool, &market.fx);
    let curve = YieldCurve::build(
        as_of(),
        &CurveSpec::new(Currency::EUR, "EUR-DF"),
        &inputs,
        &BuildOptions::default(),
    )
    .unwrap();
    assert_relative_eq!(curve.discount(1.0).unwrap(), 0.98, epsilon = 1e-4);
}
