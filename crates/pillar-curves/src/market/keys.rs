//! Market datum key grammar.
//!
//! Keys are slash-separated, instrument type first and quote type second:
//! `MM/RATE/EUR/EUR-EURIBOR-6M/2D/6M`, `FXFWD/RATE/EUR/USD/1Y`,
//! `ZERO/RATE/EUR/EUR-CURVE/A365/2030-01-15`. The remaining tokens are
//! decoded into a [`QuoteDetail`].

use std::fmt;
use std::str::FromStr;

use pillar_core::daycounts::DayCountConvention;
use pillar_core::{Currency, Date, Period};
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// What a quote measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteType {
    /// Rate, in decimal.
    Rate,
    /// Price, or outright FX forward.
    Price,
    /// Basis spread, in decimal.
    BasisSpread,
    /// Spread over a reference zero curve.
    YieldSpread,
    /// Ratio of two rates.
    Ratio,
}

impl QuoteType {
    fn token(self) -> &'static str {
        match self {
            QuoteType::Rate => "RATE",
            QuoteType::Price => "PRICE",
            QuoteType::BasisSpread => "BASIS_SPREAD",
            QuoteType::YieldSpread => "YIELD_SPREAD",
            QuoteType::Ratio => "RATIO",
        }
    }
}

impl fmt::Display for QuoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for QuoteType {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RATE" => Ok(QuoteType::Rate),
            "PRICE" => Ok(QuoteType::Price),
            "BASIS_SPREAD" => Ok(QuoteType::BasisSpread),
            "YIELD_SPREAD" => Ok(QuoteType::YieldSpread),
            "RATIO" => Ok(QuoteType::Ratio),
            _ => Err(CurveError::parse("quote type", s)),
        }
    }
}

/// The instrument a quote refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentType {
    /// Money market deposit.
    MoneyMarket,
    /// Forward rate agreement.
    Fra,
    /// FRA between two IMM dates.
    ImmFra,
    /// Money market future on a term index.
    MoneyMarketFuture,
    /// Future on a compounded overnight index.
    OvernightIndexFuture,
    /// Interest rate swap, including OIS.
    IrSwap,
    /// Single-currency basis swap.
    BasisSwap,
    /// BMA / SIFMA versus Libor ratio swap.
    BmaSwap,
    /// Cross-currency basis swap.
    CrossCcyBasisSwap,
    /// Cross-currency fixed versus float swap.
    CrossCcyFixFloatSwap,
    /// FX spot rate.
    FxSpot,
    /// FX forward.
    FxForward,
    /// Discount factor.
    Discount,
    /// Zero rate.
    Zero,
    /// Bond price.
    Bond,
}

impl InstrumentType {
    /// Key token of the instrument type.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            InstrumentType::MoneyMarket => "MM",
            InstrumentType::Fra => "FRA",
            InstrumentType::ImmFra => "IMM_FRA",
            InstrumentType::MoneyMarketFuture => "MM_FUTURE",
            InstrumentType::OvernightIndexFuture => "OI_FUTURE",
            InstrumentType::IrSwap => "IR_SWAP",
            InstrumentType::BasisSwap => "BASIS_SWAP",
            InstrumentType::BmaSwap => "BMA_SWAP",
            InstrumentType::CrossCcyBasisSwap => "CC_BASIS_SWAP",
            InstrumentType::CrossCcyFixFloatSwap => "CC_FIX_FLOAT_SWAP",
            InstrumentType::FxSpot => "FX",
            InstrumentType::FxForward => "FXFWD",
            InstrumentType::Discount => "DISCOUNT",
            InstrumentType::Zero => "ZERO",
            InstrumentType::Bond => "BOND",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for InstrumentType {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MM" => Ok(InstrumentType::MoneyMarket),
            "FRA" => Ok(InstrumentType::Fra),
            "IMM_FRA" => Ok(InstrumentType::ImmFra),
            "MM_FUTURE" => Ok(InstrumentType::MoneyMarketFuture),
            "OI_FUTURE" => Ok(InstrumentType::OvernightIndexFuture),
            "IR_SWAP" => Ok(InstrumentType::IrSwap),
            "BASIS_SWAP" => Ok(InstrumentType::BasisSwap),
            "BMA_SWAP" => Ok(InstrumentType::BmaSwap),
            "CC_BASIS_SWAP" => Ok(InstrumentType::CrossCcyBasisSwap),
            "CC_FIX_FLOAT_SWAP" => Ok(InstrumentType::CrossCcyFixFloatSwap),
            "FX" => Ok(InstrumentType::FxSpot),
            "FXFWD" => Ok(InstrumentType::FxForward),
            "DISCOUNT" => Ok(InstrumentType::Discount),
            "ZERO" => Ok(InstrumentType::Zero),
            "BOND" => Ok(InstrumentType::Bond),
            _ => Err(CurveError::parse("instrument type", s)),
        }
    }
}

/// A pillar given either as a date or as a tenor from the as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrTenor {
    /// Explicit date.
    Date(Date),
    /// Tenor, converted with the relevant convention.
    Tenor(Period),
}

impl DateOrTenor {
    fn parse(token: &str) -> CurveResult<Self> {
        if let Ok(date) = Date::parse(token) {
            return Ok(DateOrTenor::Date(date));
        }
        token
            .parse::<Period>()
            .map(DateOrTenor::Tenor)
            .map_err(|_| CurveError::parse("date or tenor", token))
    }
}

/// Term of an FX forward quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxForwardTerm {
    /// Overnight, today to tomorrow.
    Overnight,
    /// Tomorrow to the next day.
    TomorrowNext,
    /// Spot to the next day.
    SpotNext,
    /// Spot to one week after spot.
    SpotWeek,
    /// Regular tenor from spot.
    Tenor(Period),
}

impl FxForwardTerm {
    fn parse(token: &str) -> CurveResult<Self> {
        match token {
            "ON" => Ok(FxForwardTerm::Overnight),
            "TN" => Ok(FxForwardTerm::TomorrowNext),
            "SN" => Ok(FxForwardTerm::SpotNext),
            "SW" => Ok(FxForwardTerm::SpotWeek),
            other => Ok(FxForwardTerm::Tenor(other.parse()?)),
        }
    }

    /// Length of the forward period.
    #[must_use]
    pub fn tenor(self) -> Period {
        match self {
            FxForwardTerm::Overnight | FxForwardTerm::TomorrowNext | FxForwardTerm::SpotNext => {
                Period::days(1)
            }
            FxForwardTerm::SpotWeek => Period::weeks(1),
            FxForwardTerm::Tenor(p) => p,
        }
    }

    /// Business days from the as-of date to the start of the forward period.
    #[must_use]
    pub fn start_days(self, spot_days: u32) -> u32 {
        match self {
            FxForwardTerm::Overnight => 0,
            FxForwardTerm::TomorrowNext => 1,
            _ => spot_days,
        }
    }
}

/// Year and month of a futures contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContractMonth {
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
}

impl ContractMonth {
    fn parse(token: &str) -> CurveResult<Self> {
        let bad = || CurveError::parse("contract month", token);
        let (y, m) = token.split_once('-').ok_or_else(bad)?;
        let year: i32 = y.parse().map_err(|_| bad())?;
        let month: u32 = m.parse().map_err(|_| bad())?;
        if !(1..=12).contains(&month) {
            return Err(bad());
        }
        Ok(Self { year, month })
    }
}

/// Instrument-specific content of a market datum key.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteDetail {
    /// `MM/RATE/CCY/[INDEX/]FWD/TERM`
    MoneyMarket {
        /// Currency.
        ccy: Currency,
        /// Optional index name.
        index: Option<String>,
        /// Forward start.
        fwd_start: Period,
        /// Deposit term.
        term: Period,
    },
    /// `FRA/RATE/CCY/FWD/TERM`
    Fra {
        /// Currency.
        ccy: Currency,
        /// Forward start.
        fwd_start: Period,
        /// Underlying term.
        term: Period,
    },
    /// `IMM_FRA/RATE/CCY/IMM1/IMM2`
    ImmFra {
        /// Currency.
        ccy: Currency,
        /// Start IMM sequence number.
        imm1: u32,
        /// End IMM sequence number.
        imm2: u32,
    },
    /// `MM_FUTURE|OI_FUTURE/PRICE/CCY/YYYY-MM/EXCH/TENOR`
    Future {
        /// Currency.
        ccy: Currency,
        /// Contract month.
        expiry: ContractMonth,
        /// Exchange code.
        exchange: String,
        /// Underlying tenor.
        tenor: Period,
    },
    /// `IR_SWAP/RATE/CCY/[INDEX/]FWD/TENOR/TERM`
    Swap {
        /// Currency.
        ccy: Currency,
        /// Optional index name.
        index: Option<String>,
        /// Forward start.
        fwd_start: Period,
        /// Floating leg tenor.
        tenor: Period,
        /// Swap term.
        term: Period,
    },
    /// `BASIS_SWAP/BASIS_SPREAD/FLAT/SPREAD/CCY/[INDEX/]TERM`
    BasisSwap {
        /// Tenor of the flat leg.
        flat_tenor: Period,
        /// Tenor of the leg paying the spread.
        spread_tenor: Period,
        /// Currency.
        ccy: Currency,
        /// Optional index name.
        index: Option<String>,
        /// Swap term.
        term: Period,
    },
    /// `BMA_SWAP/RATIO/CCY/[INDEX/]TERM`
    BmaSwap {
        /// Currency.
        ccy: Currency,
        /// Optional index name.
        index: Option<String>,
        /// Swap term.
        term: Period,
    },
    /// `CC_BASIS_SWAP/BASIS_SPREAD/FLATCCY/FLATTENOR/CCY/TENOR/TERM`
    CrossCcyBasis {
        /// Currency of the flat leg.
        flat_ccy: Currency,
        /// Tenor of the flat leg.
        flat_tenor: Period,
        /// Currency of the spread leg.
        ccy: Currency,
        /// Tenor of the spread leg.
        tenor: Period,
        /// Swap term.
        term: Period,
    },
    /// `CC_FIX_FLOAT_SWAP/RATE/FLOATCCY/FLOATTENOR/FIXEDCCY/FIXEDTENOR/TERM`
    CrossCcyFixFloat {
        /// Floating leg currency.
        float_ccy: Currency,
        /// Floating leg tenor.
        float_tenor: Period,
        /// Fixed leg currency.
        fixed_ccy: Currency,
        /// Fixed leg tenor.
        fixed_tenor: Period,
        /// Swap term.
        term: Period,
    },
    /// `FX/RATE/UNIT/CCY`
    FxSpot {
        /// Unit (base) currency.
        unit: Currency,
        /// Quote currency.
        ccy: Currency,
    },
    /// `FXFWD/RATE|PRICE/UNIT/CCY/TERM`
    FxForward {
        /// Unit (base) currency.
        unit: Currency,
        /// Quote currency.
        ccy: Currency,
        /// Forward term.
        term: FxForwardTerm,
    },
    /// `DISCOUNT/RATE/CCY/ID/DATE|TENOR`
    Discount {
        /// Currency.
        ccy: Currency,
        /// Curve ID.
        curve_id: String,
        /// Pillar.
        point: DateOrTenor,
    },
    /// `ZERO/RATE|YIELD_SPREAD/CCY/ID/DC/DATE|TENOR`
    Zero {
        /// Currency.
        ccy: Currency,
        /// Curve ID.
        curve_id: String,
        /// Day counter of the quoted rate.
        day_counter: DayCountConvention,
        /// Pillar.
        point: DateOrTenor,
    },
    /// `BOND/PRICE/SECID`
    Bond {
        /// Security identifier.
        security_id: String,
    },
}

/// Decodes a key into its instrument type, quote type and detail.
pub fn parse_key(key: &str) -> CurveResult<(InstrumentType, QuoteType, QuoteDetail)> {
    let tokens: Vec<&str> = key.split('/').map(str::trim).collect();
    let malformed = || CurveError::parse("market datum key", key);
    if tokens.len() < 3 {
        return Err(malformed());
    }
    let instrument: InstrumentType = tokens[0].parse().map_err(|_| malformed())?;
    let quote_type: QuoteType = tokens[1].parse().map_err(|_| malformed())?;
    let t = &tokens[2..];

    let ccy = |s: &str| -> CurveResult<Currency> { Ok(s.parse::<Currency>()?) };
    let period = |s: &str| -> CurveResult<Period> { Ok(s.parse::<Period>()?) };

    let detail = match (instrument, t.len()) {
        (InstrumentType::MoneyMarket, 3) => QuoteDetail::MoneyMarket {
            ccy: ccy(t[0])?,
            index: None,
            fwd_start: period(t[1])?,
            term: period(t[2])?,
        },
        (InstrumentType::MoneyMarket, 4) => QuoteDetail::MoneyMarket {
            ccy: ccy(t[0])?,
            index: Some(t[1].to_string()),
            fwd_start: period(t[2])?,
            term: period(t[3])?,
        },
        (InstrumentType::Fra, 3) => QuoteDetail::Fra {
            ccy: ccy(t[0])?,
            fwd_start: period(t[1])?,
            term: period(t[2])?,
        },
        (InstrumentType::ImmFra, 3) => QuoteDetail::ImmFra {
            ccy: ccy(t[0])?,
            imm1: t[1].parse().map_err(|_| malformed())?,
            imm2: t[2].parse().map_err(|_| malformed())?,
        },
        (InstrumentType::MoneyMarketFuture | InstrumentType::OvernightIndexFuture, 4) => {
            QuoteDetail::Future {
                ccy: ccy(t[0])?,
                expiry: ContractMonth::parse(t[1])?,
                exchange: t[2].to_string(),
                tenor: period(t[3])?,
            }
        }
        (InstrumentType::IrSwap, 4) => QuoteDetail::Swap {
            ccy: ccy(t[0])?,
            index: None,
            fwd_start: period(t[1])?,
            tenor: period(t[2])?,
            term: period(t[3])?,
        },
        (InstrumentType::IrSwap, 5) => QuoteDetail::Swap {
            ccy: ccy(t[0])?,
            index: Some(t[1].to_string()),
            fwd_start: period(t[2])?,
            tenor: period(t[3])?,
            term: period(t[4])?,
        },
        (InstrumentType::BasisSwap, 4 | 5) => QuoteDetail::BasisSwap {
            flat_tenor: period(t[0])?,
            spread_tenor: period(t[1])?,
            ccy: ccy(t[2])?,
            index: (t.len() == 5).then(|| t[3].to_string()),
            term: period(t[t.len() - 1])?,
        },
        (InstrumentType::BmaSwap, 2 | 3) => QuoteDetail::BmaSwap {
            ccy: ccy(t[0])?,
            index: (t.len() == 3).then(|| t[1].to_string()),
            term: period(t[t.len() - 1])?,
        },
        (InstrumentType::CrossCcyBasisSwap, 5) => QuoteDetail::CrossCcyBasis {
            flat_ccy: ccy(t[0])?,
            flat_tenor: period(t[1])?,
            ccy: ccy(t[2])?,
            tenor: period(t[3])?,
            term: period(t[4])?,
        },
        (InstrumentType::CrossCcyFixFloatSwap, 5) => QuoteDetail::CrossCcyFixFloat {
            float_ccy: ccy(t[0])?,
            float_tenor: period(t[1])?,
            fixed_ccy: ccy(t[2])?,
            fixed_tenor: period(t[3])?,
            term: period(t[4])?,
        },
        (InstrumentType::FxSpot, 2) => QuoteDetail::FxSpot {
            unit: ccy(t[0])?,
            ccy: ccy(t[1])?,
        },
        (InstrumentType::FxForward, 3) => QuoteDetail::FxForward {
            unit: ccy(t[0])?,
            ccy: ccy(t[1])?,
            term: FxForwardTerm::parse(t[2])?,
        },
        (InstrumentType::Discount, 3) => QuoteDetail::Discount {
            ccy: ccy(t[0])?,
            curve_id: t[1].to_string(),
            point: DateOrTenor::parse(t[2])?,
        },
        (InstrumentType::Zero, 4) => QuoteDetail::Zero {
            ccy: ccy(t[0])?,
            curve_id: t[1].to_string(),
            day_counter: t[2].parse()?,
            point: DateOrTenor::parse(t[3])?,
        },
        (InstrumentType::Bond, 1) => QuoteDetail::Bond {
            security_id: t[0].to_string(),
        },
        _ => return Err(malformed()),
    };
    Ok((instrument, quote_type, detail))
}
