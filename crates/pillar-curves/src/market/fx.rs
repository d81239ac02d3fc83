//! FX spot lookup and triangulation.

use std::collections::BTreeMap;

use pillar_core::{Currency, Date};

use super::{InstrumentType, Loader, QuoteDetail};
use crate::error::{CurveError, CurveResult};

/// Source of FX spot rates, direct or synthetic.
pub trait FxTriangulation: Send + Sync {
    /// Units of `ccy` per one unit of `unit`.
    fn get_quote(&self, unit: Currency, ccy: Currency) -> CurveResult<f64>;
}

/// Cross rates built from a set of FX spot quotes.
///
/// A pair resolves from a direct quote, the inverse of the opposite quote,
/// or a single hop through a common currency.
#[derive(Debug, Clone, Default)]
pub struct FxTriangulationGraph {
    rates: BTreeMap<(Currency, Currency), f64>,
}

impl FxTriangulationGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a spot rate, `ccy` per one `unit`.
    pub fn add_rate(&mut self, unit: Currency, ccy: Currency, rate: f64) {
        self.rates.insert((unit, ccy), rate);
    }

    /// Collects every `FX/RATE/UNIT/CCY` quote for the date.
    #[must_use]
    pub fn from_loader(loader: &dyn Loader, as_of: Date) -> Self {
        let mut graph = Self::new();
        for datum in loader.load_quotes(as_of) {
            if let QuoteDetail::FxSpot { unit, ccy } = datum.detail() {
                graph.add_rate(*unit, *ccy, datum.value_f64());
            }
        }
        graph
    }

    fn direct(&self, unit: Currency, ccy: Currency) -> Option<f64> {
        if unit == ccy {
            return Some(1.0);
        }
        if let Some(r) = self.rates.get(&(unit, ccy)) {
            return Some(*r);
        }
        self.rates
            .get(&(ccy, unit))
            .filter(|r| **r != 0.0)
            .map(|r| 1.0 / r)
    }

    fn currencies(&self) -> impl Iterator<Item = Currency> + '_ {
        let mut seen: Vec<Currency> = self.rates.keys().flat_map(|(a, b)| [*a, *b]).collect();
        seen.sort();
        seen.dedup();
        seen.into_iter()
    }
}

impl FxTriangulation for FxTriangulationGraph {
    fn get_quote(&self, unit: Currency, ccy: Currency) -> CurveResult<f64> {
        if let Some(r) = self.direct(unit, ccy) {
            return Ok(r);
        }
        for via in self.currencies() {
            if let (Some(a), Some(b)) = (self.direct(unit, via), self.direct(via, ccy)) {
                return Ok(a * b);
            }
        }
        Err(CurveError::data(format!(
            "FX triangulation: unable to build FX rate for ccy pair {unit}{ccy}"
        )))
    }
}

/// A resolved FX spot rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxSpot {
    /// Unit (base) currency.
    pub unit: Currency,
    /// Quote currency.
    pub ccy: Currency,
    /// Units of `ccy` per one `unit`.
    pub rate: f64,
}

impl FxSpot {
    /// The same rate seen from the other side.
    #[must_use]
    pub fn inverted(self) -> Self {
        Self {
            unit: self.ccy,
            ccy: self.unit,
            rate: 1.0 / self.rate,
        }
    }
}

/// Resolves an FX spot identifier.
///
/// `FX/RATE/UNIT/CCY` goes to the loader first. Otherwise the pair is read
/// from `FX/RATE/UNIT/CCY`, `FX/UNIT/CCY` or a compact `UNITCCY` and priced
/// through triangulation.
pub fn resolve_fx_spot(
    spot_id: &str,
    as_of: Date,
    loader: &dyn Loader,
    fx: &dyn FxTriangulation,
) -> CurveResult<FxSpot> {
    let tokens: Vec<&str> = spot_id.split('/').collect();

    if tokens.len() == 4 && tokens[0] == "FX" && tokens[1] == "RATE" {
        if let Some(datum) = loader.get(spot_id, as_of) {
            datum.expect_instrument(InstrumentType::FxSpot)?;
            if let QuoteDetail::FxSpot { unit, ccy } = datum.detail() {
                return Ok(FxSpot {
                    unit: *unit,
                    ccy: *ccy,
                    rate: datum.value_f64(),
                });
            }
        }
    }

    let (unit, ccy) = if tokens.len() > 1 && tokens[0] == "FX" {
        match tokens.len() {
            3 => (tokens[1], tokens[2]),
            4 if tokens[1] == "RATE" => (tokens[2], tokens[3]),
            _ => {
                return Err(CurveError::configuration(format!("Invalid FX spot ID {spot_id}")));
            }
        }
    } else if tokens.len() == 1 && spot_id.len() == 6 && spot_id.is_ascii() {
        (&spot_id[..3], &spot_id[3..])
    } else {
        return Err(CurveError::data(format!(
            "Could not find quote for ID {spot_id} with as of date {as_of}."
        )));
    };
    let unit: Currency = unit.parse()?;
    let ccy: Currency = ccy.parse()?;
    let rate = fx.get_quote(unit, ccy)?;
    Ok(FxSpot { unit, ccy, rate })
}
