//! Market quotes, quote loaders and FX triangulation.
//!
//! Quotes are keyed by strings such as `IR_SWAP/RATE/EUR/2D/6M/10Y` and
//! looked up per as-of date through the [`Loader`] trait. A lookup miss is
//! `None`; whether that is fatal is the caller's decision.

mod fx;
mod keys;
mod loader;

pub use fx::{resolve_fx_spot, FxSpot, FxTriangulation, FxTriangulationGraph};
pub use keys::{
    parse_key, ContractMonth, DateOrTenor, FxForwardTerm, InstrumentType, QuoteDetail, QuoteType,
};
pub use loader::{CsvLoader, InMemoryLoader, Loader};

use pillar_core::Date;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{CurveError, CurveResult};

/// A dated market observation.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDatum {
    as_of: Date,
    key: String,
    value: Decimal,
    instrument_type: InstrumentType,
    quote_type: QuoteType,
    detail: QuoteDetail,
}

impl MarketDatum {
    /// Creates a datum, decoding the key.
    ///
    /// # Errors
    ///
    /// Returns a parse error for a malformed key.
    pub fn new(as_of: Date, key: impl Into<String>, value: Decimal) -> CurveResult<Self> {
        let key = key.into();
        let (instrument_type, quote_type, detail) = parse_key(&key)?;
        Ok(Self {
            as_of,
            key,
            value,
            instrument_type,
            quote_type,
            detail,
        })
    }

    /// Creates a datum from an `f64` value.
    pub fn from_f64(as_of: Date, key: impl Into<String>, value: f64) -> CurveResult<Self> {
        let key = key.into();
        let value = Decimal::try_from(value).map_err(|_| CurveError::parse("quote value", value.to_string()))?;
        Self::new(as_of, key, value)
    }

    /// As-of date of the observation.
    #[must_use]
    pub fn as_of(&self) -> Date {
        self.as_of
    }

    /// Quote key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Quoted value.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Quoted value as `f64`.
    #[must_use]
    pub fn value_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or(f64::NAN)
    }

    /// Instrument type.
    #[must_use]
    pub fn instrument_type(&self) -> InstrumentType {
        self.instrument_type
    }

    /// Quote type.
    #[must_use]
    pub fn quote_type(&self) -> QuoteType {
        self.quote_type
    }

    /// Decoded key content.
    #[must_use]
    pub fn detail(&self) -> &QuoteDetail {
        &self.detail
    }

    /// Fails with a quote type mismatch unless the instrument type matches.
    pub fn expect_instrument(&self, expected: InstrumentType) -> CurveResult<&Self> {
        if self.instrument_type == expected {
            Ok(self)
        } else {
            Err(CurveError::quote_type(&self.key, expected.token()))
        }
    }

    /// Fails with a quote type mismatch unless the quote type matches.
    pub fn expect_quote_type(&self, expected: QuoteType) -> CurveResult<&Self> {
        if self.quote_type == expected {
            Ok(self)
        } else {
            Err(CurveError::quote_type(&self.key, expected.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_datum_decodes_key() {
        let d = Date::from_ymd(2024, 1, 15).unwrap();
        let q = MarketDatum::new(d, "IR_SWAP/RATE/EUR/2D/6M/10Y", dec!(0.0275)).unwrap();
        assert_eq!(q.instrument_type(), InstrumentType::IrSwap);
        assert_eq!(q.quote_type(), QuoteType::Rate);
        assert!((q.value_f64() - 0.0275).abs() < 1e-15);
        assert!(q.expect_instrument(InstrumentType::IrSwap).is_ok());
        let err = q.expect_instrument(InstrumentType::MoneyMarket).unwrap_err();
        assert!(matches!(err, CurveError::QuoteTypeMismatch { .. }));
    }

    #[test]
    fn test_bad_key_rejected() {
        let d = Date::from_ymd(2024, 1, 15).unwrap();
        assert!(MarketDatum::new(d, "NOPE/RATE/EUR", dec!(1)).is_err());
    }
}
