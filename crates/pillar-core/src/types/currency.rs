//! Currency type with ISO 4217 codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// ISO 4217 currency codes for the markets the curve engine covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// United States Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound Sterling
    GBP,
    /// Japanese Yen
    JPY,
    /// Swiss Franc
    CHF,
    /// Canadian Dollar
    CAD,
    /// Australian Dollar
    AUD,
    /// New Zealand Dollar
    NZD,
    /// Swedish Krona
    SEK,
    /// Norwegian Krone
    NOK,
    /// Danish Krone
    DKK,
    /// Hong Kong Dollar
    HKD,
    /// Singapore Dollar
    SGD,
    /// Chinese Yuan Renminbi
    CNY,
    /// Indian Rupee
    INR,
    /// Brazilian Real
    BRL,
    /// Mexican Peso
    MXN,
    /// South African Rand
    ZAR,
}

impl Currency {
    /// Every supported currency.
    pub const ALL: [Currency; 18] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CHF,
        Currency::CAD,
        Currency::AUD,
        Currency::NZD,
        Currency::SEK,
        Currency::NOK,
        Currency::DKK,
        Currency::HKD,
        Currency::SGD,
        Currency::CNY,
        Currency::INR,
        Currency::BRL,
        Currency::MXN,
        Currency::ZAR,
    ];

    /// Returns the ISO 4217 3-letter code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::NZD => "NZD",
            Currency::SEK => "SEK",
            Currency::NOK => "NOK",
            Currency::DKK => "DKK",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::CNY => "CNY",
            Currency::INR => "INR",
            Currency::BRL => "BRL",
            Currency::MXN => "MXN",
            Currency::ZAR => "ZAR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or(CoreError::UnknownCurrency {
                code: s.to_string(),
            })
    }
}

impl TryFrom<String> for Currency {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!(Currency::BRL.to_string(), "BRL");
        assert!("XXX".parse::<Currency>().is_err());
    }

    #[test]
    fn test_all_codes_round_trip() {
        for ccy in Currency::ALL {
            assert_eq!(ccy.code().parse::<Currency>().unwrap(), ccy);
        }
    }
}
