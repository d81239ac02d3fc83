//! Quote loaders.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use pillar_core::Date;
use rust_decimal::Decimal;
use tracing::debug;

use super::MarketDatum;
use crate::error::{CurveError, CurveResult};

/// Source of dated market quotes.
pub trait Loader: Send + Sync {
    /// Returns the quote for `key` on `as_of`, if present.
    fn get(&self, key: &str, as_of: Date) -> Option<&MarketDatum>;

    /// Returns true if a quote for `key` exists on `as_of`.
    fn has(&self, key: &str, as_of: Date) -> bool {
        self.get(key, as_of).is_some()
    }

    /// Returns every quote for `as_of`, in key order.
    fn load_quotes(&self, as_of: Date) -> Vec<&MarketDatum>;
}

/// Loader over quotes held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    data: BTreeMap<Date, BTreeMap<String, MarketDatum>>,
}

impl InMemoryLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a datum, replacing any earlier quote with the same date and key.
    pub fn add(&mut self, datum: MarketDatum) {
        self.data
            .entry(datum.as_of())
            .or_default()
            .insert(datum.key().to_string(), datum);
    }

    /// Parses the key and adds a quote.
    pub fn add_quote(&mut self, as_of: Date, key: &str, value: Decimal) -> CurveResult<()> {
        self.add(MarketDatum::new(as_of, key, value)?);
        Ok(())
    }

    /// Builder-style [`add_quote`](Self::add_quote) taking an `f64` value.
    pub fn with_quote(mut self, as_of: Date, key: &str, value: f64) -> CurveResult<Self> {
        self.add(MarketDatum::from_f64(as_of, key, value)?);
        Ok(self)
    }

    /// Number of quotes across all dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.values().map(BTreeMap::len).sum()
    }

    /// Returns true if no quotes are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Loader for InMemoryLoader {
    fn get(&self, key: &str, as_of: Date) -> Option<&MarketDatum> {
        self.data.get(&as_of).and_then(|m| m.get(key))
    }

    fn load_quotes(&self, as_of: Date) -> Vec<&MarketDatum> {
        self.data
            .get(&as_of)
            .map(|m| m.values().collect())
            .unwrap_or_default()
    }
}

/// Loader reading `date,key,value` rows from CSV.
///
/// Lines starting with `#` are comments. Dates are `YYYY-MM-DD` or
/// `YYYYMMDD`; values may use scientific notation.
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    inner: InMemoryLoader,
}

impl CsvLoader {
    /// Reads a comma-separated file.
    pub fn from_path(path: impl AsRef<Path>) -> CurveResult<Self> {
        Self::from_path_with_delimiter(path, b',')
    }

    /// Reads a file with the given delimiter.
    pub fn from_path_with_delimiter(path: impl AsRef<Path>, delimiter: u8) -> CurveResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| CurveError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let loader = Self::from_reader(file, delimiter)?;
        debug!("Loaded {} quotes from {}", loader.inner.len(), path.display());
        Ok(loader)
    }

    /// Reads rows from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> CurveResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut inner = InMemoryLoader::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| CurveError::parse("csv record", e.to_string()))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() < 3 {
                return Err(CurveError::parse("csv record", format!("{record:?}")));
            }
            let as_of = Date::parse(&record[0])?;
            let value = parse_decimal(&record[2])?;
            inner.add_quote(as_of, &record[1], value)?;
        }
        Ok(Self { inner })
    }

    /// Number of quotes read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no quotes were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Loader for CsvLoader {
    fn get(&self, key: &str, as_of: Date) -> Option<&MarketDatum> {
        self.inner.get(key, as_of)
    }

    fn load_quotes(&self, as_of: Date) -> Vec<&MarketDatum> {
        self.inner.load_quotes(as_of)
    }
}

fn parse_decimal(s: &str) -> CurveResult<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| CurveError::parse("quote value", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_memory_lookup_by_date() {
        let d1 = Date::from_ymd(2024, 1, 15).unwrap();
        let d2 = Date::from_ymd(2024, 1, 16).unwrap();
        let mut loader = InMemoryLoader::new();
        loader.add_quote(d1, "MM/RATE/EUR/2D/3M", dec!(0.039)).unwrap();
        assert!(loader.has("MM/RATE/EUR/2D/3M", d1));
        assert!(!loader.has("MM/RATE/EUR/2D/3M", d2));
        assert_eq!(loader.load_quotes(d1).len(), 1);
        assert!(loader.load_quotes(d2).is_empty());
    }

    #[test]
    fn test_csv_from_reader() {
        let text = "# as of, key, value\n2024-01-15,MM/RATE/EUR/2D/3M,0.039\n\n20240115;x\n";
        assert!(CsvLoader::from_reader(text.as_bytes(), b',').is_err());

        let text = "# comment\n2024-01-15;MM/RATE/EUR/2D/3M;3.9e-2\n2024-01-15;FX/RATE/EUR/USD;1.09\n";
        let loader = CsvLoader::from_reader(text.as_bytes(), b';').unwrap();
        assert_eq!(loader.len(), 2);
        let d = Date::from_ymd(2024, 1, 15).unwrap();
        let q = loader.get("MM/RATE/EUR/2D/3M", d).unwrap();
        assert_eq!(q.value(), dec!(0.039));
    }
}
