//! Exchange trading pair identifiers.

use crate::InvalidSymbol;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A trading pair such as `ltc_btc`, split into base and quote currency codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    /// The raw `<base>_<quote>` identifier.
    raw: String,
    /// Byte offset of the `_` separator.
    split: usize,
}

impl Symbol {
    /// Creates a symbol from its `<base>_<quote>` form.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input contains exactly one `_` with
    /// non-empty codes on both sides.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidSymbol> {
        let raw = raw.into();
        let split = raw
            .split_once('_')
            .filter(|(base, quote)| !base.is_empty() && !quote.is_empty() && !quote.contains('_'))
            .map(|(base, _)| base.len());

        match split {
            Some(split) => Ok(Self { raw, split }),
            None => Err(InvalidSymbol(raw)),
        }
    }

    /// Returns the full identifier as sent to the exchange.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the base currency code, e.g. `ltc` for `ltc_btc`.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Returns the quote currency code, e.g. `btc` for `ltc_btc`.
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.raw[self.split + 1..]
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Symbol {
    type Err = InvalidSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = InvalidSymbol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.raw
    }
}
