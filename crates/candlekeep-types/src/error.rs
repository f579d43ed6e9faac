//! Error types for candlekeep core types.

use thiserror::Error;

/// A period token that is not `<positive integer><unit>` or is not in the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid period '{0}', expected <count><unit> with unit one of: min, hour, day, week")]
pub struct InvalidPeriod(pub String);

/// A trading pair that is not of the form `<base>_<quote>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid symbol '{0}', expected <base>_<quote>")]
pub struct InvalidSymbol(pub String);
