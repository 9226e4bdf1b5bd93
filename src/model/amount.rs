//! Monetary amounts expressed in minor units.
#![deny(missing_docs)]
#![deny(warnings)]

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

/// Used to express account balances and transfer amounts.
///
/// It's a thin wrapper over a signed 64-bit integer counting minor units (cents, pence...), so
/// there is no rounding anywhere in the ledger. Arithmetic is only offered in checked form, an
/// overflow is reported to the caller instead of silently wrapping a balance around.
///
/// Serialization writes a plain JSON number. Deserialization is more lenient and also accepts a
/// numeric string, as existing clients send `{"balance":"75"}`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

/// Error returned when parsing an `Amount` from text.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid amount {0:?}")]
pub struct ParseAmountError(String);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);
    /// The minimum value of an amount.
    pub const MIN: Amount = Amount(i64::MIN);
    /// The maximum value of an amount.
    pub const MAX: Amount = Amount(i64::MAX);

    /// Creates an amount of `minor_units`.
    pub const fn new(minor_units: i64) -> Self {
        Amount(minor_units)
    }

    /// Number of minor units.
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// True for amounts strictly below zero.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    /// Returns `None` if overflow occurred.
    pub fn checked_add(&self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Checked subtraction.
    /// Returns `None` if overflow occurred.
    pub fn checked_sub(&self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl From<i64> for Amount {
    fn from(minor_units: i64) -> Self {
        Amount(minor_units)
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Amount)
            .map_err(|_| ParseAmountError(s.to_owned()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an integer amount of minor units, as a number or a string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        i64::try_from(v)
            .map(Amount)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
