use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "CNY";

const MINOR_UNITS: i64 = 100;

//--------------------------------------        Cents        ---------------------------------------------------------
/// A monetary value, held as an integer number of minor units (1/100th of the currency unit).
///
/// On the wire, values are plain decimal numbers (`40`, `12.5`, `"0.07"`), which is what payment front-ends send.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Creates a value from whole currency units.
    pub fn from_major(units: i64) -> Self {
        Self(units * MINOR_UNITS)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn try_from_f64(value: f64) -> Result<Self, CentsConversionError> {
        if !value.is_finite() {
            return Err(CentsConversionError(format!("{value} is not a finite number")));
        }
        let raw = value * MINOR_UNITS as f64;
        let scaled = raw.round();
        if scaled.abs() > i64::MAX as f64 {
            return Err(CentsConversionError(format!("{value} is too large")));
        }
        // Allow for binary representation error (12.34 * 100 is 1233.9999999999998) but not for real fractions of a cent.
        let tolerance = (scaled.abs() * f64::EPSILON * 8.0).max(1e-6);
        if (raw - scaled).abs() > tolerance {
            return Err(CentsConversionError(format!("{value} has more than 2 decimal places")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as i64))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS as f64
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let minor = MINOR_UNITS.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / minor, abs % minor)
    }
}

impl FromStr for Cents {
    type Err = CentsConversionError;

    /// Parses a decimal string with at most two fractional digits, e.g. `"40"`, `"-3.5"` or `"12.05"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CentsConversionError(format!("'{s}' is not a valid amount"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (major.is_empty() && minor.is_empty()) || !all_digits(major) || !all_digits(minor) || minor.len() > 2 {
            return Err(err());
        }
        let major = if major.is_empty() { 0 } else { major.parse::<i64>().map_err(|_| err())? };
        let minor = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| err())? * 10,
            _ => minor.parse::<i64>().map_err(|_| err())?,
        };
        let value = major.checked_mul(MINOR_UNITS).and_then(|v| v.checked_add(minor)).ok_or_else(err)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CentsVisitor)
    }
}

struct CentsVisitor;

impl<'de> de::Visitor<'de> for CentsVisitor {
    type Value = Cents;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(MINOR_UNITS).map(Cents).ok_or_else(|| E::custom(format!("{v} is too large")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} is too large")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Cents::try_from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}
