use std::{
    fmt,
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A signed money value with two decimal places, held as a whole number of cents.
///
/// In JSON an amount is a plain number (`70.5`). Incoming JSON may also use a numeric string (`"70.50"`); values with
/// more than two decimals are rounded to the nearest cent.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, AddAssign, add_assign);
op!(inplace Amount, SubAssign, sub_assign);
op!(unary Amount, Neg, neg);

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Saturates at the `i64` limits.
    pub fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn try_from_f64(value: f64) -> Result<Self, AmountConversionError> {
        if !value.is_finite() {
            return Err(AmountConversionError(format!("{value} is not a finite number")));
        }
        let cents = (value * 100.0).round();
        if cents > i64::MAX as f64 || cents < i64::MIN as f64 {
            return Err(AmountConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }
}

impl From<i64> for Amount {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AmountConversionError(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if (whole.is_empty() && frac.is_empty())
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }
        let whole = if whole.is_empty() { 0 } else { whole.parse::<i64>().map_err(|_| err())? };
        let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().map(|d| d >= 5).unwrap_or(false);
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(err)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a numeric string with up to two decimals")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(100).map(Amount).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Amount)
            .ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Amount::try_from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}
