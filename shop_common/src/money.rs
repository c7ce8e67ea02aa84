use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Every amount is stored in the currency's minor unit (cents, satang, ...). Two decimal places are assumed.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;
const FRACTION_DIGITS: usize = 2;

//--------------------------------------       Money         ---------------------------------------------------------
/// An amount of money, held as an integer number of minor currency units.
///
/// Floating point never enters the picture: decimal strings are parsed digit by digit, so `"120.50"` is exactly
/// `12050`. Digits beyond the second decimal place are rounded half away from zero.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Money {
    pub fn from_minor(value: i64) -> Self {
        Self(value)
    }

    pub fn from_major(value: i64) -> Self {
        Self(value * MINOR_UNITS_PER_MAJOR)
    }

    /// The amount in minor units.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    /// Parses a plain decimal string such as `"241"`, `"120.5"` or `"-0.05"`.
    pub fn from_decimal_str(s: &str) -> Result<Self, MoneyConversionError> {
        let err = || MoneyConversionError(s.to_string());
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(err());
        }
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(err());
        }
        let whole_value = if whole.is_empty() { 0 } else { whole.parse::<i64>().map_err(|_| err())? };
        let digits = fraction.as_bytes();
        let mut minor = 0i64;
        for i in 0..FRACTION_DIGITS {
            let d = digits.get(i).map(|b| i64::from(b - b'0')).unwrap_or(0);
            minor = minor * 10 + d;
        }
        let round_up = digits.get(FRACTION_DIGITS).map(|b| *b >= b'5').unwrap_or(false);
        if round_up {
            minor += 1;
        }
        // Accumulate with the sign applied so that i64::MIN itself is reachable
        let (sign, whole_value) = if negative { (-1, -whole_value) } else { (1, whole_value) };
        let value = whole_value
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|v| v.checked_add(sign * minor))
            .ok_or_else(err)?;
        Ok(Self(value))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_major, abs % per_major)
    }
}
