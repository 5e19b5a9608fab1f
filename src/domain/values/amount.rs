//! Exact monetary amounts in minor units.
//!
//! One whole unit is 10^18 minor units. Amounts are parsed from decimal
//! strings with integer arithmetic only, so values far outside the range a
//! float can hold exactly still round-trip.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places carried by one minor unit.
pub const DECIMALS: usize = 18;

const UNIT: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_minor_units(units: u128) -> Self {
        Amount(units)
    }

    pub fn minor_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal string such as `"12"`, `"1.5"` or `".25"`.
    ///
    /// The fractional part is right-padded or truncated to exactly 18 digits.
    /// Signs other than a leading `+`, exponents and stray characters are
    /// rejected. Zero is accepted here; use [`Amount::parse_positive`] for
    /// user-entered values.
    pub fn from_decimal(input: &str) -> Result<Self, String> {
        let s = input.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        if s.is_empty() {
            return Err("Amount is empty".into());
        }
        if s.starts_with('-') {
            return Err(format!("Amount must not be negative: {input}"));
        }

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("Amount is not a number: {input}"));
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(format!("Amount is not a number: {input}"));
        }

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| format!("Amount out of range: {input}"))?
        };

        let mut frac: String = frac_part.chars().take(DECIMALS).collect();
        while frac.len() < DECIMALS {
            frac.push('0');
        }
        let frac: u128 = frac
            .parse()
            .map_err(|_| format!("Amount is not a number: {input}"))?;

        whole
            .checked_mul(UNIT)
            .and_then(|w| w.checked_add(frac))
            .map(Amount)
            .ok_or_else(|| format!("Amount out of range: {input}"))
    }

    /// Like [`Amount::from_decimal`] but rejects zero.
    pub fn parse_positive(input: &str) -> Result<Self, String> {
        let amount = Self::from_decimal(input)?;
        if amount.is_zero() {
            return Err(format!("Amount must be greater than zero: {input}"));
        }
        Ok(amount)
    }

    /// Wire encoding expected by wallet providers: `0x`-prefixed lowercase
    /// hex with no leading zeros.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Percentage of `goal` covered by `self`, for display only.
    pub fn percent_of(&self, goal: Amount) -> f64 {
        if goal.is_zero() {
            return 0.0;
        }
        self.0 as f64 / goal.0 as f64 * 100.0
    }

    pub fn sum<'a, I>(amounts: I) -> Option<Amount>
    where
        I: IntoIterator<Item = &'a Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(*a))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:018}");
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::from_decimal(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_decimal(&s).map_err(serde::de::Error::custom)
    }
}
