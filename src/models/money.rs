//! Money type for invoice amounts
//!
//! Internally stores amounts in centavos (i64) so that summing invoice totals
//! never accumulates floating-point error. Parses the decimal text found in
//! fiscal documents and formats with the Brazilian comma separator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Represents a monetary amount stored as centavos
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from centavos
    ///
    /// # Examples
    /// ```
    /// use nfe_backup::models::Money;
    /// let amount = Money::from_cents(1050); // R$ 10,50
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in centavos
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole reais portion (truncated toward zero)
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Get the centavos portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Check if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if the amount is negative
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse an amount as written in a fiscal document
    ///
    /// Accepts formats: "10.50", "10,50", "-10.50", "R$ 10.50", "10", "10.5".
    /// Digits beyond the second decimal place are truncated.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();

        let (negative, s) = if let Some(stripped) = s.strip_prefix('-') {
            (true, stripped)
        } else {
            (false, s)
        };

        let s = s.strip_prefix("R$").unwrap_or(s).trim();

        if s.contains('.') && s.contains(',') {
            return Err(MoneyParseError::InvalidFormat(s.to_string()));
        }
        let normalized = s.replace(',', ".");

        let invalid = || MoneyParseError::InvalidFormat(s.to_string());

        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };
        if whole.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let reais = parse_digits(whole).ok_or_else(invalid)?;
        let cents = match fraction.len() {
            0 => 0,
            1 => parse_digits(fraction).ok_or_else(invalid)? * 10,
            _ => parse_digits(&fraction[..2]).ok_or_else(invalid)?,
        };

        let cents = reais
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Format as plain decimal with a comma separator, e.g. "1234,56"
    pub fn to_decimal_comma(&self) -> String {
        if self.is_negative() {
            format!("-{},{:02}", self.reais().abs(), self.cents_part())
        } else {
            format!("{},{:02}", self.reais(), self.cents_part())
        }
    }
}

/// Parse a run of ASCII digits; rejects signs and empty input
fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl Money {
    /// Add, returning `None` on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-R$ {},{:02}", self.reais().abs(), self.cents_part())
        } else {
            write!(f, "R$ {},{:02}", self.reais(), self.cents_part())
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}
