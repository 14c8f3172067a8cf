//! NFe access key
//!
//! A 44-digit identifier laid out as:
//!
//! | chars  | content                 |
//! |--------|-------------------------|
//! | 1-2    | issuer state (cUF)      |
//! | 3-6    | issue year/month (AAMM) |
//! | 7-20   | issuer CNPJ             |
//! | 21-43  | model, series, number…  |
//! | 44     | mod-11 check digit      |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of every access key
pub const ACCESS_KEY_LEN: usize = 44;

/// A validated 44-digit access key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessKey(String);

impl AccessKey {
    /// Parse a key, requiring exactly 44 ASCII digits
    pub fn parse(s: &str) -> Result<Self, AccessKeyError> {
        if s.len() != ACCESS_KEY_LEN {
            return Err(AccessKeyError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccessKeyError::NonNumeric(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The "AAMM" issue period digits (chars 3-6)
    pub fn yymm(&self) -> &str {
        &self.0[2..6]
    }

    /// Issue (year, month), assuming the 2000s century
    pub fn year_month(&self) -> (i32, u32) {
        let digits = self.0.as_bytes();
        let year = 2000 + i32::from(digits[2] - b'0') * 10 + i32::from(digits[3] - b'0');
        let month = u32::from(digits[4] - b'0') * 10 + u32::from(digits[5] - b'0');
        (year, month)
    }

    /// The declared check digit (char 44)
    pub fn check_digit(&self) -> u32 {
        u32::from(self.0.as_bytes()[ACCESS_KEY_LEN - 1] - b'0')
    }

    /// Check digit computed from the first 43 digits
    ///
    /// Weights 2..=9 are applied cyclically from the rightmost digit; a
    /// remainder of 0 or 1 yields digit 0, otherwise 11 - remainder.
    pub fn expected_check_digit(&self) -> u32 {
        let sum: u32 = self.0.as_bytes()[..ACCESS_KEY_LEN - 1]
            .iter()
            .rev()
            .enumerate()
            .map(|(i, b)| u32::from(b - b'0') * (2 + (i as u32 % 8)))
            .sum();
        match sum % 11 {
            0 | 1 => 0,
            r => 11 - r,
        }
    }

    pub fn has_valid_check_digit(&self) -> bool {
        self.check_digit() == self.expected_check_digit()
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccessKey {
    type Error = AccessKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccessKey> for String {
    fn from(key: AccessKey) -> Self {
        key.0
    }
}

/// Error type for access key parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessKeyError {
    InvalidLength(usize),
    NonNumeric(String),
}

impl fmt::Display for AccessKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKeyError::InvalidLength(n) => {
                write!(f, "Access key must have {} digits, got {}", ACCESS_KEY_LEN, n)
            }
            AccessKeyError::NonNumeric(s) => write!(f, "Access key is not numeric: {}", s),
        }
    }
}

impl std::error::Error for AccessKeyError {}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "35240112345678000199550010000012341123456780";

    #[test]
    fn test_parse_valid() {
        let key = AccessKey::parse(KEY).unwrap();
        assert_eq!(key.as_str(), KEY);
        assert_eq!(key.yymm(), "2401");
        assert_eq!(key.year_month(), (2024, 1));
    }

    #[test]
    fn test_parse_rejects_length() {
        assert_eq!(
            AccessKey::parse("3524"),
            Err(AccessKeyError::InvalidLength(4))
        );
        assert!(AccessKey::parse(&format!("{}0", KEY)).is_err());
    }

    #[test]
    fn test_parse_rejects_letters() {
        let bad = format!("{}X", &KEY[..43]);
        assert!(matches!(
            AccessKey::parse(&bad),
            Err(AccessKeyError::NonNumeric(_))
        ));
    }

    #[test]
    fn test_check_digit() {
        let base = &KEY[..43];
        let probe = AccessKey::parse(&format!("{}0", base)).unwrap();
        let expected = probe.expected_check_digit();

        let valid = AccessKey::parse(&format!("{}{}", base, expected)).unwrap();
        assert!(valid.has_valid_check_digit());

        let wrong = (expected + 1) % 10;
        let invalid = AccessKey::parse(&format!("{}{}", base, wrong)).unwrap();
        assert!(!invalid.has_valid_check_digit());
    }

    #[test]
    fn test_check_digit_known_key() {
        // Weighted sum of 43 ones is 229; 229 % 11 == 9, so the digit is 2
        let key = AccessKey::parse(&format!("{}2", "1".repeat(43))).unwrap();
        assert_eq!(key.expected_check_digit(), 2);
        assert!(key.has_valid_check_digit());
    }

    #[test]
    fn test_serde_round_trip() {
        let key = AccessKey::parse(KEY).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", KEY));
        let back: AccessKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<AccessKey>("\"123\"").is_err());
    }
}
