//! Reference month representation
//!
//! A run always targets one calendar month. In production that is the month
//! before the current one, but every consumer takes an explicit value.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "JANEIRO",
    "FEVEREIRO",
    "MARÇO",
    "ABRIL",
    "MAIO",
    "JUNHO",
    "JULHO",
    "AGOSTO",
    "SETEMBRO",
    "OUTUBRO",
    "NOVEMBRO",
    "DEZEMBRO",
];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

/// A (year, month) pair targeted by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceMonth {
    year: i32,
    month: u32,
}

impl ReferenceMonth {
    /// Create a reference month, validating the month number
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The calendar month immediately preceding the month of `date`
    pub fn preceding(date: NaiveDate) -> Self {
        if date.month() == 1 {
            Self {
                year: date.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: date.year(),
                month: date.month() - 1,
            }
        }
    }

    /// The month before today (local time)
    pub fn previous() -> Self {
        Self::preceding(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Full pt-BR month name in upper case, e.g. "JANEIRO"
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// Abbreviated pt-BR month name, e.g. "JAN"
    pub fn month_abbreviation(&self) -> &'static str {
        MONTH_ABBREVIATIONS[(self.month - 1) as usize]
    }

    /// Local destination folder name, e.g. "2024-01_JANEIRO"
    pub fn folder_name(&self) -> String {
        format!("{:04}-{:02}_{}", self.year, self.month, self.month_name())
    }

    /// Archive file name, e.g. "NFEs_JAN_2024.zip"
    pub fn archive_file_name(&self) -> String {
        format!("NFEs_{}_{:04}.zip", self.month_abbreviation(), self.year)
    }

    /// Report file name, e.g. "Resumo_Detalhado_NFEs_2024-01_JANEIRO.csv"
    pub fn report_file_name(&self) -> String {
        format!("Resumo_Detalhado_NFEs_{}.csv", self.folder_name())
    }

    /// Parse a month string in "YYYY-MM" format
    pub fn parse(s: &str) -> Result<Self, MonthParseError> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| MonthParseError::InvalidFormat(s.to_string()))?;

        let year: i32 = year
            .parse()
            .map_err(|_| MonthParseError::InvalidFormat(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthParseError::InvalidFormat(s.to_string()))?;

        Self::new(year, month)
    }
}

impl fmt::Display for ReferenceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl TryFrom<String> for ReferenceMonth {
    type Error = MonthParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ReferenceMonth> for String {
    fn from(month: ReferenceMonth) -> Self {
        format!("{:04}-{:02}", month.year, month.month)
    }
}

/// Error type for reference month parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthParseError {
    InvalidFormat(String),
    InvalidMonth(u32),
}

impl fmt::Display for MonthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthParseError::InvalidFormat(s) => {
                write!(f, "Invalid month format (expected YYYY-MM): {}", s)
            }
            MonthParseError::InvalidMonth(m) => write!(f, "Invalid month: {}", m),
        }
    }
}

impl std::error::Error for MonthParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preceding_month() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(
            ReferenceMonth::preceding(date),
            ReferenceMonth::new(2024, 1).unwrap()
        );
    }

    #[test]
    fn test_preceding_wraps_year() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            ReferenceMonth::preceding(date),
            ReferenceMonth::new(2024, 12).unwrap()
        );
    }

    #[test]
    fn test_parse() {
        let month = ReferenceMonth::parse("2024-03").unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 3);
        assert!(matches!(
            ReferenceMonth::parse("2024-13"),
            Err(MonthParseError::InvalidMonth(13))
        ));
        assert!(ReferenceMonth::parse("march").is_err());
    }

    #[test]
    fn test_names() {
        let month = ReferenceMonth::new(2024, 3).unwrap();
        assert_eq!(month.to_string(), "03/2024");
        assert_eq!(month.folder_name(), "2024-03_MARÇO");
        assert_eq!(month.archive_file_name(), "NFEs_MAR_2024.zip");
        assert_eq!(
            month.report_file_name(),
            "Resumo_Detalhado_NFEs_2024-03_MARÇO.csv"
        );
    }

    #[test]
    fn test_serde_uses_validated_text_form() {
        let month = ReferenceMonth::new(2024, 3).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2024-03\"");
        assert_eq!(serde_json::from_str::<ReferenceMonth>(&json).unwrap(), month);

        assert!(serde_json::from_str::<ReferenceMonth>("\"2024-00\"").is_err());
        assert!(serde_json::from_str::<ReferenceMonth>(r#"{"year":2024,"month":0}"#).is_err());
    }
}
