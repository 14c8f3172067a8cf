//! Reference month matching on access keys
//!
//! The issue period lives in chars 3-6 of the key as "AAMM". The century is
//! fixed at 2000, so keys can only ever match years 2000-2099.

use crate::models::{AccessKey, ReferenceMonth};

/// Issue (year, month) encoded in a key
///
/// `None` for anything that is not a 44-digit key or whose month digits fall
/// outside 01-12.
pub fn key_period(key: &str) -> Option<(i32, u32)> {
    let key = AccessKey::parse(key).ok()?;
    let (year, month) = key.year_month();
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Whether `key` was issued in `month`
///
/// Never fails: malformed keys simply do not match.
pub fn key_matches_month(key: &str, month: ReferenceMonth) -> bool {
    key_period(key)
        .map(|(year, m)| year == month.year() && m == month.month())
        .unwrap_or(false)
}
