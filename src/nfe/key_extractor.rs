//! Access key extraction from raw document text

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{NfeError, NfeResult};

/// `<infNFe Id="NFe…">`, the attribute on its element
fn strict_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<infNFe\s+Id="NFe([0-9]{44})""#).expect("strict key pattern is valid")
    })
}

/// `Id="NFe…"` anywhere in the document
fn loose_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"Id="NFe([0-9]{44})""#).expect("loose key pattern is valid")
    })
}

/// Find the access key in document text
///
/// Tries the `infNFe` element form first, then any `Id="NFe…"` attribute.
/// Returns `None` when neither is present.
pub fn extract_access_key_from_text(text: &str) -> Option<String> {
    strict_pattern()
        .captures(text)
        .or_else(|| loose_pattern().captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read a document and find its access key
///
/// # Errors
///
/// Returns `NfeError::Extraction` when the file cannot be read or is not
/// valid UTF-8. A readable document without a key is `Ok(None)`.
pub fn extract_access_key(path: &Path) -> NfeResult<Option<String>> {
    let bytes = std::fs::read(path).map_err(|e| NfeError::extraction(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| NfeError::extraction(path, e))?;
    Ok(extract_access_key_from_text(&text))
}
