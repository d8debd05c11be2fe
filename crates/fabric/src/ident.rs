//! Identifier derivation and presence markers.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::error::{Error, Result};

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("digit pattern compiles"));

/// Parse the first run of decimal digits in `s`.
///
/// `"Loopback42"` and `"42"` both yield `42`. A string without digits is an
/// invariant violation: intent validation already checked the reference.
pub fn extract_numeric_id(s: &str) -> Result<u32> {
    let digits = DIGITS
        .find(s)
        .ok_or_else(|| Error::invariant(format!("no numeric id in '{s}'")))?;
    digits
        .as_str()
        .parse()
        .map_err(|e| Error::invariant(format!("numeric id in '{s}' out of range: {e}")))
}

/// Whether `s` contains a numeric id. Used by boundary validation.
#[must_use]
pub fn has_numeric_id(s: &str) -> bool {
    DIGITS.is_match(s)
}

/// Wire representation of a flag leaf that is present without a value.
///
/// The sentinel differs by schema branch; each branch fixes its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `[null]`
    Null,
    /// `[""]`
    Blank,
    /// `[]`
    Empty,
    /// `{}`
    Container,
}

impl Marker {
    /// Serialized form of this marker.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Null => json!([null]),
            Self::Blank => json!([""]),
            Self::Empty => json!([]),
            Self::Container => json!({}),
        }
    }
}

/// Canonical interface name for a loopback id.
#[must_use]
pub fn loopback_name(id: u32) -> String {
    format!("Loopback{id}")
}
