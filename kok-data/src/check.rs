//! Check indices: the ordinal of a sampling occasion.
//!
//! Labels are stored as free text, normally `"ครั้งที่ N"` ("check N").
//! A label that carries a recognised separator followed by an integer becomes
//! an [`CheckIndex::Ordinal`]; anything else is kept verbatim as a
//! [`CheckIndex::Label`]. The derived ordering puts every ordinal (ascending)
//! before every label (lexicographic), which is exactly the column order of a
//! pivot table.

use serde::{Serialize, Serializer};
use std::fmt;

/// The separator written into stored labels.
pub const CHECK_SEPARATOR: &str = "ครั้งที่";

/// Every separator [`parse_check_label`] recognises.
pub const CHECK_SEPARATORS: &[&str] = &[CHECK_SEPARATOR, "check"];

/// Parsed form of a check label.
///
/// Variant order matters: `Ordinal < Label` for all values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckIndex {
    Ordinal(i64),
    Label(String),
}

impl CheckIndex {
    pub fn as_ordinal(&self) -> Option<i64> {
        match self {
            CheckIndex::Ordinal(n) => Some(*n),
            CheckIndex::Label(_) => None,
        }
    }
}

impl fmt::Display for CheckIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckIndex::Ordinal(n) => write!(f, "{}", n),
            CheckIndex::Label(s) => write!(f, "{}", s),
        }
    }
}

/// Ordinals serialize as numbers and labels as strings, so `Ordinal(7)`
/// and `Label("7")` stay distinct in JSON.
impl Serialize for CheckIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CheckIndex::Ordinal(n) => serializer.serialize_i64(*n),
            CheckIndex::Label(s) => serializer.serialize_str(s),
        }
    }
}

/// Map Thai digits (U+0E50..U+0E59) to their ASCII counterparts.
fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0E50}'..='\u{0E59}' => char::from(b'0' + (c as u32 - 0x0E50) as u8),
            other => other,
        })
        .collect()
}

/// Parse a check label into a [`CheckIndex`].
///
/// The text after the last occurrence of a recognised separator is trimmed
/// and parsed as an integer, Thai digits included. A label without a separator, or whose trailing
/// portion is not an integer, falls back to the whole trimmed label.
pub fn parse_check_label(label: &str) -> CheckIndex {
    let label = label.trim();
    for separator in CHECK_SEPARATORS {
        if let Some(pos) = label.rfind(separator) {
            let tail = ascii_digits(label[pos + separator.len()..].trim());
            if let Ok(n) = tail.parse::<i64>() {
                return CheckIndex::Ordinal(n);
            }
        }
    }
    CheckIndex::Label(label.to_string())
}

/// Label written for check `n` when records are created from a form.
pub fn format_check_label(n: usize) -> String {
    format!("{} {}", CHECK_SEPARATOR, n)
}

/// Sort distinct check indices: ordinals ascending, then labels ascending.
pub fn sort_check_indices(indices: &mut [CheckIndex]) {
    indices.sort();
}
