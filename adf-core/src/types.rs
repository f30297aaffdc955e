//! Shared types, error enum, and the decoded record model for adf-core.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// All errors produced by adf-core.
#[derive(Debug, Error)]
pub enum AdfError {
    #[error("non-ASCII byte at offset {offset}")]
    Encoding { offset: usize },
    #[error("invalid {field} value: {value:?}")]
    Format { field: &'static str, value: String },
    #[error("sentence too short: needs {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("unknown sentence format: {}", escape_bytes(.0))]
    Unclassified(Vec<u8>),
    #[error("input ended mid-frame ({buffered} bytes buffered)")]
    FramingIncomplete { buffered: usize },
    #[error("no end marker in {discarded} bytes")]
    NoEndMarker { discarded: usize },
    #[error("cancelled")]
    Cancelled,
    #[error("input is empty")]
    EmptyInput,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AdfError>;

// ---------------------------------------------------------------------------
// Control bytes
// ---------------------------------------------------------------------------

/// Start-of-message marker.
pub const STX: u8 = 0x02;
/// End-of-message marker. Also a legal value inside Type 2 binary fields.
pub const ETX: u8 = 0x03;
pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Render a float the way the unit's companion tooling always has:
/// shortest round-trip digits, with a trailing `.0` on integral values.
/// Magnitudes outside [1e-4, 1e16) use exponent form, e.g. `1e-05`.
pub fn format_decimal(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_finite() && magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return format_exponent(value);
    }
    let s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}

/// `1.5e16` becomes `1.5e+16`: signed exponent, at least two digits.
fn format_exponent(value: f64) -> String {
    let s = format!("{value:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

/// Printable form of raw sentence bytes for diagnostics (`\x03`-style escapes).
pub fn escape_bytes(raw: &[u8]) -> String {
    raw.iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Decoded records
// ---------------------------------------------------------------------------

/// Which decoder produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentenceType {
    #[serde(rename = "Type 1")]
    Type1,
    #[serde(rename = "Type 2")]
    Type2,
}

impl fmt::Display for SentenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentenceType::Type1 => write!(f, "Type 1"),
            SentenceType::Type2 => write!(f, "Type 2"),
        }
    }
}

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => f.write_str(&format_decimal(*v)),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Ordered field-name → value mapping produced from one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub kind: SentenceType,
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl DecodedRecord {
    pub fn new(kind: SentenceType) -> Self {
        DecodedRecord {
            kind,
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &'static str, value: FieldValue) {
        self.fields.push((name, value));
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(n, _)| *n)
    }
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (name, value) in &self.fields {
            write!(f, " | {name}: {value}")?;
        }
        Ok(())
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("Type", &self.kind)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A sentence that was skipped, with the reason.
#[derive(Debug)]
pub struct Diagnostic {
    pub raw: Vec<u8>,
    pub error: AdfError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            // Already carries the bytes
            AdfError::Unclassified(_) => write!(f, "{}", self.error),
            e => write!(f, "skipping '{}': {e}", escape_bytes(&self.raw)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
