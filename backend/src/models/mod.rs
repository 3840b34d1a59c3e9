//! Domain models for the cleaning pipeline.
//!
//! - [`RawRecord`] - one row exactly as read from the source
//! - [`Record`] - one normalized row, immutable once built
//! - [`CanonicalKey`] - order-independent content signature of a [`Record`]
//! - [`RejectReason`] - why a row was dropped by the normalizer

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

// =============================================================================
// Raw Record
// =============================================================================

/// A row as read from the source, before any cleaning.
///
/// Field order is the header order. A `None` value marks a field the row
/// did not reach (short row).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Order of calls is the field order.
    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.fields.push((name.into(), value));
    }

    /// Builder-style [`RawRecord::push`].
    pub fn with(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.push(name, value.map(String::from));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    /// Collect present values; every field gets `Some`.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}

// =============================================================================
// Record
// =============================================================================

/// A normalized row: trimmed names, trimmed non-empty values, unique names.
///
/// Only the normalizer constructs records, so every `Record` in circulation
/// already satisfies the missing-value policy. There is no mutating API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub(crate) fn from_normalized(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value of a field, if the record has it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Content signature used for duplicate detection.
    pub fn canonical_key(&self) -> CanonicalKey {
        CanonicalKey::of(self)
    }

    /// The same row seen as raw input; feeding it back to the normalizer
    /// yields an equal record.
    pub fn to_raw(&self) -> RawRecord {
        self.fields
            .iter()
            .map(|(n, v)| (n.clone(), v.clone()))
            .collect()
    }
}

/// Serialized as a JSON object in field order.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Canonical Key
// =============================================================================

/// Field/value pairs of a [`Record`] sorted by field name.
///
/// Two records with the same pairs in a different field order produce
/// equal keys. Never emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(Vec<(String, String)>);

impl CanonicalKey {
    pub fn of(record: &Record) -> Self {
        let mut pairs = record.fields.clone();
        // names are unique within a record, so this is a total order on pairs
        pairs.sort_unstable();
        Self(pairs)
    }
}

// =============================================================================
// Reject Reason
// =============================================================================

/// Why the normalizer dropped a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// No field carries a non-blank value.
    EmptyRow,
    /// At least one field is blank after trimming; names the first one.
    MissingRequiredField { field: String },
}

impl RejectReason {
    /// Stable code used in stats and logs.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::EmptyRow => "EMPTY_ROW",
            RejectReason::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyRow => f.write_str(self.code()),
            RejectReason::MissingRequiredField { field } => {
                write!(f, "{} ({})", self.code(), field)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record::from_normalized(
            pairs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_canonical_key_ignores_field_order() {
        let a = record(&[("a", "1"), ("b", "2")]);
        let b = record(&[("b", "2"), ("a", "1")]);
        assert_ne!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_canonical_key_differs_on_value() {
        let a = record(&[("a", "1"), ("b", "2")]);
        let b = record(&[("a", "1"), ("b", "3")]);
        assert_ne!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_record_serializes_in_field_order() {
        let r = record(&[("zeta", "1"), ("alpha", "2")]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"zeta":"1","alpha":"2"}"#);
    }

    #[test]
    fn test_to_raw_keeps_order_and_values() {
        let r = record(&[("name", "Carl"), ("age", "40")]);
        let raw = r.to_raw();
        let pairs: Vec<_> = raw.iter().collect();
        assert_eq!(pairs, vec![("name", Some("Carl")), ("age", Some("40"))]);
    }

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(RejectReason::EmptyRow.to_string(), "EMPTY_ROW");
        let missing = RejectReason::MissingRequiredField { field: "age".into() };
        assert_eq!(missing.to_string(), "MISSING_REQUIRED_FIELD (age)");
        assert_eq!(missing.code(), "MISSING_REQUIRED_FIELD");
    }
}
