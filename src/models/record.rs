//! Row data model for sheet-backed datasets.
//!
//! The remote endpoint returns each sheet as a JSON array of flat objects
//! with arbitrary column names. Rather than a typed struct per sheet, a row
//! is an ordered list of `(header, value)` pairs so the dashboard can render
//! whatever columns the spreadsheet happens to have.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// True if a cell value should be rendered as a hyperlink.
/// This is the single place that decides link-ness for every renderer.
pub fn is_link(value: &str) -> bool {
    value.starts_with("http")
}

/// A scalar cell value, tagged once at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Link(String),
    Number(f64),
}

impl FieldValue {
    /// The value as text, if it is textual (links count).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Link(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Link(s) => f.write_str(s),
            FieldValue::Number(n) => {
                // Sheets report whole numbers as e.g. 5.0; show them as "5"
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) | FieldValue::Link(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(value))
    }
}

impl FieldValue {
    /// Classify a raw JSON scalar. Non-scalar values are stringified so a
    /// malformed cell degrades to text instead of failing the whole sheet.
    fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => {
                if is_link(&s) {
                    FieldValue::Link(s)
                } else {
                    FieldValue::Text(s)
                }
            }
            serde_json::Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::Bool(b) => FieldValue::Text(b.to_string()),
            serde_json::Value::Null => FieldValue::Text(String::new()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

/// One row of sheet data: field name -> value, in source column order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Callers supply unique field names; deserialization guarantees this
    /// by collapsing duplicate keys to their last occurrence.
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    /// Fields in the order the source supplied them.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Convenience accessor for textual fields (returns None for numbers).
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }
}

/// Structural equality, insensitive to field order. Serialization round-trips
/// may reorder keys; two rows with the same fields are still the same row.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(field, value)| other.get(field) == Some(value))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a flat JSON object of sheet cells")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
                let mut fields: Vec<(String, FieldValue)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((field, value)) = map.next_entry::<String, FieldValue>()? {
                    // Duplicate keys in the source collapse to the last
                    // occurrence, so field names are unique per record
                    match fields.iter_mut().find(|(f, _)| *f == field) {
                        Some(slot) => slot.1 = value,
                        None => fields.push((field, value)),
                    }
                }
                Ok(Record::new(fields))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

// ============================================================================
// Tests
// ============================================================================
