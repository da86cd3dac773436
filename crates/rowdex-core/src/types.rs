//! Domain types shared by the transformer, the indexer and the stores.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One row from the record source, in header order.
///
/// Values are raw strings; an absent cell is represented as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self { Self { fields } }

    /// Last value for `name`; a repeated header shadows earlier ones.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().rev().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Renders the record as a JSON object, for diagnostics.
impl fmt::Display for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        write!(f, "{}", serde_json::Value::Object(map))
    }
}

/// Latitude/longitude pair, kept verbatim. The store coerces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoPoint {
    pub lat: String,
    pub lon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    /// ISO-8601 UTC with millisecond precision, e.g. `2017-11-11T17:00:00.000Z`.
    Timestamp(String),
    Geo(GeoPoint),
    Null,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Timestamp(s) => Some(s),
            FieldValue::Geo(_) | FieldValue::Null => None,
        }
    }

}

/// A store-ready document: sanitized field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, FieldValue>);

impl Document {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> { self.0.get(key) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string(self) }
}

/// Result of one bulk write. `succeeded + failed` equals the batch length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkOutcome {
    pub fn new(succeeded: usize, failed: usize) -> Self { Self { succeeded, failed } }

    pub fn all_failed(batch_len: usize) -> Self { Self { succeeded: 0, failed: batch_len } }

    pub fn total(&self) -> usize { self.succeeded + self.failed }
}
