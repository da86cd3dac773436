//! Raw record to store-ready document.
//!
//! Field handling is table-driven: each source column name maps to a
//! [`FieldRule`], everything else passes through. Latitude/longitude columns
//! additionally produce a synthesized geo point.

use chrono::{NaiveDateTime, Timelike};
use std::collections::HashMap;

use crate::config::TransformSettings;
use crate::error::{Error, Result};
use crate::types::{Document, FieldValue, GeoPoint, RawRecord};

/// Input format for date columns, e.g. `2017-11-11 17:00:00`.
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Output format; milliseconds are always zero and the zone is always UTC.
pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Passthrough,
    Date,
}

#[derive(Debug, Clone)]
struct GeoSource {
    latitude: String,
    longitude: String,
    target: String,
}

#[derive(Debug, Clone)]
pub struct RecordTransformer {
    rules: HashMap<String, FieldRule>,
    geo: GeoSource,
}

impl Default for RecordTransformer {
    fn default() -> Self { Self::from_settings(&TransformSettings::default()) }
}

impl RecordTransformer {
    pub fn new() -> Self { Self::default() }

    pub fn from_settings(settings: &TransformSettings) -> Self {
        let rules = settings.date_fields.iter().map(|f| (f.clone(), FieldRule::Date)).collect();
        let geo = GeoSource {
            latitude: settings.latitude_field.clone(),
            longitude: settings.longitude_field.clone(),
            target: settings.geo_field.clone(),
        };
        Self { rules, geo }
    }

    pub fn rule_for(&self, field: &str) -> FieldRule {
        self.rules.get(field).copied().unwrap_or(FieldRule::Passthrough)
    }

    /// Transform one record. Fails as a whole on the first malformed date.
    pub fn transform(&self, raw: &RawRecord) -> Result<Document> {
        let mut doc = Document::new();

        if let (Some(lat), Some(lon)) = (raw.get(&self.geo.latitude), raw.get(&self.geo.longitude)) {
            doc.insert(self.geo.target.clone(), FieldValue::Geo(GeoPoint { lat: lat.to_string(), lon: lon.to_string() }));
        }

        for (name, value) in raw.iter() {
            let converted = match self.rule_for(name) {
                FieldRule::Passthrough => FieldValue::Text(value.to_string()),
                FieldRule::Date => convert_date(value).map_err(|_| Error::MalformedDate {
                    field: name.to_string(),
                    value: value.to_string(),
                    record: raw.to_string(),
                })?,
            };
            doc.insert(sanitize_field_name(name), converted);
        }

        Ok(doc)
    }
}

/// Lowercase and replace spaces with underscores.
pub fn sanitize_field_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Empty input becomes `Null`; anything else must match [`DATE_INPUT_FORMAT`]
/// with seconds in `0..=59`.
pub fn convert_date(value: &str) -> std::result::Result<FieldValue, String> {
    if value.is_empty() {
        return Ok(FieldValue::Null);
    }
    let ts = NaiveDateTime::parse_from_str(value, DATE_INPUT_FORMAT).map_err(|e| e.to_string())?;
    // chrono encodes a `:60` leap second as nanosecond >= 1e9
    if ts.nanosecond() >= 1_000_000_000 {
        return Err("second must be in 0..=59".to_string());
    }
    Ok(FieldValue::Timestamp(ts.format(DATE_OUTPUT_FORMAT).to_string()))
}
