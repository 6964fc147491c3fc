// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON record to [`Point`] mapping.
//!
//! Selected members of a JSON object become tags (always strings) or typed
//! fields, based on configured member paths.

use crate::point::{FieldValue, Point, Tag};
use serde_json::Value;
use std::time::SystemTime;

/// Builds points for one measurement from JSON records.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    measurement: String,
    /// Paths extracted as tags.
    tag_paths: Vec<String>,
    /// Paths extracted as fields.
    field_paths: Vec<String>,
}

impl FieldMapper {
    pub fn new(measurement: impl Into<String>, tags: Vec<String>, fields: Vec<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tag_paths: tags,
            field_paths: fields,
        }
    }

    /// Map a JSON record to a point.
    ///
    /// - Tags are extracted as strings and sorted by key.
    /// - Fields keep their JSON type: integers become `Integer` (or `UInteger`
    ///   above `i64::MAX`), other numbers `Float`.
    /// - Missing, null, array and object members are skipped.
    ///
    /// Supports nested members using dot notation (e.g., `"location.lat"`).
    /// The returned point has no fields if none of the field paths resolved;
    /// encoding it then fails with [`crate::Error::NoFields`].
    pub fn map_record(&self, record: &Value, time: Option<SystemTime>) -> Point {
        let mut point = Point::new(self.measurement.clone());
        point.time = time;

        for path in &self.tag_paths {
            if let Some(s) = resolve(record, path).and_then(to_tag_value) {
                point.tags.push(Tag::new(path.clone(), s));
            }
        }
        point.tags.sort();

        for path in &self.field_paths {
            if let Some(value) = resolve(record, path).and_then(to_field_value) {
                point.fields.insert(path.clone(), value);
            }
        }

        point
    }
}

/// Resolve a potentially dot-separated member path.
///
/// For example, `"location.lat"` resolves `json["location"]["lat"]`.
fn resolve<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(json, |current, part| current.get(part))
}

fn to_tag_value(val: &Value) -> Option<String> {
    match val {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Empty strings, nulls, arrays and objects are not valid tag values
        _ => None,
    }
}

fn to_field_value(val: &Value) -> Option<FieldValue> {
    match val {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Integer(i))
            } else if let Some(u) = n.as_u64() {
                Some(FieldValue::UInteger(u))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        Value::String(s) => Some(FieldValue::String(s.clone())),
        Value::Bool(b) => Some(FieldValue::Boolean(*b)),
        _ => None,
    }
}
