// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire protocols and the InfluxDB Line Protocol v1 encoder.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/>

use crate::error::{Error, Result};
use crate::point::{unix_nanos, FieldValue, Point};
use std::fmt;
use std::sync::Arc;

/// Comparable identity of a wire format.
///
/// Two protocols with equal ids produce byte-identical output, so bytes
/// encoded under one can be sent as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolId {
    name: &'static str,
    version: u16,
}

impl ProtocolId {
    pub const fn new(name: &'static str, version: u16) -> Self {
        Self { name, version }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> u16 {
        self.version
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/v{}", self.name, self.version)
    }
}

/// An encoding strategy turning points into bytes.
pub trait Protocol: fmt::Debug + Send + Sync {
    /// Identity used for compatibility checks.
    fn id(&self) -> ProtocolId;

    /// Value for the `Content-Type` header of transports that send this format.
    fn content_type(&self) -> &'static str;

    /// Append the encoding of `point` to `out`.
    ///
    /// Implementations must validate the point before writing, so that `out`
    /// is left untouched on error.
    fn encode(&self, out: &mut Vec<u8>, point: &Point) -> Result<()>;
}

/// InfluxDB Line Protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineProtocol {
    /// The 1.x text format with nanosecond timestamps.
    V1,
}

impl LineProtocol {
    /// Shared handle suitable for [`crate::Sink::protocol`].
    pub fn shared(self) -> Arc<dyn Protocol> {
        Arc::new(self)
    }
}

impl Protocol for LineProtocol {
    fn id(&self) -> ProtocolId {
        match self {
            LineProtocol::V1 => ProtocolId::new("line", 1),
        }
    }

    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn encode(&self, out: &mut Vec<u8>, point: &Point) -> Result<()> {
        validate(point)?;

        escape_into(out, &point.name);

        for tag in &point.tags {
            out.push(b',');
            escape_into(out, &tag.key);
            out.push(b'=');
            escape_into(out, &tag.value);
        }

        out.push(b' ');

        for (i, (key, value)) in point.fields.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            escape_into(out, key);
            out.push(b'=');
            write_field_value(out, value);
        }

        if let Some(time) = point.time {
            out.push(b' ');
            out.extend_from_slice(unix_nanos(time).to_string().as_bytes());
        }

        out.push(b'\n');
        Ok(())
    }
}

/// Reject points that cannot be encoded, before anything is written.
fn validate(point: &Point) -> Result<()> {
    if point.name.is_empty() {
        return Err(Error::NoMeasurement);
    }
    if point.fields.is_empty() {
        return Err(Error::NoFields);
    }
    check_key(&point.name, "measurement name")?;
    for tag in &point.tags {
        check_key(&tag.key, "tag key")?;
        check_key(&tag.value, "tag value")?;
    }
    for (key, value) in &point.fields {
        check_key(key, "field key")?;
        if let FieldValue::Float(v) = value {
            if !v.is_finite() {
                return Err(Error::InvalidFloat { field: key.clone() });
            }
        }
    }
    Ok(())
}

/// Names, tag keys, tag values and field keys must be non-empty and on one line.
///
/// Line Protocol has no escape for a line break outside string field values.
fn check_key(s: &str, part: &'static str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::EmptyKey { part });
    }
    if s.contains(['\n', '\r']) {
        return Err(Error::LineBreak { part });
    }
    Ok(())
}

/// Escape commas, equals signs and spaces with a backslash.
///
/// Used for measurement names, tag keys, tag values and field keys.
fn escape_into(out: &mut Vec<u8>, s: &str) {
    for b in s.bytes() {
        if matches!(b, b',' | b'=' | b' ') {
            out.push(b'\\');
        }
        out.push(b);
    }
}

/// Format a field value.
///
/// - Float: shortest round-trip decimal (e.g., `2`, `3.15`)
/// - Integer: suffixed with `i` (e.g., `42i`)
/// - UInteger: suffixed with `u` (e.g., `42u`)
/// - String: double-quoted, inner quotes and backslashes escaped
/// - Boolean: `true` or `false`
fn write_field_value(out: &mut Vec<u8>, value: &FieldValue) {
    match value {
        FieldValue::Float(v) => out.extend_from_slice(v.to_string().as_bytes()),
        FieldValue::Integer(v) => {
            out.extend_from_slice(v.to_string().as_bytes());
            out.push(b'i');
        }
        FieldValue::UInteger(v) => {
            out.extend_from_slice(v.to_string().as_bytes());
            out.push(b'u');
        }
        FieldValue::String(v) => {
            out.push(b'"');
            for b in v.bytes() {
                if b == b'"' || b == b'\\' {
                    out.push(b'\\');
                }
                out.push(b);
            }
            out.push(b'"');
        }
        FieldValue::Boolean(true) => out.extend_from_slice(b"true"),
        FieldValue::Boolean(false) => out.extend_from_slice(b"false"),
    }
}
