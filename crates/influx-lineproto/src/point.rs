// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Point data model: measurement name, tags, typed fields and timestamp.

use crate::error::Result;
use crate::protocol::Protocol;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Anything that can be turned into encoded bytes under a [`Protocol`].
///
/// Implemented by a single [`Point`], by point slices (batch semantics) and by
/// already-encoded buffers, which hand out a borrowed view instead of copying.
pub trait PointEncoder {
    /// Encode `self` under `protocol`.
    fn encode(&self, protocol: &dyn Protocol) -> Result<Cow<'_, [u8]>>;
}

/// A key/value pair of strings that is indexed by the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of tags.
///
/// Tags should be sorted by key and contain unique keys before encoding; the
/// encoder writes them in the order given. Call [`Tags::sort`] when the input
/// order is not already canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    /// Sort by key. The sort is stable, so duplicate keys keep their relative order.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// Check whether the tags are in canonical (key-ascending) order.
    pub fn is_sorted(&self) -> bool {
        self.0.windows(2).all(|w| w[0].key <= w[1].key)
    }

    pub fn into_inner(self) -> Vec<Tag> {
        self.0
    }
}

impl Deref for Tags {
    type Target = [Tag];

    fn deref(&self) -> &[Tag] {
        &self.0
    }
}

impl From<Vec<Tag>> for Tags {
    fn from(tags: Vec<Tag>) -> Self {
        Self(tags)
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Renders `key=value` pairs joined by commas, without escaping.
impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", tag.key, tag.value)?;
        }
        Ok(())
    }
}

/// A value that can be stored in a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit unsigned integer. Requires server-side support.
    UInteger(u64),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInteger(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

/// Field set of a point. Iterates in ascending key order.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single measurement sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Measurement name.
    pub name: String,
    /// Tags, written in the order given.
    pub tags: Tags,
    /// Fields; at least one is required to encode.
    pub fields: Fields,
    /// `None` lets the receiver assign its own timestamp.
    pub time: Option<SystemTime>,
}

impl Point {
    /// Create a point with no tags, fields or timestamp.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Tags::new(),
            fields: Fields::new(),
            time: None,
        }
    }

    /// Append a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Insert a field, replacing any previous value under the same key.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set the timestamp.
    pub fn timestamp(mut self, time: SystemTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Set the timestamp from nanoseconds since the Unix epoch.
    pub fn timestamp_nanos(mut self, nanos: i64) -> Self {
        let offset = Duration::from_nanos(nanos.unsigned_abs());
        self.time = Some(if nanos >= 0 {
            UNIX_EPOCH + offset
        } else {
            UNIX_EPOCH - offset
        });
        self
    }

    /// Timestamp as signed nanoseconds since the Unix epoch, if set.
    pub fn unix_nanos(&self) -> Option<i128> {
        self.time.map(unix_nanos)
    }
}

pub(crate) fn unix_nanos(time: SystemTime) -> i128 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_nanos() as i128,
        Err(before) => -(before.duration().as_nanos() as i128),
    }
}

impl PointEncoder for Point {
    fn encode(&self, protocol: &dyn Protocol) -> Result<Cow<'_, [u8]>> {
        let mut out = Vec::new();
        protocol.encode(&mut out, self)?;
        Ok(Cow::Owned(out))
    }
}

/// Points are encoded back to back, in slice order.
impl PointEncoder for [Point] {
    fn encode(&self, protocol: &dyn Protocol) -> Result<Cow<'_, [u8]>> {
        let mut out = Vec::new();
        for point in self {
            protocol.encode(&mut out, point)?;
        }
        Ok(Cow::Owned(out))
    }
}

impl PointEncoder for Vec<Point> {
    fn encode(&self, protocol: &dyn Protocol) -> Result<Cow<'_, [u8]>> {
        self.as_slice().encode(protocol)
    }
}

impl<T: PointEncoder + ?Sized> PointEncoder for &T {
    fn encode(&self, protocol: &dyn Protocol) -> Result<Cow<'_, [u8]>> {
        (**self).encode(protocol)
    }
}
