//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Portable scalar values and the declared-type vocabulary
//!
//! [`TypedValue`] is the only value representation that reaches the table
//! layer. [`DeclaredType`] is the parsed column type tag; both the coercer and
//! the column materializer are driven by it, and [`DeclaredType::value_kind`]
//! is the single place where a declared type is paired with a buffer type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Portable scalar kinds a table column can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    String,
    Int64,
    Int32,
    Int16,
    Int8,
    Float64,
    Float32,
    Bool,
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::String => "string",
            ValueKind::Int64 => "int64",
            ValueKind::Int32 => "int32",
            ValueKind::Int16 => "int16",
            ValueKind::Int8 => "int8",
            ValueKind::Float64 => "float64",
            ValueKind::Float32 => "float32",
            ValueKind::Bool => "bool",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single coerced cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Null,
    String(String),
    Int64(i64),
    Int32(i32),
    Int16(i16),
    Int8(i8),
    Float64(f64),
    Float32(f32),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl TypedValue {
    /// Placeholder stored instead of large-binary payloads
    pub const BLOB_PLACEHOLDER: &'static str = "Blob";

    /// The portable kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Null => ValueKind::Null,
            TypedValue::String(_) => ValueKind::String,
            TypedValue::Int64(_) => ValueKind::Int64,
            TypedValue::Int32(_) => ValueKind::Int32,
            TypedValue::Int16(_) => ValueKind::Int16,
            TypedValue::Int8(_) => ValueKind::Int8,
            TypedValue::Float64(_) => ValueKind::Float64,
            TypedValue::Float32(_) => ValueKind::Float32,
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// The blob placeholder value
    pub fn blob_placeholder() -> Self {
        TypedValue::String(Self::BLOB_PLACEHOLDER.to_string())
    }

    /// Integer reading of the value. Floats are truncated when they fit,
    /// text is parsed, booleans read as 0/1.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int64(v) => Some(*v),
            TypedValue::Int32(v) => Some(i64::from(*v)),
            TypedValue::Int16(v) => Some(i64::from(*v)),
            TypedValue::Int8(v) => Some(i64::from(*v)),
            TypedValue::Float64(v) => float_to_i64(*v),
            TypedValue::Float32(v) => float_to_i64(f64::from(*v)),
            TypedValue::Bool(v) => Some(i64::from(*v)),
            TypedValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
            }
            TypedValue::Null | TypedValue::Timestamp(_) => None,
        }
    }

    /// Floating-point reading of the value. Text is parsed, booleans read
    /// as 0/1. Non-finite results are rejected.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            TypedValue::Int64(v) => *v as f64,
            TypedValue::Int32(v) => f64::from(*v),
            TypedValue::Int16(v) => f64::from(*v),
            TypedValue::Int8(v) => f64::from(*v),
            TypedValue::Float64(v) => *v,
            TypedValue::Float32(v) => f64::from(*v),
            TypedValue::Bool(v) => f64::from(u8::from(*v)),
            TypedValue::String(s) => s.trim().parse::<f64>().ok()?,
            TypedValue::Null | TypedValue::Timestamp(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Textual rendering used when a value lands in a string column.
    /// Null renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            TypedValue::Null => String::new(),
            TypedValue::String(s) => s.clone(),
            TypedValue::Int64(v) => v.to_string(),
            TypedValue::Int32(v) => v.to_string(),
            TypedValue::Int16(v) => v.to_string(),
            TypedValue::Int8(v) => v.to_string(),
            TypedValue::Float64(v) => v.to_string(),
            TypedValue::Float32(v) => v.to_string(),
            TypedValue::Bool(v) => v.to_string(),
            TypedValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn float_to_i64(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    (truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64)
        .then_some(truncated as i64)
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::String(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::String(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Int64(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        TypedValue::Float64(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for TypedValue {
    fn from(value: DateTime<Utc>) -> Self {
        TypedValue::Timestamp(value)
    }
}

impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TypedValue::Null)
    }
}

/// Column type tag as declared by a backend schema, parsed once.
///
/// Recognised tags (case-insensitive):
/// `timestamp`; `bigint`, `int`; `smallint`; `boolean`;
/// `double`, `varint`, `decimal`; `float`; `tinyint`; `blob`.
/// Anything else is [`DeclaredType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Timestamp,
    Int64,
    Int16,
    Boolean,
    Float64,
    Float32,
    Int8,
    Blob,
    Text,
}

impl DeclaredType {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "timestamp" => DeclaredType::Timestamp,
            "bigint" | "int" => DeclaredType::Int64,
            "smallint" => DeclaredType::Int16,
            "boolean" => DeclaredType::Boolean,
            "double" | "varint" | "decimal" => DeclaredType::Float64,
            "float" => DeclaredType::Float32,
            "tinyint" => DeclaredType::Int8,
            "blob" => DeclaredType::Blob,
            _ => DeclaredType::Text,
        }
    }

    /// The kind of buffer a column of this declared type uses, and the kind the
    /// coercer yields for values a backend produces for it.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            DeclaredType::Timestamp => ValueKind::Timestamp,
            DeclaredType::Int64 => ValueKind::Int64,
            DeclaredType::Int16 => ValueKind::Int16,
            DeclaredType::Boolean => ValueKind::Bool,
            DeclaredType::Float64 => ValueKind::Float64,
            DeclaredType::Float32 => ValueKind::Float32,
            DeclaredType::Int8 => ValueKind::Int8,
            DeclaredType::Blob | DeclaredType::Text => ValueKind::String,
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, DeclaredType::Blob)
    }
}

impl From<&str> for DeclaredType {
    fn from(tag: &str) -> Self {
        DeclaredType::parse(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_declared_type_vocabulary() {
        assert_eq!(DeclaredType::parse("timestamp"), DeclaredType::Timestamp);
        assert_eq!(DeclaredType::parse("bigint"), DeclaredType::Int64);
        assert_eq!(DeclaredType::parse("int"), DeclaredType::Int64);
        assert_eq!(DeclaredType::parse("smallint"), DeclaredType::Int16);
        assert_eq!(DeclaredType::parse("boolean"), DeclaredType::Boolean);
        assert_eq!(DeclaredType::parse("double"), DeclaredType::Float64);
        assert_eq!(DeclaredType::parse("varint"), DeclaredType::Float64);
        assert_eq!(DeclaredType::parse("decimal"), DeclaredType::Float64);
        assert_eq!(DeclaredType::parse("float"), DeclaredType::Float32);
        assert_eq!(DeclaredType::parse("tinyint"), DeclaredType::Int8);
        assert_eq!(DeclaredType::parse("blob"), DeclaredType::Blob);
        assert_eq!(DeclaredType::parse(" BIGINT "), DeclaredType::Int64);
        assert_eq!(DeclaredType::parse("uuid"), DeclaredType::Text);
        assert_eq!(DeclaredType::parse("map<text, int>"), DeclaredType::Text);
    }

    #[test]
    fn test_blob_and_text_share_string_buffers() {
        assert_eq!(DeclaredType::Blob.value_kind(), ValueKind::String);
        assert_eq!(DeclaredType::Text.value_kind(), ValueKind::String);
    }

    #[test]
    fn test_render() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(TypedValue::Timestamp(ts).render(), "2024-03-01T12:00:00.000Z");
        assert_eq!(TypedValue::Int16(-4).render(), "-4");
        assert_eq!(TypedValue::Null.render(), "");
        assert_eq!(TypedValue::blob_placeholder().render(), "Blob");
    }

    #[test]
    fn test_option_into_typed_value() {
        let missing: Option<i64> = None;
        assert_eq!(TypedValue::from(missing), TypedValue::Null);
        assert_eq!(TypedValue::from(Some(7i64)), TypedValue::Int64(7));
    }
}
