//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Backend-native cell values
//!
//! [`NativeValue`] enumerates every runtime category a backend driver hands
//! back. The coercer maps each category onto a portable value; the structured
//! categories (collections, maps, user types) only ever reach the table as
//! JSON text.

use chrono::{DateTime, NaiveDate, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::net::IpAddr;
use uuid::Uuid;

/// A value as produced by a backend driver
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Absent / null cell
    Null,
    Float32(f32),
    Float64(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
    BigInt(i64),
    Boolean(bool),
    SmallInt(i16),
    TinyInt(i8),
    /// 128-bit unique identifier (uuid / timeuuid)
    Uuid(Uuid),
    /// Native machine integer, widened to 64 bits on coercion
    Int(i32),
    /// Arbitrary-precision decimal
    Decimal(Decimal),
    /// Arbitrary-precision integer
    VarInt(BigInt),
    /// Raw binary payload
    Blob(Vec<u8>),
    Date(NaiveDate),
    Inet(IpAddr),
    List(Vec<NativeValue>),
    Set(Vec<NativeValue>),
    /// Ordered key/value pairs; keys may be any value
    Map(Vec<(NativeValue, NativeValue)>),
    /// User-defined type: named fields in declaration order
    Udt(Vec<(String, NativeValue)>),
}

impl NativeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Short category name used in diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Float32(_) => "float32",
            NativeValue::Float64(_) => "float64",
            NativeValue::Timestamp(_) => "timestamp",
            NativeValue::Text(_) => "text",
            NativeValue::BigInt(_) => "bigint",
            NativeValue::Boolean(_) => "boolean",
            NativeValue::SmallInt(_) => "smallint",
            NativeValue::TinyInt(_) => "tinyint",
            NativeValue::Uuid(_) => "uuid",
            NativeValue::Int(_) => "int",
            NativeValue::Decimal(_) => "decimal",
            NativeValue::VarInt(_) => "varint",
            NativeValue::Blob(_) => "blob",
            NativeValue::Date(_) => "date",
            NativeValue::Inet(_) => "inet",
            NativeValue::List(_) => "list",
            NativeValue::Set(_) => "set",
            NativeValue::Map(_) => "map",
            NativeValue::Udt(_) => "udt",
        }
    }
}

impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NativeValue::Null => serializer.serialize_unit(),
            NativeValue::Float32(v) => serializer.serialize_f32(*v),
            NativeValue::Float64(v) => serializer.serialize_f64(*v),
            NativeValue::Timestamp(v) => v.serialize(serializer),
            NativeValue::Text(v) => serializer.serialize_str(v),
            NativeValue::BigInt(v) => serializer.serialize_i64(*v),
            NativeValue::Boolean(v) => serializer.serialize_bool(*v),
            NativeValue::SmallInt(v) => serializer.serialize_i16(*v),
            NativeValue::TinyInt(v) => serializer.serialize_i8(*v),
            NativeValue::Uuid(v) => serializer.collect_str(v),
            NativeValue::Int(v) => serializer.serialize_i32(*v),
            NativeValue::Decimal(v) => serializer.collect_str(v),
            NativeValue::VarInt(v) => serializer.collect_str(v),
            NativeValue::Blob(v) => serializer.collect_seq(v),
            NativeValue::Date(v) => serializer.collect_str(v),
            NativeValue::Inet(v) => serializer.collect_str(v),
            NativeValue::List(v) | NativeValue::Set(v) => serializer.collect_seq(v),
            NativeValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            NativeValue::Udt(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::Text(value.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        NativeValue::Text(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        NativeValue::BigInt(value)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        NativeValue::Int(value)
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Float64(value)
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Boolean(value)
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(NativeValue::Null)
    }
}
