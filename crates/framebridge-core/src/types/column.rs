//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Typed column buffers
//!
//! A column owns one append-only buffer of a single [`ValueKind`]. Nulls are
//! stored as `None` entries so every column keeps positional alignment with
//! its siblings.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use super::value::{TypedValue, ValueKind};

/// Strongly typed, append-only column storage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValues {
    String(Vec<Option<String>>),
    Int64(Vec<Option<i64>>),
    Int32(Vec<Option<i32>>),
    Int16(Vec<Option<i16>>),
    Int8(Vec<Option<i8>>),
    Float64(Vec<Option<f64>>),
    Float32(Vec<Option<f32>>),
    Bool(Vec<Option<bool>>),
    Timestamp(Vec<Option<DateTime<Utc>>>),
}

impl ColumnValues {
    /// Create an empty buffer for the given kind. A null kind has no buffer of
    /// its own and falls back to strings.
    pub fn new(kind: ValueKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    pub fn with_capacity(kind: ValueKind, capacity: usize) -> Self {
        match kind {
            ValueKind::Null | ValueKind::String => ColumnValues::String(Vec::with_capacity(capacity)),
            ValueKind::Int64 => ColumnValues::Int64(Vec::with_capacity(capacity)),
            ValueKind::Int32 => ColumnValues::Int32(Vec::with_capacity(capacity)),
            ValueKind::Int16 => ColumnValues::Int16(Vec::with_capacity(capacity)),
            ValueKind::Int8 => ColumnValues::Int8(Vec::with_capacity(capacity)),
            ValueKind::Float64 => ColumnValues::Float64(Vec::with_capacity(capacity)),
            ValueKind::Float32 => ColumnValues::Float32(Vec::with_capacity(capacity)),
            ValueKind::Bool => ColumnValues::Bool(Vec::with_capacity(capacity)),
            ValueKind::Timestamp => ColumnValues::Timestamp(Vec::with_capacity(capacity)),
        }
    }

    /// Element kind of this buffer
    pub fn kind(&self) -> ValueKind {
        match self {
            ColumnValues::String(_) => ValueKind::String,
            ColumnValues::Int64(_) => ValueKind::Int64,
            ColumnValues::Int32(_) => ValueKind::Int32,
            ColumnValues::Int16(_) => ValueKind::Int16,
            ColumnValues::Int8(_) => ValueKind::Int8,
            ColumnValues::Float64(_) => ValueKind::Float64,
            ColumnValues::Float32(_) => ValueKind::Float32,
            ColumnValues::Bool(_) => ValueKind::Bool,
            ColumnValues::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::String(v) => v.len(),
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Int32(v) => v.len(),
            ColumnValues::Int16(v) => v.len(),
            ColumnValues::Int8(v) => v.len(),
            ColumnValues::Float64(v) => v.len(),
            ColumnValues::Float32(v) => v.len(),
            ColumnValues::Bool(v) => v.len(),
            ColumnValues::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a null entry
    pub fn push_null(&mut self) {
        match self {
            ColumnValues::String(v) => v.push(None),
            ColumnValues::Int64(v) => v.push(None),
            ColumnValues::Int32(v) => v.push(None),
            ColumnValues::Int16(v) => v.push(None),
            ColumnValues::Int8(v) => v.push(None),
            ColumnValues::Float64(v) => v.push(None),
            ColumnValues::Float32(v) => v.push(None),
            ColumnValues::Bool(v) => v.push(None),
            ColumnValues::Timestamp(v) => v.push(None),
        }
    }

    /// Append one value, always growing the buffer by exactly one entry.
    ///
    /// Matching kinds are stored as-is and string buffers accept any value in
    /// rendered form. Numeric buffers store the converted value, or zero when
    /// the value has no numeric reading or does not fit. Bool and timestamp
    /// buffers have no zero: they parse text (and epoch milliseconds for
    /// timestamps) and otherwise store a null. Returns `false` whenever a
    /// fallback zero or null was stored.
    pub fn push(&mut self, value: TypedValue) -> bool {
        if value.is_null() {
            self.push_null();
            return true;
        }

        match (&mut *self, value) {
            (ColumnValues::String(v), TypedValue::String(s)) => {
                v.push(Some(s));
                true
            }
            (ColumnValues::String(v), other) => {
                v.push(Some(other.render()));
                true
            }
            (ColumnValues::Int64(v), other) => push_or_zero(v, other.as_i64(), &other),
            (ColumnValues::Int32(v), other) => {
                let fitted = other.as_i64().and_then(|x| i32::try_from(x).ok());
                push_or_zero(v, fitted, &other)
            }
            (ColumnValues::Int16(v), other) => {
                let fitted = other.as_i64().and_then(|x| i16::try_from(x).ok());
                push_or_zero(v, fitted, &other)
            }
            (ColumnValues::Int8(v), other) => {
                let fitted = other.as_i64().and_then(|x| i8::try_from(x).ok());
                push_or_zero(v, fitted, &other)
            }
            (ColumnValues::Float64(v), TypedValue::Float64(x)) => {
                v.push(Some(x));
                true
            }
            (ColumnValues::Float64(v), other) => push_or_zero(v, other.as_f64(), &other),
            (ColumnValues::Float32(v), TypedValue::Float32(x)) => {
                v.push(Some(x));
                true
            }
            (ColumnValues::Float32(v), other) => {
                let fitted = other
                    .as_f64()
                    .map(|x| x as f32)
                    .filter(|x| x.is_finite());
                push_or_zero(v, fitted, &other)
            }
            (ColumnValues::Bool(v), TypedValue::Bool(x)) => {
                v.push(Some(x));
                true
            }
            (ColumnValues::Bool(v), other) => {
                let parsed = match &other {
                    TypedValue::String(s) => s.trim().to_ascii_lowercase().parse::<bool>().ok(),
                    _ => None,
                };
                push_or_null(v, parsed, &other)
            }
            (ColumnValues::Timestamp(v), TypedValue::Timestamp(x)) => {
                v.push(Some(x));
                true
            }
            (ColumnValues::Timestamp(v), other) => {
                let parsed = match &other {
                    TypedValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                        .ok()
                        .map(|ts| ts.with_timezone(&Utc)),
                    TypedValue::Int64(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
                    _ => None,
                };
                push_or_null(v, parsed, &other)
            }
        }
    }

    /// Read back the value at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<TypedValue> {
        if index >= self.len() {
            return None;
        }
        let value = match self {
            ColumnValues::String(v) => v[index].clone().into(),
            ColumnValues::Int64(v) => v[index].into(),
            ColumnValues::Int32(v) => v[index].map(TypedValue::Int32).unwrap_or(TypedValue::Null),
            ColumnValues::Int16(v) => v[index].map(TypedValue::Int16).unwrap_or(TypedValue::Null),
            ColumnValues::Int8(v) => v[index].map(TypedValue::Int8).unwrap_or(TypedValue::Null),
            ColumnValues::Float64(v) => v[index].into(),
            ColumnValues::Float32(v) => v[index].map(TypedValue::Float32).unwrap_or(TypedValue::Null),
            ColumnValues::Bool(v) => v[index].into(),
            ColumnValues::Timestamp(v) => v[index].into(),
        };
        Some(value)
    }
}

/// Store the converted value, or zero when there is none
fn push_or_zero<T: Default>(buffer: &mut Vec<Option<T>>, converted: Option<T>, value: &TypedValue) -> bool {
    match converted {
        Some(x) => {
            buffer.push(Some(x));
            true
        }
        None => {
            debug!("Coercion fallback: {} value {:?} stored as zero", value.kind(), value.render());
            buffer.push(Some(T::default()));
            false
        }
    }
}

/// Store the converted value, or null for kinds without a zero
fn push_or_null<T>(buffer: &mut Vec<Option<T>>, converted: Option<T>, value: &TypedValue) -> bool {
    let stored = converted.is_some();
    if !stored {
        debug!("Coercion fallback: {} value {:?} stored as null", value.kind(), value.render());
    }
    buffer.push(converted);
    stored
}

/// Presentation hints attached to a column. They never change values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayHints {
    /// Preferred column width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Cell alignment ("left", "right", "center")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,

    /// Display unit, e.g. "bytes" or a time format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Free-form hints for consumers that understand them
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

impl DisplayHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_align(mut self, align: impl Into<String>) -> Self {
        self.align = Some(align.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.align.is_none() && self.unit.is_none() && self.custom.is_empty()
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Column values
    pub values: ColumnValues,

    /// Optional display hints
    pub hints: Option<DisplayHints>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
            hints: None,
        }
    }

    /// Create an empty column of the given kind
    pub fn empty(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, ColumnValues::new(kind))
    }

    pub fn with_hints(mut self, hints: DisplayHints) -> Self {
        self.hints = if hints.is_empty() { None } else { Some(hints) };
        self
    }

    pub fn kind(&self) -> ValueKind {
        self.values.kind()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: TypedValue) -> bool {
        self.values.push(value)
    }

    pub fn get(&self, index: usize) -> Option<TypedValue> {
        self.values.get(index)
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Column", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &self.kind())?;
        state.serialize_field("values", &self.values)?;
        if let Some(hints) = &self.hints {
            state.serialize_field("hints", hints)?;
        } else {
            state.skip_field("hints")?;
        }
        state.end()
    }
}
