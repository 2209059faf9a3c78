//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Type coercion
//!
//! Maps backend-native values onto the portable [`TypedValue`] set. The
//! mapping is total: every input yields a value, and values that cannot be
//! represented natively are degraded to text or zero with a debug log.

pub mod native;

pub use native::NativeValue;

use framebridge_core::types::{DeclaredType, TypedValue};
use tracing::debug;

/// Coerce one raw cell into a portable value.
///
/// Rules, first match wins:
/// - null stays null, whatever the declared type
/// - a `blob` column always yields the `"Blob"` placeholder
/// - portable scalars pass through unchanged
/// - uuids become their canonical hyphenated text
/// - native ints widen to 64 bits
/// - decimals and varints go through their decimal string to `f64`, or `0.0`
/// - anything else becomes its JSON encoding, or `""` if encoding fails
pub fn coerce(raw: &NativeValue, declared: &DeclaredType) -> TypedValue {
    if raw.is_null() {
        return TypedValue::Null;
    }
    if declared.is_blob() {
        return TypedValue::blob_placeholder();
    }

    match raw {
        NativeValue::Float32(v) => TypedValue::Float32(*v),
        NativeValue::Float64(v) => TypedValue::Float64(*v),
        NativeValue::Timestamp(v) => TypedValue::Timestamp(*v),
        NativeValue::Text(v) => TypedValue::String(v.clone()),
        NativeValue::BigInt(v) => TypedValue::Int64(*v),
        NativeValue::Boolean(v) => TypedValue::Bool(*v),
        NativeValue::SmallInt(v) => TypedValue::Int16(*v),
        NativeValue::TinyInt(v) => TypedValue::Int8(*v),
        NativeValue::Uuid(v) => TypedValue::String(v.hyphenated().to_string()),
        NativeValue::Int(v) => TypedValue::Int64(i64::from(*v)),
        NativeValue::Decimal(v) => decimal_text_to_float(&v.to_string()),
        NativeValue::VarInt(v) => decimal_text_to_float(&v.to_string()),
        other => json_text(other),
    }
}

/// Parse a decimal representation as `f64`. Unparseable or out-of-range
/// input yields `0.0`.
pub(crate) fn decimal_text_to_float(repr: &str) -> TypedValue {
    match repr.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => TypedValue::Float64(value),
        Ok(_) => {
            debug!("Decimal value {} out of f64 range, using 0", repr);
            TypedValue::Float64(0.0)
        }
        Err(e) => {
            debug!("Failed to parse decimal value {}: {}", repr, e);
            TypedValue::Float64(0.0)
        }
    }
}

fn json_text(raw: &NativeValue) -> TypedValue {
    match serde_json::to_string(raw) {
        Ok(text) => TypedValue::String(text),
        Err(e) => {
            debug!(
                "Failed to serialize {} value, using empty string: {}",
                raw.category(),
                e
            );
            TypedValue::String(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use framebridge_core::types::ValueKind;
    use num_bigint::BigInt;
    use rust_decimal::Decimal;
    use std::net::{IpAddr, Ipv4Addr};
    use std::str::FromStr;
    use uuid::Uuid;

    fn samples() -> Vec<NativeValue> {
        vec![
            NativeValue::Float32(1.5),
            NativeValue::Float64(2.25),
            NativeValue::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            NativeValue::from("hello"),
            NativeValue::BigInt(9_000_000_000),
            NativeValue::Boolean(true),
            NativeValue::SmallInt(-7),
            NativeValue::TinyInt(3),
            NativeValue::Uuid(Uuid::nil()),
            NativeValue::Int(42),
            NativeValue::Decimal(Decimal::from_str("123.45").unwrap()),
            NativeValue::VarInt(BigInt::from(1_000_000u64)),
            NativeValue::Blob(vec![0xde, 0xad]),
            NativeValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            NativeValue::Inet(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            NativeValue::List(vec![NativeValue::Int(1)]),
            NativeValue::Set(vec![NativeValue::from("a")]),
            NativeValue::Map(vec![(NativeValue::from("k"), NativeValue::Int(1))]),
            NativeValue::Udt(vec![("f".to_string(), NativeValue::Boolean(false))]),
        ]
    }

    #[test]
    fn test_null_is_null_for_every_declared_type() {
        for tag in ["timestamp", "bigint", "blob", "text", "decimal", "list<int>"] {
            let declared = DeclaredType::parse(tag);
            assert_eq!(coerce(&NativeValue::Null, &declared), TypedValue::Null);
        }
    }

    #[test]
    fn test_coercion_is_total() {
        for tag in ["text", "bigint", "double", "map<text,int>"] {
            let declared = DeclaredType::parse(tag);
            for raw in samples() {
                // Must never panic and never yield null for a non-null input.
                assert!(!coerce(&raw, &declared).is_null());
            }
        }
    }

    #[test]
    fn test_values_pair_with_declared_buffers() {
        let pairs = vec![
            ("timestamp", NativeValue::Timestamp(Utc::now())),
            ("bigint", NativeValue::BigInt(1)),
            ("int", NativeValue::Int(1)),
            ("smallint", NativeValue::SmallInt(1)),
            ("boolean", NativeValue::Boolean(true)),
            ("double", NativeValue::Float64(1.0)),
            ("decimal", NativeValue::Decimal(Decimal::new(15, 1))),
            ("varint", NativeValue::VarInt(BigInt::from(7))),
            ("float", NativeValue::Float32(1.0)),
            ("tinyint", NativeValue::TinyInt(1)),
            ("blob", NativeValue::Blob(vec![1, 2, 3])),
            ("uuid", NativeValue::Uuid(Uuid::nil())),
            ("text", NativeValue::from("x")),
        ];

        for (tag, raw) in pairs {
            let declared = DeclaredType::parse(tag);
            let value = coerce(&raw, &declared);
            assert_eq!(value.kind(), declared.value_kind(), "declared type {}", tag);
        }
    }

    #[test]
    fn test_decimal_converts_through_text() {
        let raw = NativeValue::Decimal(Decimal::from_str("123.45").unwrap());
        assert_eq!(
            coerce(&raw, &DeclaredType::Float64),
            TypedValue::Float64(123.45)
        );
    }

    #[test]
    fn test_unparseable_decimal_text_is_zero() {
        assert_eq!(decimal_text_to_float("12..3"), TypedValue::Float64(0.0));
        assert_eq!(decimal_text_to_float(&"9".repeat(400)), TypedValue::Float64(0.0));
    }

    #[test]
    fn test_blob_column_yields_placeholder() {
        let raw = NativeValue::Blob(vec![0x01, 0x02]);
        assert_eq!(coerce(&raw, &DeclaredType::Blob), TypedValue::from("Blob"));

        // The placeholder depends on the declared type, not the raw value.
        let text = NativeValue::from("not binary");
        assert_eq!(coerce(&text, &DeclaredType::Blob), TypedValue::from("Blob"));
    }

    #[test]
    fn test_uuid_and_int() {
        let id = Uuid::from_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
        assert_eq!(
            coerce(&NativeValue::Uuid(id), &DeclaredType::Text),
            TypedValue::from("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        );
        assert_eq!(
            coerce(&NativeValue::Int(-5), &DeclaredType::Int64),
            TypedValue::Int64(-5)
        );
    }

    #[test]
    fn test_structured_values_become_json() {
        let raw = NativeValue::List(vec![NativeValue::Int(1), NativeValue::Int(2)]);
        assert_eq!(coerce(&raw, &DeclaredType::Text), TypedValue::from("[1,2]"));

        let date = NativeValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(
            coerce(&date, &DeclaredType::Text),
            TypedValue::from("\"2024-02-29\"")
        );
    }

    #[test]
    fn test_unserializable_value_becomes_empty_string() {
        let raw = NativeValue::Map(vec![(
            NativeValue::List(vec![NativeValue::Int(1)]),
            NativeValue::from("v"),
        )]);
        let value = coerce(&raw, &DeclaredType::Text);
        assert_eq!(value, TypedValue::from(""));
        assert_eq!(value.kind(), ValueKind::String);
    }
}
