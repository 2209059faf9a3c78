//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Column-oriented result tables
//!
//! A [`Table`] keeps its columns in declared order and guarantees that every
//! column has the same number of rows. Tables can be exported to Arrow
//! record batches for downstream consumers.

use arrow::array::{
    ArrayRef, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, StringArray, TimestampMicrosecondArray, TimestampNanosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::column::{Column, ColumnValues};
use crate::error::{BridgeError, BridgeResult};

/// Table-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Folder-like groupings discovered while building the table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<String>,

    /// Free-form metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

impl TableMeta {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.custom.is_empty()
    }
}

/// Result table for a single query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Table name
    pub name: String,

    columns: Vec<Column>,

    /// Table metadata
    #[serde(skip_serializing_if = "TableMeta::is_empty")]
    pub meta: TableMeta,
}

impl Table {
    /// Create an empty table with no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            meta: TableMeta::default(),
        }
    }

    /// Build a table from columns, rejecting ragged input
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> BridgeResult<Self> {
        let mut table = Self::new(name);
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Append a column. Its length must match the existing columns.
    pub fn push_column(&mut self, column: Column) -> BridgeResult<()> {
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(BridgeError::internal(format!(
                    "column '{}' has {} rows, table '{}' has {}",
                    column.name,
                    column.len(),
                    self.name,
                    first.len()
                )));
            }
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn with_meta(mut self, meta: TableMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Export to an Arrow record batch. Display hints become field metadata
    /// and table metadata becomes schema metadata.
    pub fn to_record_batch(&self) -> BridgeResult<RecordBatch> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let (data_type, array) = column_to_array(&column.values);
            let mut field = Field::new(column.name.as_str(), data_type, true);
            if let Some(hints) = &column.hints {
                let mut metadata = HashMap::new();
                if let Some(width) = hints.width {
                    metadata.insert("width".to_string(), width.to_string());
                }
                if let Some(align) = &hints.align {
                    metadata.insert("align".to_string(), align.clone());
                }
                if let Some(unit) = &hints.unit {
                    metadata.insert("unit".to_string(), unit.clone());
                }
                for (key, value) in &hints.custom {
                    let rendered = match value {
                        serde_json::Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    metadata.insert(key.clone(), rendered);
                }
                field = field.with_metadata(metadata);
            }
            fields.push(field);
            arrays.push(array);
        }

        let mut schema_metadata = HashMap::new();
        schema_metadata.insert("name".to_string(), self.name.clone());
        if !self.meta.is_empty() {
            schema_metadata.insert("meta".to_string(), serde_json::to_string(&self.meta)?);
        }
        let schema = Arc::new(Schema::new(fields).with_metadata(schema_metadata));

        let options = RecordBatchOptions::new().with_row_count(Some(self.row_count()));
        Ok(RecordBatch::try_new_with_options(schema, arrays, &options)?)
    }
}

fn column_to_array(values: &ColumnValues) -> (DataType, ArrayRef) {
    match values {
        ColumnValues::String(v) => {
            let array: StringArray = v.iter().map(|s| s.as_deref()).collect();
            (DataType::Utf8, Arc::new(array))
        }
        ColumnValues::Int64(v) => (DataType::Int64, Arc::new(Int64Array::from(v.clone()))),
        ColumnValues::Int32(v) => (DataType::Int32, Arc::new(Int32Array::from(v.clone()))),
        ColumnValues::Int16(v) => (DataType::Int16, Arc::new(Int16Array::from(v.clone()))),
        ColumnValues::Int8(v) => (DataType::Int8, Arc::new(Int8Array::from(v.clone()))),
        ColumnValues::Float64(v) => (DataType::Float64, Arc::new(Float64Array::from(v.clone()))),
        ColumnValues::Float32(v) => (DataType::Float32, Arc::new(Float32Array::from(v.clone()))),
        ColumnValues::Bool(v) => (DataType::Boolean, Arc::new(BooleanArray::from(v.clone()))),
        ColumnValues::Timestamp(v) => {
            // Nanoseconds cover 1677..2262; wider ranges fall back to microseconds.
            let nanos: Option<Vec<Option<i64>>> = v
                .iter()
                .map(|ts| match ts {
                    Some(t) => t.timestamp_nanos_opt().map(Some),
                    None => Some(None),
                })
                .collect();
            match nanos {
                Some(nanos) => (
                    DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
                    Arc::new(TimestampNanosecondArray::from(nanos).with_timezone("UTC")),
                ),
                None => {
                    let micros: Vec<Option<i64>> =
                        v.iter().map(|ts| ts.map(|t| t.timestamp_micros())).collect();
                    (
                        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                        Arc::new(TimestampMicrosecondArray::from(micros).with_timezone("UTC")),
                    )
                }
            }
        }
    }
}
