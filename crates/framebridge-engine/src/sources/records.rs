//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Records returned by backend sources

use chrono::{DateTime, Utc};
use framebridge_core::types::{DeclaredType, Query};
use serde::{Deserialize, Serialize};

use crate::coercion::NativeValue;

/// Column name plus the type tag the backend declared for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }

    pub fn declared(&self) -> DeclaredType {
        DeclaredType::parse(&self.declared_type)
    }
}

/// Rows returned by a wide-column statement, in backend order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<NativeValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<NativeValue>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Metric metadata entry from a metric listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricMetadata {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, rename = "type")]
    pub metric_type: Option<String>,
}

impl MetricMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            metric_type: None,
        }
    }
}

/// Parameters of a datapoint fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointRequest {
    pub program: String,
    pub start_ms: Option<i64>,
    pub stop_ms: Option<i64>,
    /// Requested resolution; zero lets the backend choose
    pub resolution_ms: i64,
    pub max_delay_ms: i64,
}

impl DatapointRequest {
    pub fn from_query(query: &Query) -> Self {
        Self {
            program: query.program.clone(),
            start_ms: query.time_range.start_millis(),
            stop_ms: query.time_range.stop_millis(),
            resolution_ms: query.min_resolution.max(0),
            max_delay_ms: query.max_delay.max(0),
        }
    }
}

/// One timeseries in a datapoint response
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Backend series identifier
    pub id: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp_ms: i64,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(timestamp_ms: i64, value: Option<f64>) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// One object under a listed prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: Option<i64>,
}

/// One level of an object listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// Folder-like prefixes, each ending with the delimiter
    pub common_prefixes: Vec<String>,
    pub objects: Vec<ObjectEntry>,
    /// More keys exist past this page
    pub is_truncated: bool,
}
