//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Query request types
//!
//! Queries arrive already decoded from the caller's JSON payload and are
//! read-only from then on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DataSourceSettings;

/// Backend operation a query asks for.
///
/// This is the only thing the dispatcher looks at when choosing what to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Statement against the wide-column store
    Statement,

    /// Metric name listing
    #[serde(alias = "/v2/metric", alias = "metrics")]
    ListMetrics,

    /// Datapoint retrieval for a metrics program
    Datapoints,

    /// Object listing under a prefix
    #[serde(alias = "objects")]
    ListObjects,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Statement => "statement",
            QueryKind::ListMetrics => "list_metrics",
            QueryKind::Datapoints => "datapoints",
            QueryKind::ListObjects => "list_objects",
        }
    }
}

/// Absolute time range, either end may be open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Range start
    #[serde(default, alias = "from")]
    pub start: Option<DateTime<Utc>>,

    /// Range stop
    #[serde(default, alias = "to")]
    pub stop: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
        }
    }

    /// An unbounded range
    pub fn open() -> Self {
        Self::default()
    }

    pub fn start_millis(&self) -> Option<i64> {
        self.start.map(|t| t.timestamp_millis())
    }

    pub fn stop_millis(&self) -> Option<i64> {
        self.stop.map(|t| t.timestamp_millis())
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.stop.is_some()
    }
}

/// One unit of work within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Identifier, unique within a batch
    pub ref_id: String,

    /// Backend operation discriminator
    pub kind: QueryKind,

    /// Connection target override (host); falls back to the settings host
    #[serde(default)]
    pub target: Option<String>,

    /// Program, statement or metric filter text
    #[serde(default)]
    pub program: String,

    /// Time range
    #[serde(default)]
    pub time_range: TimeRange,

    /// Maximum delay hint in milliseconds
    #[serde(default)]
    pub max_delay: i64,

    /// Minimum resolution hint in milliseconds
    #[serde(default)]
    pub min_resolution: i64,

    /// Series label override
    #[serde(default)]
    pub alias: Option<String>,

    /// Bucket for object listings
    #[serde(default)]
    pub bucket: Option<String>,

    /// Key prefix for object listings
    #[serde(default)]
    pub path: Option<String>,

    /// Annotate listing names with type and full key
    #[serde(default)]
    pub formatted: bool,
}

impl Query {
    pub fn new(ref_id: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            ref_id: ref_id.into(),
            kind,
            target: None,
            program: String::new(),
            time_range: TimeRange::default(),
            max_delay: 0,
            min_resolution: 0,
            alias: None,
            bucket: None,
            path: None,
            formatted: false,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn with_resolution(mut self, max_delay: i64, min_resolution: i64) -> Self {
        self.max_delay = max_delay;
        self.min_resolution = min_resolution;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_listing(mut self, bucket: impl Into<String>, path: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self.path = Some(path.into());
        self
    }

    pub fn with_formatted(mut self, formatted: bool) -> Self {
        self.formatted = formatted;
        self
    }

    /// Formatted mode is on when the flag is set or the program text carries
    /// the `FORMATTED` marker.
    pub fn is_formatted(&self) -> bool {
        self.formatted || self.program.contains("FORMATTED")
    }
}

/// Inbound batch: settings for the target data source plus its queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Data source settings the batch runs against
    pub settings: DataSourceSettings,

    /// Queries in submission order
    pub queries: Vec<Query>,
}

impl BatchRequest {
    pub fn new(settings: DataSourceSettings, queries: Vec<Query>) -> Self {
        Self { settings, queries }
    }
}
