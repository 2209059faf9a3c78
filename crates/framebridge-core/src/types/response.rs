//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Batch response types
//!
//! A batch response maps every submitted query identifier to an independent
//! table/error pair.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use super::table::Table;
use crate::error::{BridgeError, BridgeResult};

/// Outcome of a single query
#[derive(Debug, Default)]
pub struct QueryResponse {
    /// Result table, absent when the query failed
    pub table: Option<Table>,

    /// Query-scoped error
    pub error: Option<BridgeError>,
}

impl QueryResponse {
    pub fn success(table: Table) -> Self {
        Self {
            table: Some(table),
            error: None,
        }
    }

    pub fn failure(error: BridgeError) -> Self {
        Self {
            table: None,
            error: Some(error),
        }
    }

    pub fn from_result(result: BridgeResult<Table>) -> Self {
        match result {
            Ok(table) => Self::success(table),
            Err(error) => Self::failure(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Serialize for QueryResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QueryResponse", 2)?;
        state.serialize_field("table", &self.table)?;
        match &self.error {
            Some(error) => state.serialize_field(
                "error",
                &serde_json::json!({
                    "type": error.error_type(),
                    "message": error.to_string(),
                }),
            )?,
            None => state.serialize_field("error", &Option::<()>::None)?,
        }
        state.end()
    }
}

/// Response for a whole batch, keyed by query identifier
#[derive(Debug, Default)]
pub struct BatchResponse {
    responses: HashMap<String, QueryResponse>,
}

impl BatchResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a query outcome, returning the previous one if any
    pub fn insert(&mut self, ref_id: impl Into<String>, response: QueryResponse) -> Option<QueryResponse> {
        self.responses.insert(ref_id.into(), response)
    }

    pub fn get(&self, ref_id: &str) -> Option<&QueryResponse> {
        self.responses.get(ref_id)
    }

    pub fn contains(&self, ref_id: &str) -> bool {
        self.responses.contains_key(ref_id)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryResponse)> {
        self.responses.iter()
    }

    /// Number of entries carrying an error
    pub fn error_count(&self) -> usize {
        self.responses.values().filter(|r| !r.is_ok()).count()
    }

    pub fn into_inner(self) -> HashMap<String, QueryResponse> {
        self.responses
    }
}

impl Serialize for BatchResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Sorted so output is stable between runs.
        let mut keys: Vec<&String> = self.responses.keys().collect();
        keys.sort();
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            map.serialize_entry(key, &self.responses[key])?;
        }
        map.end()
    }
}
