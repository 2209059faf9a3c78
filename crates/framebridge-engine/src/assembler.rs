//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Batch response assembly
//!
//! Collects per-query outcomes as they complete, in any order and from any
//! task, into one [`BatchResponse`].

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use framebridge_core::types::{BatchResponse, QueryResponse, Table};
use framebridge_core::{BridgeError, BridgeResult};
use tracing::warn;

/// Thread-safe collector of query outcomes
#[derive(Debug)]
pub struct ResponseAssembler {
    expected: Vec<String>,
    entries: DashMap<String, QueryResponse>,
}

impl ResponseAssembler {
    /// Expect one outcome for each identifier; duplicates count once
    pub fn new<I, S>(ref_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut expected: Vec<String> = Vec::new();
        for id in ref_ids {
            let id = id.into();
            if !expected.contains(&id) {
                expected.push(id);
            }
        }
        Self {
            entries: DashMap::with_capacity(expected.len()),
            expected,
        }
    }

    /// Record an outcome. The first outcome for an identifier wins; later
    /// ones are dropped and `false` is returned.
    pub fn assemble(&self, ref_id: &str, result: BridgeResult<Table>) -> bool {
        match self.entries.entry(ref_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(QueryResponse::from_result(result));
                true
            }
            Entry::Occupied(_) => {
                warn!("Dropping duplicate outcome for query {}", ref_id);
                false
            }
        }
    }

    pub fn is_recorded(&self, ref_id: &str) -> bool {
        self.entries.contains_key(ref_id)
    }

    /// Expected identifiers with no outcome yet
    pub fn pending(&self) -> Vec<&str> {
        self.expected
            .iter()
            .filter(|id| !self.entries.contains_key(id.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Drain every outcome into a response. Expected identifiers that never
    /// reported get an internal error so no query goes missing.
    pub fn finish(&self) -> BatchResponse {
        for id in self.pending() {
            self.entries.insert(
                id.to_string(),
                QueryResponse::failure(BridgeError::internal(format!(
                    "query {} produced no result",
                    id
                ))),
            );
        }

        let mut response = BatchResponse::new();
        let keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((key, outcome)) = self.entries.remove(&key) {
                response.insert(key, outcome);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_outcome_wins() {
        let assembler = ResponseAssembler::new(["A"]);
        assert!(assembler.assemble("A", Ok(Table::new("response"))));
        assert!(!assembler.assemble("A", Err(BridgeError::query("late"))));

        let response = assembler.finish();
        assert!(response.get("A").unwrap().is_ok());
    }

    #[test]
    fn test_missing_outcomes_become_internal_errors() {
        let assembler = ResponseAssembler::new(["A", "B", "A"]);
        assembler.assemble("A", Ok(Table::new("response")));
        assert_eq!(assembler.pending(), vec!["B"]);

        let response = assembler.finish();
        assert_eq!(response.len(), 2);
        let missing = response.get("B").unwrap();
        assert_eq!(missing.error.as_ref().unwrap().error_type(), "Internal");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_assembly() {
        let ids: Vec<String> = (0..64).map(|i| format!("Q{}", i)).collect();
        let assembler = Arc::new(ResponseAssembler::new(ids.clone()));

        let tasks: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let assembler = Arc::clone(&assembler);
                tokio::spawn(async move { assembler.assemble(&id, Ok(Table::new("response"))) })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        let response = assembler.finish();
        assert_eq!(response.len(), 64);
        assert_eq!(response.error_count(), 0);
    }
}
