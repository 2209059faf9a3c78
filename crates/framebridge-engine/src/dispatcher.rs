//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Query dispatch
//!
//! Chooses the backend operation from the query kind, runs it against a
//! handle, and shapes the outcome into a table. Every call races the query
//! timeout and the caller's cancellation token.

use framebridge_core::types::{Query, QueryKind, Table};
use framebridge_core::{BridgeError, BridgeResult, EngineConfig};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::materializer::materialize_row_set;
use crate::sources::{BackendHandle, DatapointRequest};
use crate::tables::{
    datapoints_table, metric_names_table, object_listing_table, KEY_DELIMITER, RESPONSE_TABLE,
};

/// Runs single queries against backend handles
#[derive(Debug, Clone)]
pub struct QueryDispatcher {
    query_timeout: Duration,
}

impl QueryDispatcher {
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.query_timeout())
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Execute `query` on `handle`, stopping early on cancellation or timeout
    pub async fn execute(
        &self,
        query: &Query,
        handle: &BackendHandle,
        cancel: &CancellationToken,
    ) -> BridgeResult<Table> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BridgeError::cancelled(format!(
                "query {} cancelled",
                query.ref_id
            ))),
            result = tokio::time::timeout(self.query_timeout, self.dispatch(query, handle)) => {
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => Err(BridgeError::timeout(format!(
                        "query {} did not finish within {:?}",
                        query.ref_id, self.query_timeout
                    ))),
                }
            }
        }
    }

    async fn dispatch(&self, query: &Query, handle: &BackendHandle) -> BridgeResult<Table> {
        debug!("Dispatching {} query {}", query.kind.as_str(), query.ref_id);
        match (query.kind, handle) {
            (QueryKind::Statement, BackendHandle::WideColumn(session)) => {
                let rows = session.execute(&query.program, &query.time_range).await?;
                materialize_row_set(RESPONSE_TABLE, &rows)
            }
            (QueryKind::ListMetrics, BackendHandle::Metrics(client)) => {
                let metrics = client.list_metrics(&query.program).await?;
                metric_names_table(&metrics)
            }
            (QueryKind::Datapoints, BackendHandle::Metrics(client)) => {
                let series = client
                    .get_datapoints(&DatapointRequest::from_query(query))
                    .await?;
                datapoints_table(&series, query.alias.as_deref())
            }
            (QueryKind::ListObjects, BackendHandle::ObjectStore(store)) => {
                let bucket = query
                    .bucket
                    .as_deref()
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| {
                        BridgeError::configuration("object listing requires a bucket")
                    })?;
                let prefix = query.path.as_deref().unwrap_or("");
                let listing = store.list_objects(bucket, prefix, KEY_DELIMITER).await?;
                object_listing_table(&listing, query.is_formatted())
            }
            (kind, handle) => Err(BridgeError::configuration(format!(
                "{} queries are not supported by a {} data source",
                kind.as_str(),
                handle.kind()
            ))),
        }
    }
}

impl Default for QueryDispatcher {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
