//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Batch execution
//!
//! Fans a batch out into one task per query, bounded by a semaphore. Each
//! task acquires its backend handle, dispatches, and records its own outcome.
//! A failing or panicking query never affects its siblings.

use chrono::{DateTime, Utc};
use framebridge_core::types::{BatchRequest, BatchResponse, Query, Table};
use framebridge_core::{BridgeError, BridgeResult, EngineConfig, BRIDGE_NAME};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::assembler::ResponseAssembler;
use crate::dispatcher::QueryDispatcher;
use crate::health::HealthCheckResult;
use crate::instances::{InstanceManager, InstanceProvider};
use crate::sources::HandleFactory;

/// Executor statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorStats {
    /// Batches executed
    pub total_batches: u64,

    /// Queries executed across all batches
    pub total_queries: u64,

    /// Queries that ended in an error, cancellations included
    pub failed_queries: u64,

    /// Queries that were cancelled
    pub cancelled_queries: u64,

    /// Total batch execution time in milliseconds
    pub total_execution_time_ms: u64,

    /// Average batch execution time in milliseconds
    pub avg_execution_time_ms: f64,

    /// Completion time of the last batch
    pub last_execution_time: Option<DateTime<Utc>>,
}

/// Executes query batches against the data source they name
pub struct BatchExecutor {
    config: EngineConfig,
    provider: Arc<InstanceProvider>,
    dispatcher: QueryDispatcher,
    stats: Arc<RwLock<ExecutorStats>>,
}

impl BatchExecutor {
    pub fn new(config: EngineConfig, factory: Arc<dyn HandleFactory>) -> Self {
        let provider = Arc::new(InstanceProvider::new(factory, config.dispose_timeout()));
        Self {
            dispatcher: QueryDispatcher::from_config(&config),
            provider,
            config,
            stats: Arc::new(RwLock::new(ExecutorStats::default())),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<InstanceProvider> {
        &self.provider
    }

    /// Run every query of a batch and collect one outcome per identifier.
    ///
    /// Only invalid settings fail the whole call; every other failure is
    /// recorded against its query. When `cancel` fires, queries still in
    /// flight stop and report a cancellation error.
    pub async fn query_data(
        &self,
        request: BatchRequest,
        cancel: CancellationToken,
    ) -> BridgeResult<BatchResponse> {
        let started = Instant::now();
        let BatchRequest { settings, queries } = request;
        let manager = self.provider.get(&settings).await?;

        let assembler = Arc::new(ResponseAssembler::new(
            queries.iter().map(|q| q.ref_id.clone()),
        ));
        let batch_cancel = cancel.child_token();
        // Dropping this future stops every task it spawned.
        let _cancel_on_drop = batch_cancel.clone().drop_guard();
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_queries));

        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(queries.len());
        for mut query in queries {
            if !seen.insert(query.ref_id.clone()) {
                warn!("Skipping duplicate query id {}", query.ref_id);
                continue;
            }
            if query.bucket.is_none() {
                query.bucket = settings.bucket.clone();
            }

            let job = QueryJob {
                manager: Arc::clone(&manager),
                dispatcher: self.dispatcher.clone(),
                assembler: Arc::clone(&assembler),
                permits: Arc::clone(&permits),
                cancel: batch_cancel.clone(),
                connect_timeout: self.config.query_timeout(),
            };
            let ref_id = query.ref_id.clone();
            tasks.push((ref_id, tokio::spawn(job.run(query))));
        }

        for (ref_id, task) in tasks {
            if let Err(join_error) = task.await {
                let error = if join_error.is_panic() {
                    let reason = panic_reason(join_error.into_panic());
                    error!("Query {} panicked: {}", ref_id, reason);
                    BridgeError::internal(format!("query {} panicked: {}", ref_id, reason))
                } else {
                    BridgeError::cancelled(format!("query {} was aborted", ref_id))
                };
                assembler.assemble(&ref_id, Err(error));
            }
        }

        let response = assembler.finish();
        let elapsed = started.elapsed();
        self.record(&response, elapsed).await;
        info!(
            "Batch for data source {} finished: {} queries, {} failed, {:?}",
            settings.uid,
            response.len(),
            response.error_count(),
            elapsed
        );
        Ok(response)
    }

    /// Static health probe; reports healthy without contacting the backend
    pub async fn check_health(&self) -> HealthCheckResult {
        debug!("Health check requested");
        HealthCheckResult::healthy(BRIDGE_NAME)
    }

    pub async fn get_stats(&self) -> ExecutorStats {
        self.stats.read().await.clone()
    }

    /// Dispose the current instance and all its handles
    pub async fn shutdown(&self) {
        info!("Shutting down batch executor");
        self.provider.dispose().await;
    }

    async fn record(&self, response: &BatchResponse, elapsed: Duration) {
        let cancelled = response
            .iter()
            .filter(|(_, r)| {
                r.error
                    .as_ref()
                    .map(|e| matches!(e, BridgeError::Cancelled { .. }))
                    .unwrap_or(false)
            })
            .count() as u64;

        let mut stats = self.stats.write().await;
        stats.total_batches += 1;
        stats.total_queries += response.len() as u64;
        stats.failed_queries += response.error_count() as u64;
        stats.cancelled_queries += cancelled;
        stats.total_execution_time_ms += elapsed.as_millis() as u64;
        stats.avg_execution_time_ms =
            stats.total_execution_time_ms as f64 / stats.total_batches as f64;
        stats.last_execution_time = Some(Utc::now());
    }
}

/// Everything one query task needs
struct QueryJob {
    manager: Arc<InstanceManager>,
    dispatcher: QueryDispatcher,
    assembler: Arc<ResponseAssembler>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    connect_timeout: Duration,
}

impl QueryJob {
    async fn run(self, query: Query) {
        let result = self.execute(&query).await;
        match &result {
            Ok(table) => debug!("Query {} returned {} rows", query.ref_id, table.row_count()),
            Err(e) => warn!("Query {} failed: {} ({})", query.ref_id, e, e.context()),
        }
        self.assembler.assemble(&query.ref_id, result);
    }

    async fn execute(&self, query: &Query) -> BridgeResult<Table> {
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(cancelled(query)),
            permit = Arc::clone(&self.permits).acquire_owned() => permit.map_err(|e| {
                BridgeError::internal_with_source("query permits closed", e)
            })?,
        };

        let connect = tokio::time::timeout(
            self.connect_timeout,
            self.manager.get_handle(query.target.as_deref()),
        );
        let handle = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(cancelled(query)),
            handle = connect => handle.map_err(|_| {
                BridgeError::timeout(format!(
                    "query {} could not connect within {:?}",
                    query.ref_id, self.connect_timeout
                ))
            })??,
        };

        self.dispatcher.execute(query, &handle, &self.cancel).await
    }
}

fn cancelled(query: &Query) -> BridgeError {
    BridgeError::cancelled(format!("query {} cancelled", query.ref_id))
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HEALTHY_MESSAGE;
    use crate::sources::mock::{MockHandleFactory, MockMetricsClient};
    use framebridge_core::types::QueryKind;
    use framebridge_core::{BackendKind, DataSourceSettings};

    fn executor() -> BatchExecutor {
        BatchExecutor::new(
            EngineConfig::default(),
            Arc::new(MockHandleFactory::new(|_| {
                MockMetricsClient::new().with_metrics(&["cpu"]).into()
            })),
        )
    }

    fn settings() -> DataSourceSettings {
        DataSourceSettings::new("sfx", BackendKind::Metrics)
            .with_host("api.example.test")
            .with_secret("token", "t")
    }

    #[test]
    fn test_panic_reason() {
        assert_eq!(panic_reason(Box::new("boom")), "boom");
        assert_eq!(panic_reason(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_reason(Box::new(5u8)), "unknown panic");
    }

    #[tokio::test]
    async fn test_health_is_static() {
        let result = executor().check_health().await;
        assert!(result.is_healthy());
        assert_eq!(result.message, HEALTHY_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let executor = executor();
        let response = executor
            .query_data(
                BatchRequest::new(settings(), Vec::new()),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_stats_are_recorded() {
        let executor = executor();
        let request = BatchRequest::new(
            settings(),
            vec![
                Query::new("A", QueryKind::ListMetrics),
                Query::new("B", QueryKind::Statement),
            ],
        );
        executor
            .query_data(request, CancellationToken::new())
            .await
            .unwrap();

        let stats = executor.get_stats().await;
        assert_eq!(stats.total_batches, 1);
        assert_eq!(stats.total_queries, 2);
        assert_eq!(stats.failed_queries, 1);
        assert_eq!(stats.cancelled_queries, 0);
        assert!(stats.last_execution_time.is_some());
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_the_batch() {
        let executor = executor();
        let request = BatchRequest::new(
            DataSourceSettings::new("", BackendKind::Metrics),
            vec![Query::new("A", QueryKind::ListMetrics)],
        );
        let err = executor
            .query_data(request, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "Validation");
    }
}
