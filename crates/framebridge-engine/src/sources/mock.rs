//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Mock backends for testing
//!
//! In-memory implementations of every source trait plus a factory that
//! counts connections. Each mock can simulate latency, slow shutdown and
//! failures, including panics.

use async_trait::async_trait;
use framebridge_core::types::TimeRange;
use framebridge_core::{BridgeError, BridgeResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::factory::{ConnectionTarget, HandleFactory};
use super::records::{DatapointRequest, MetricMetadata, ObjectListing, RowSet, Series};
use super::{BackendHandle, MetricsClient, ObjectStoreClient, WideColumnSession};

/// Failure a mock should simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Authentication,
    Connection,
    Query,
    /// Panic inside the call
    Panic,
}

impl MockFailure {
    fn raise(&self, operation: &str) -> BridgeError {
        match self {
            MockFailure::Authentication => {
                BridgeError::authentication(format!("mock {} rejected credentials", operation))
            }
            MockFailure::Connection => {
                BridgeError::connection(format!("mock {} unreachable", operation))
            }
            MockFailure::Query => BridgeError::query(format!("mock {} failed", operation)),
            MockFailure::Panic => panic!("mock {} panicked", operation),
        }
    }
}

/// Shared knobs for every mock
#[derive(Debug, Default)]
struct Behaviour {
    delay: Option<Duration>,
    close_delay: Option<Duration>,
    failure: Option<MockFailure>,
    calls: AtomicUsize,
    closed: AtomicBool,
}

impl Behaviour {
    async fn call(&self, operation: &str) -> BridgeResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure {
            Some(failure) => Err(failure.raise(operation)),
            None => Ok(()),
        }
    }

    async fn close(&self) -> BridgeResult<()> {
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

macro_rules! behaviour_builders {
    ($ty:ty) => {
        impl $ty {
            /// Sleep this long before answering
            pub fn with_delay(mut self, delay: Duration) -> Self {
                self.behaviour.delay = Some(delay);
                self
            }

            /// Sleep this long inside `close`
            pub fn with_close_delay(mut self, delay: Duration) -> Self {
                self.behaviour.close_delay = Some(delay);
                self
            }

            pub fn with_failure(mut self, failure: MockFailure) -> Self {
                self.behaviour.failure = Some(failure);
                self
            }

            /// Number of backend calls made so far
            pub fn call_count(&self) -> usize {
                self.behaviour.calls.load(Ordering::SeqCst)
            }

            pub fn is_closed(&self) -> bool {
                self.behaviour.closed.load(Ordering::SeqCst)
            }
        }
    };
}

/// Wide-column session answering every statement with a fixed row set
#[derive(Debug, Default)]
pub struct MockWideColumnSession {
    rows: RowSet,
    behaviour: Behaviour,
    statements: Mutex<Vec<String>>,
}

impl MockWideColumnSession {
    pub fn new(rows: RowSet) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Statements executed so far
    pub async fn statements(&self) -> Vec<String> {
        self.statements.lock().await.clone()
    }
}

behaviour_builders!(MockWideColumnSession);

#[async_trait]
impl WideColumnSession for MockWideColumnSession {
    async fn execute(&self, statement: &str, _time_range: &TimeRange) -> BridgeResult<RowSet> {
        self.statements.lock().await.push(statement.to_string());
        self.behaviour.call("statement").await?;
        Ok(self.rows.clone())
    }

    async fn close(&self) -> BridgeResult<()> {
        self.behaviour.close().await
    }
}

/// Metrics client with a fixed catalog and fixed series
#[derive(Debug, Default)]
pub struct MockMetricsClient {
    metrics: Vec<MetricMetadata>,
    series: Vec<Series>,
    behaviour: Behaviour,
    requests: Mutex<Vec<DatapointRequest>>,
}

impl MockMetricsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, names: &[&str]) -> Self {
        self.metrics = names.iter().map(|n| MetricMetadata::new(*n)).collect();
        self
    }

    pub fn with_series(mut self, series: Vec<Series>) -> Self {
        self.series = series;
        self
    }

    /// Datapoint requests received so far
    pub async fn requests(&self) -> Vec<DatapointRequest> {
        self.requests.lock().await.clone()
    }
}

behaviour_builders!(MockMetricsClient);

#[async_trait]
impl MetricsClient for MockMetricsClient {
    async fn list_metrics(&self, filter: &str) -> BridgeResult<Vec<MetricMetadata>> {
        self.behaviour.call("metric listing").await?;
        let filter = filter.trim();
        Ok(self
            .metrics
            .iter()
            .filter(|m| filter.is_empty() || filter == "*" || m.name.contains(filter))
            .cloned()
            .collect())
    }

    async fn get_datapoints(&self, request: &DatapointRequest) -> BridgeResult<Vec<Series>> {
        self.requests.lock().await.push(request.clone());
        self.behaviour.call("datapoints").await?;
        Ok(self.series.clone())
    }

    async fn close(&self) -> BridgeResult<()> {
        self.behaviour.close().await
    }
}

/// Object store returning one fixed listing
#[derive(Debug, Default)]
pub struct MockObjectStore {
    listing: ObjectListing,
    behaviour: Behaviour,
    listed: Mutex<Vec<(String, String)>>,
}

impl MockObjectStore {
    pub fn new(listing: ObjectListing) -> Self {
        Self {
            listing,
            ..Default::default()
        }
    }

    /// `(bucket, prefix)` pairs listed so far
    pub async fn listed(&self) -> Vec<(String, String)> {
        self.listed.lock().await.clone()
    }
}

behaviour_builders!(MockObjectStore);

#[async_trait]
impl ObjectStoreClient for MockObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        _delimiter: &str,
    ) -> BridgeResult<ObjectListing> {
        self.listed
            .lock()
            .await
            .push((bucket.to_string(), prefix.to_string()));
        self.behaviour.call("object listing").await?;
        Ok(self.listing.clone())
    }

    async fn close(&self) -> BridgeResult<()> {
        self.behaviour.close().await
    }
}

type BuildHandle = dyn Fn(&ConnectionTarget) -> BackendHandle + Send + Sync;

/// Factory that builds handles with a closure and counts every connect
pub struct MockHandleFactory {
    build: Box<BuildHandle>,
    connect_delay: Option<Duration>,
    failure: Option<MockFailure>,
    connects: AtomicUsize,
    targets: Mutex<Vec<ConnectionTarget>>,
}

impl MockHandleFactory {
    pub fn new(build: impl Fn(&ConnectionTarget) -> BackendHandle + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
            connect_delay: None,
            failure: None,
            connects: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long inside every connect
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Fail every connect
    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Targets connected to so far, in order
    pub async fn targets(&self) -> Vec<ConnectionTarget> {
        self.targets.lock().await.clone()
    }
}

#[async_trait]
impl HandleFactory for MockHandleFactory {
    async fn connect(&self, target: &ConnectionTarget) -> BridgeResult<BackendHandle> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().await.push(target.clone());
        debug!("Mock connect to {}", target.host);

        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = self.failure {
            return Err(failure.raise("connect"));
        }
        Ok((self.build)(target))
    }
}

impl From<MockWideColumnSession> for BackendHandle {
    fn from(session: MockWideColumnSession) -> Self {
        BackendHandle::WideColumn(Arc::new(session))
    }
}

impl From<MockMetricsClient> for BackendHandle {
    fn from(client: MockMetricsClient) -> Self {
        BackendHandle::Metrics(Arc::new(client))
    }
}

impl From<MockObjectStore> for BackendHandle {
    fn from(store: MockObjectStore) -> Self {
        BackendHandle::ObjectStore(Arc::new(store))
    }
}
