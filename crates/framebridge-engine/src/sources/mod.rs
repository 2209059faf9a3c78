//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Backend sources
//!
//! One trait per backend family, the records those backends return, and the
//! [`BackendHandle`] the instance manager caches per connection key.

pub mod factory;
pub mod mock;
pub mod records;
pub mod s3;
pub mod signalfx;

pub use factory::{ConnectionTarget, DefaultHandleFactory, HandleFactory};
pub use records::{
    ColumnSpec, DatapointRequest, MetricMetadata, ObjectEntry, ObjectListing, RowSet, Series,
    SeriesPoint,
};
pub use s3::S3ObjectStore;
pub use signalfx::SignalFxClient;

use async_trait::async_trait;
use framebridge_core::types::TimeRange;
use framebridge_core::{BackendKind, BridgeResult};
use std::fmt;
use std::sync::Arc;

/// Session against a wide-column store
#[async_trait]
pub trait WideColumnSession: Send + Sync {
    /// Execute a statement and return its rows with the declared column types
    async fn execute(&self, statement: &str, time_range: &TimeRange) -> BridgeResult<RowSet>;

    /// Release the session
    async fn close(&self) -> BridgeResult<()>;
}

/// Client for a metrics timeseries API
#[async_trait]
pub trait MetricsClient: Send + Sync {
    /// List metric metadata matching a filter; an empty filter lists everything
    async fn list_metrics(&self, filter: &str) -> BridgeResult<Vec<MetricMetadata>>;

    /// Fetch datapoints for a program over a time window
    async fn get_datapoints(&self, request: &DatapointRequest) -> BridgeResult<Vec<Series>>;

    async fn close(&self) -> BridgeResult<()> {
        Ok(())
    }
}

/// Client for an object storage listing API
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// List one level of keys under `prefix`, grouping deeper keys into
    /// common prefixes by `delimiter`
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> BridgeResult<ObjectListing>;

    async fn close(&self) -> BridgeResult<()> {
        Ok(())
    }
}

/// A live, shareable connection to one backend
#[derive(Clone)]
pub enum BackendHandle {
    WideColumn(Arc<dyn WideColumnSession>),
    Metrics(Arc<dyn MetricsClient>),
    ObjectStore(Arc<dyn ObjectStoreClient>),
}

impl BackendHandle {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendHandle::WideColumn(_) => BackendKind::WideColumn,
            BackendHandle::Metrics(_) => BackendKind::Metrics,
            BackendHandle::ObjectStore(_) => BackendKind::ObjectStore,
        }
    }

    /// Release the underlying connection
    pub async fn close(&self) -> BridgeResult<()> {
        match self {
            BackendHandle::WideColumn(session) => session.close().await,
            BackendHandle::Metrics(client) => client.close().await,
            BackendHandle::ObjectStore(store) => store.close().await,
        }
    }

    /// Whether both handles point at the same connection
    pub fn same_instance(&self, other: &BackendHandle) -> bool {
        fn addr<T: ?Sized>(arc: &Arc<T>) -> *const () {
            Arc::as_ptr(arc) as *const ()
        }
        match (self, other) {
            (BackendHandle::WideColumn(a), BackendHandle::WideColumn(b)) => addr(a) == addr(b),
            (BackendHandle::Metrics(a), BackendHandle::Metrics(b)) => addr(a) == addr(b),
            (BackendHandle::ObjectStore(a), BackendHandle::ObjectStore(b)) => addr(a) == addr(b),
            _ => false,
        }
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BackendHandle").field(&self.kind()).finish()
    }
}
