//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! framebridge engine
//!
//! Executes batches of heterogeneous queries against wide-column, metrics
//! and object storage backends and normalizes every result into a
//! [`framebridge_core::Table`]. Connection handles are cached per target and
//! credential, and replaced when the data source settings change.

pub mod assembler;
pub mod coercion;
pub mod dispatcher;
pub mod executor;
pub mod health;
pub mod instances;
pub mod materializer;
pub mod sources;
pub mod tables;

// Re-export commonly used types
pub use assembler::ResponseAssembler;
pub use coercion::{coerce, NativeValue};
pub use dispatcher::QueryDispatcher;
pub use executor::{BatchExecutor, ExecutorStats};
pub use health::{HealthCheckResult, HealthStatus};
pub use instances::{HandleKey, InstanceManager, InstanceProvider, InstanceState};
pub use materializer::{materialize_column, materialize_row_set, new_column_buffer};
pub use sources::{
    BackendHandle, ConnectionTarget, DefaultHandleFactory, HandleFactory, MetricsClient,
    ObjectStoreClient, WideColumnSession,
};

/// Engine version information
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
