//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! framebridge core
//!
//! Shared building blocks for the framebridge query bridge: the error
//! taxonomy, data source and engine configuration, and the uniform
//! column-oriented table model every backend result is normalized into.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{BackendKind, BridgeConfig, Credential, DataSourceSettings, EngineConfig};
pub use error::{BridgeError, BridgeResult};
pub use types::{
    BatchRequest, BatchResponse, Column, ColumnValues, DeclaredType, DisplayHints, Query,
    QueryKind, QueryResponse, Table, TableMeta, TimeRange, TypedValue, ValueKind,
};

/// Bridge version information
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bridge name
pub const BRIDGE_NAME: &str = "framebridge";
