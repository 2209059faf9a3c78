//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Core type definitions for the framebridge query bridge
//!
//! This module provides the request, value, column, table and response
//! structures shared by the engine and its callers.

pub mod column;
pub mod query;
pub mod response;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use column::{Column, ColumnValues, DisplayHints};
pub use query::{BatchRequest, Query, QueryKind, TimeRange};
pub use response::{BatchResponse, QueryResponse};
pub use table::{Table, TableMeta};
pub use value::{DeclaredType, TypedValue, ValueKind};
