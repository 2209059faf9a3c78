//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Error handling for the framebridge query bridge
//!
//! This module provides structured error types with context for every
//! failure a query response can carry.

pub mod context;
pub mod conversions;
pub mod types;

// Re-export commonly used types
pub use context::ErrorContext;
pub use types::{BridgeError, BridgeResult};
