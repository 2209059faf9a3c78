//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Engine configuration for query execution

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Query execution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Per-query timeout in milliseconds
    #[validate(range(min = 1))]
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Upper bound on closing one backend handle, in milliseconds
    #[validate(range(min = 1))]
    #[serde(default = "default_dispose_timeout_ms")]
    pub dispose_timeout_ms: u64,

    /// Queries of one batch allowed in flight at once
    #[validate(range(min = 1, max = 1024))]
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    /// Enable debug logging
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

fn default_dispose_timeout_ms() -> u64 {
    5_000
}

fn default_max_concurrent_queries() -> usize {
    16
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            dispose_timeout_ms: default_dispose_timeout_ms(),
            max_concurrent_queries: default_max_concurrent_queries(),
            debug_logging: false,
        }
    }
}

impl EngineConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn dispose_timeout(&self) -> Duration {
        Duration::from_millis(self.dispose_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.dispose_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = EngineConfig {
            max_concurrent_queries: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
