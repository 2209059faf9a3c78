//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Main bridge configuration for framebridge
//!
//! This module provides the top-level configuration structure and its loaders.

use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use super::{DataSourceSettings, EngineConfig};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/framebridge.toml";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "FRAMEBRIDGE";

/// Main bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BridgeConfig {
    /// Query execution configuration
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Data source settings
    #[validate(nested)]
    pub datasource: DataSourceSettings,
}

impl BridgeConfig {
    /// Load configuration from file, with `FRAMEBRIDGE__*` environment overrides
    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| {
                BridgeError::configuration_with_source("Failed to load configuration", e)
            })?;

        let bridge_config: BridgeConfig = config.try_deserialize().map_err(|e| {
            BridgeError::configuration_with_source("Failed to deserialize configuration", e)
        })?;

        bridge_config.validate_config()?;
        Ok(bridge_config)
    }

    /// Load configuration from a JSON string
    pub fn from_str(content: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = serde_json::from_str(content).map_err(|e| {
            BridgeError::serialization_with_source("Failed to parse configuration", e)
        })?;

        config.validate_config()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate_config(&self) -> BridgeResult<()> {
        self.validate().map_err(|e| {
            BridgeError::validation_with_source("Configuration validation failed", e)
        })
    }
}
