//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Configuration management for framebridge
//!
//! Type-safe settings for the data source, its credentials and the engine,
//! loaded from files or JSON and validated before use.

pub mod bridge;
pub mod credential;
pub mod engine;
pub mod settings;

// Re-export commonly used types
pub use bridge::{BridgeConfig, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use credential::Credential;
pub use engine::EngineConfig;
pub use settings::{BackendKind, DataSourceSettings};
