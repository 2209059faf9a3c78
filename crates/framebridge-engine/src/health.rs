//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Health check results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message reported by a healthy data source
pub const HEALTHY_MESSAGE: &str = "Data source is working";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub component: String,
    pub status: HealthStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn new(component: impl Into<String>, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn healthy(component: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Healthy, HEALTHY_MESSAGE)
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
