//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Data source settings
//!
//! One settings blob describes one configured data source: which backend it
//! talks to, its default connection target and its decrypted secure fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use validator::Validate;

use super::credential::{short_digest, Credential};

/// Backend family a data source talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Wide-column store with dynamically typed columns
    WideColumn,

    /// Metrics timeseries API
    Metrics,

    /// Object storage listing API
    ObjectStore,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::WideColumn => "wide_column",
            BackendKind::Metrics => "metrics",
            BackendKind::ObjectStore => "object_store",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one configured data source
#[derive(Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DataSourceSettings {
    /// Data source identifier
    #[validate(length(min = 1, max = 128))]
    pub uid: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Backend family
    pub backend: BackendKind,

    /// Default connection target (host, API base URL or endpoint)
    #[serde(default)]
    pub host: Option<String>,

    /// Region for object storage
    #[serde(default)]
    pub region: Option<String>,

    /// Default bucket for object listings
    #[serde(default)]
    pub bucket: Option<String>,

    /// Last modification time of the settings; bumps invalidate handles
    #[serde(default)]
    pub updated: DateTime<Utc>,

    /// Decrypted secure fields
    #[serde(default, alias = "secureJsonData")]
    pub secure_json_data: HashMap<String, String>,
}

impl DataSourceSettings {
    pub fn new(uid: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            uid: uid.into(),
            name: String::new(),
            backend,
            host: None,
            region: None,
            bucket: None,
            updated: DateTime::<Utc>::default(),
            secure_json_data: HashMap::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_secret(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secure_json_data.insert(key.into(), value.into());
        self
    }

    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = updated;
        self
    }

    /// Default host, ignoring blank values
    pub fn default_host(&self) -> Option<&str> {
        self.host.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }

    /// Look up a secure field. Keys are matched case-insensitively because
    /// layered config sources may lowercase them.
    pub fn secret(&self, key: &str) -> Option<&str> {
        self.secure_json_data
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Credential from the secure fields: `user`/`password`, then
    /// `accessKey`/`secretKey`, then `token`/`apiToken`.
    pub fn credential(&self) -> Option<Credential> {
        let user = self.secret("user").or_else(|| self.secret("username"));
        if let (Some(user), Some(password)) = (user, self.secret("password")) {
            return Some(Credential::username_password(user, password));
        }
        if let (Some(access), Some(secret)) = (self.secret("accessKey"), self.secret("secretKey")) {
            return Some(Credential::username_password(access, secret));
        }
        self.secret("token")
            .or_else(|| self.secret("apiToken"))
            .map(Credential::token)
    }

    /// Digest identifying this exact configuration. Two settings with equal
    /// fingerprints may share connection handles.
    pub fn config_fingerprint(&self) -> String {
        let updated = self.updated.timestamp_millis().to_string();
        let credential = self
            .credential()
            .map(|c| c.fingerprint())
            .unwrap_or_default();
        short_digest(&[
            self.uid.as_str(),
            self.backend.as_str(),
            self.host.as_deref().unwrap_or(""),
            self.region.as_deref().unwrap_or(""),
            self.bucket.as_deref().unwrap_or(""),
            updated.as_str(),
            credential.as_str(),
        ])
    }
}

impl fmt::Debug for DataSourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut secure_keys: Vec<&String> = self.secure_json_data.keys().collect();
        secure_keys.sort();
        f.debug_struct("DataSourceSettings")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("updated", &self.updated)
            .field("secure_json_data", &secure_keys)
            .finish()
    }
}
