//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Handle construction
//!
//! The instance manager never builds backend clients itself; it asks a
//! [`HandleFactory`] for one whenever a connection key has no live handle.

use async_trait::async_trait;
use framebridge_core::{BackendKind, BridgeError, BridgeResult, Credential};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use super::s3::S3ObjectStore;
use super::signalfx::SignalFxClient;
use super::BackendHandle;

/// Everything needed to open one backend connection
#[derive(Clone)]
pub struct ConnectionTarget {
    /// Host, API base URL or endpoint
    pub host: String,
    pub backend: BackendKind,
    pub credential: Option<Credential>,
    pub region: Option<String>,
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("host", &self.host)
            .field("backend", &self.backend)
            .field("credential", &self.credential.as_ref().map(|c| c.identity()))
            .field("region", &self.region)
            .finish()
    }
}

/// Builds backend handles
#[async_trait]
pub trait HandleFactory: Send + Sync {
    async fn connect(&self, target: &ConnectionTarget) -> BridgeResult<BackendHandle>;
}

/// Factory for the built-in metrics and object storage clients.
///
/// Wide-column sessions need a driver supplied by the embedder through
/// [`DefaultHandleFactory::with_wide_column`].
#[derive(Default)]
pub struct DefaultHandleFactory {
    wide_column: Option<Arc<dyn HandleFactory>>,
}

impl DefaultHandleFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegate wide-column connections to `connector`
    pub fn with_wide_column(mut self, connector: Arc<dyn HandleFactory>) -> Self {
        self.wide_column = Some(connector);
        self
    }
}

#[async_trait]
impl HandleFactory for DefaultHandleFactory {
    async fn connect(&self, target: &ConnectionTarget) -> BridgeResult<BackendHandle> {
        info!("Opening {} connection to {}", target.backend, target.host);
        match target.backend {
            BackendKind::Metrics => {
                let token = match &target.credential {
                    Some(Credential::Token(token)) => token.clone(),
                    Some(Credential::UsernamePassword { password, .. }) => password.clone(),
                    None => {
                        return Err(BridgeError::authentication(
                            "metrics data source requires an API token",
                        ))
                    }
                };
                let client = SignalFxClient::new(&target.host, token)?;
                Ok(BackendHandle::Metrics(Arc::new(client)))
            }
            BackendKind::ObjectStore => {
                let store = S3ObjectStore::connect(target).await?;
                Ok(BackendHandle::ObjectStore(Arc::new(store)))
            }
            BackendKind::WideColumn => match &self.wide_column {
                Some(connector) => connector.connect(target).await,
                None => Err(BridgeError::configuration(
                    "no wide-column connector registered",
                )),
            },
        }
    }
}
