//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Settings-aware instance provider
//!
//! Hands out one [`InstanceManager`] per data source uid. When the settings
//! fingerprint for a uid changes, that uid's manager is swapped out and
//! disposed; managers of other data sources are untouched.

use framebridge_core::{BridgeError, BridgeResult, DataSourceSettings};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;
use validator::Validate;

use super::manager::InstanceManager;
use crate::sources::HandleFactory;

struct CurrentInstance {
    fingerprint: String,
    manager: Arc<InstanceManager>,
}

/// Owns the live [`InstanceManager`] of each data source
pub struct InstanceProvider {
    factory: Arc<dyn HandleFactory>,
    dispose_timeout: Duration,
    instances: RwLock<HashMap<String, CurrentInstance>>,
}

impl InstanceProvider {
    pub fn new(factory: Arc<dyn HandleFactory>, dispose_timeout: Duration) -> Self {
        Self {
            factory,
            dispose_timeout,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Manager for `settings`, replacing the one registered for the same uid
    /// if its settings changed
    pub async fn get(&self, settings: &DataSourceSettings) -> BridgeResult<Arc<InstanceManager>> {
        settings.validate().map_err(|e| {
            BridgeError::validation_with_source("invalid data source settings", e)
        })?;
        let fingerprint = settings.config_fingerprint();

        {
            let instances = self.instances.read().await;
            if let Some(instance) = instances
                .get(&settings.uid)
                .filter(|c| c.fingerprint == fingerprint)
            {
                return Ok(Arc::clone(&instance.manager));
            }
        }

        let (previous, manager) = {
            let mut instances = self.instances.write().await;
            if let Some(instance) = instances
                .get(&settings.uid)
                .filter(|c| c.fingerprint == fingerprint)
            {
                return Ok(Arc::clone(&instance.manager));
            }

            let manager = Arc::new(InstanceManager::new(
                settings.clone(),
                Arc::clone(&self.factory),
                self.dispose_timeout,
            ));
            let previous = instances.insert(
                settings.uid.clone(),
                CurrentInstance {
                    fingerprint,
                    manager: Arc::clone(&manager),
                },
            );
            // Retire the old manager before any reader can see the new one.
            if let Some(previous) = &previous {
                previous.manager.mark_disposed();
            }
            info!(
                "Data source {} using instance {}",
                settings.uid,
                manager.id()
            );
            (previous, manager)
        };

        if let Some(previous) = previous {
            info!(
                "Settings for data source {} changed, disposing instance {}",
                previous.manager.settings().uid,
                previous.manager.id()
            );
            previous.manager.release_handles().await;
        }
        Ok(manager)
    }

    /// The current manager for data source `uid`, if any
    pub async fn current(&self, uid: &str) -> Option<Arc<InstanceManager>> {
        self.instances
            .read()
            .await
            .get(uid)
            .map(|c| Arc::clone(&c.manager))
    }

    /// Number of data sources with a live manager
    pub async fn instance_count(&self) -> usize {
        self.instances.read().await.len()
    }

    /// Dispose every manager
    pub async fn dispose(&self) {
        let instances: Vec<CurrentInstance> =
            self.instances.write().await.drain().map(|(_, c)| c).collect();
        join_all(instances.iter().map(|c| c.manager.dispose_all())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instances::InstanceState;
    use crate::sources::mock::{MockHandleFactory, MockMetricsClient};
    use framebridge_core::BackendKind;

    fn provider() -> InstanceProvider {
        InstanceProvider::new(
            Arc::new(MockHandleFactory::new(|_| MockMetricsClient::new().into())),
            Duration::from_millis(200),
        )
    }

    fn settings() -> DataSourceSettings {
        DataSourceSettings::new("sfx", BackendKind::Metrics)
            .with_host("api.example.test")
            .with_secret("token", "t")
    }

    #[tokio::test]
    async fn test_same_settings_share_manager() {
        let provider = provider();
        let a = provider.get(&settings()).await.unwrap();
        let b = provider.get(&settings()).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_changed_settings_replace_manager() {
        let provider = provider();
        let old = provider.get(&settings()).await.unwrap();
        old.get_handle(None).await.unwrap();

        let changed = settings().with_secret("token", "rotated");
        let new = provider.get(&changed).await.unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(old.state(), InstanceState::Disposed);
        assert_eq!(old.handle_count(), 0);
        assert_eq!(new.state(), InstanceState::Uninitialized);
        assert!(Arc::ptr_eq(&provider.current("sfx").await.unwrap(), &new));
        assert_eq!(provider.instance_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let provider = provider();
        let err = provider
            .get(&DataSourceSettings::new("", BackendKind::Metrics))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "Validation");
        assert_eq!(provider.instance_count().await, 0);
    }

    #[tokio::test]
    async fn test_dispose() {
        let provider = provider();
        let manager = provider.get(&settings()).await.unwrap();
        provider.dispose().await;
        provider.dispose().await;
        assert_eq!(manager.state(), InstanceState::Disposed);
        assert_eq!(provider.instance_count().await, 0);
    }

    #[tokio::test]
    async fn test_data_sources_keep_separate_managers() {
        let provider = provider();
        let first = provider.get(&settings()).await.unwrap();
        let other = DataSourceSettings::new("sfx-eu", BackendKind::Metrics)
            .with_host("api.eu.example.test")
            .with_secret("token", "t");
        let second = provider.get(&other).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first.state(), InstanceState::Disposed);
        assert!(Arc::ptr_eq(&provider.get(&settings()).await.unwrap(), &first));
        assert_eq!(provider.instance_count().await, 2);

        provider.dispose().await;
        assert_eq!(first.state(), InstanceState::Disposed);
        assert_eq!(second.state(), InstanceState::Disposed);
    }
}
