//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Connection handle cache for one data source configuration

use dashmap::DashMap;
use framebridge_core::{BackendKind, BridgeError, BridgeResult, DataSourceSettings};
use futures::future::join_all;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sources::s3::DEFAULT_OBJECT_STORE_HOST;
use crate::sources::{BackendHandle, ConnectionTarget, HandleFactory};

/// Identity used for handles created without a credential
const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Lifecycle of an [`InstanceManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// No handle created yet
    Uninitialized,
    /// At least one handle created
    Active,
    /// Disposed; no further handles are handed out
    Disposed,
}

impl InstanceState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => InstanceState::Uninitialized,
            1 => InstanceState::Active,
            _ => InstanceState::Disposed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            InstanceState::Uninitialized => 0,
            InstanceState::Active => 1,
            InstanceState::Disposed => 2,
        }
    }
}

/// Cache key for a backend handle: target host plus credential identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleKey {
    host: String,
    identity: String,
}

impl HandleKey {
    pub fn new(host: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            identity: identity.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl fmt::Display for HandleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identity, self.host)
    }
}

type HandleCell = Arc<OnceCell<BackendHandle>>;

/// Lazily creates and caches one backend handle per [`HandleKey`].
///
/// Concurrent callers asking for the same key share a single creation
/// attempt. A failed creation leaves the key empty so the next caller
/// retries.
pub struct InstanceManager {
    id: Uuid,
    settings: DataSourceSettings,
    factory: Arc<dyn HandleFactory>,
    handles: DashMap<HandleKey, HandleCell>,
    state: AtomicU8,
    handles_created: AtomicUsize,
    dispose_timeout: Duration,
}

impl InstanceManager {
    pub fn new(
        settings: DataSourceSettings,
        factory: Arc<dyn HandleFactory>,
        dispose_timeout: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            factory,
            handles: DashMap::new(),
            state: AtomicU8::new(InstanceState::Uninitialized.as_u8()),
            handles_created: AtomicUsize::new(0),
            dispose_timeout,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &DataSourceSettings {
        &self.settings
    }

    pub fn state(&self) -> InstanceState {
        InstanceState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Number of live handles
    pub fn handle_count(&self) -> usize {
        self.handles
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Number of handles created over the manager's lifetime
    pub fn handles_created(&self) -> usize {
        self.handles_created.load(Ordering::SeqCst)
    }

    /// Resolve the cache key for an optional target override
    pub fn resolve_key(&self, target: Option<&str>) -> BridgeResult<HandleKey> {
        let host = target
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| self.settings.default_host())
            .or(match self.settings.backend {
                BackendKind::ObjectStore => Some(DEFAULT_OBJECT_STORE_HOST),
                _ => None,
            })
            .ok_or_else(|| {
                BridgeError::configuration(
                    "no host supplied for connection and no default host configured",
                )
            })?;

        let identity = self
            .settings
            .credential()
            .map(|c| c.identity())
            .unwrap_or_else(|| ANONYMOUS_IDENTITY.to_string());

        Ok(HandleKey::new(host, identity))
    }

    /// Return the live handle for `target`, creating it on first use
    pub async fn get_handle(&self, target: Option<&str>) -> BridgeResult<BackendHandle> {
        let key = self.resolve_key(target)?;

        loop {
            self.ensure_not_disposed()?;

            let cell = match self.handles.get(&key).map(|entry| entry.value().clone()) {
                Some(cell) => cell,
                None => self.handles.entry(key.clone()).or_default().value().clone(),
            };
            if let Some(handle) = cell.get() {
                return Ok(handle.clone());
            }

            let connection = ConnectionTarget {
                host: key.host().to_string(),
                backend: self.settings.backend,
                credential: self.settings.credential(),
                region: self.settings.region.clone(),
            };
            let factory = Arc::clone(&self.factory);
            let created = &self.handles_created;
            let created_here = AtomicBool::new(false);
            let created_flag = &created_here;
            let handle = cell
                .get_or_try_init(|| async move {
                    debug!("Creating {} handle for {}", connection.backend, connection.host);
                    let handle = factory.connect(&connection).await?;
                    created.fetch_add(1, Ordering::SeqCst);
                    created_flag.store(true, Ordering::SeqCst);
                    Ok::<_, BridgeError>(handle)
                })
                .await?
                .clone();

            // The cell may have been invalidated or drained by disposal while
            // the handle was being created. Nobody else will close it then.
            let tracked = self.is_tracked(&key, &cell);
            if !tracked && created_here.load(Ordering::SeqCst) {
                close_handle(&key, &handle, self.dispose_timeout).await;
            }
            if self.state() == InstanceState::Disposed {
                return Err(BridgeError::configuration(
                    "data source instance was disposed",
                ));
            }
            if !tracked {
                debug!("Handle {} was invalidated during creation, retrying", key);
                continue;
            }

            if self
                .state
                .compare_exchange(
                    InstanceState::Uninitialized.as_u8(),
                    InstanceState::Active.as_u8(),
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                info!("Data source {} instance {} active", self.settings.uid, self.id);
            }
            return Ok(handle);
        }
    }

    fn is_tracked(&self, key: &HandleKey, cell: &HandleCell) -> bool {
        self.handles
            .get(key)
            .map(|entry| Arc::ptr_eq(entry.value(), cell))
            .unwrap_or(false)
    }

    /// Drop and close the handle for `key`. The next request creates a new one.
    pub async fn invalidate(&self, key: &HandleKey) -> bool {
        match self.handles.remove(key) {
            Some((key, cell)) => {
                if let Some(handle) = cell.get() {
                    close_handle(&key, handle, self.dispose_timeout).await;
                }
                info!("Invalidated handle {}", key);
                true
            }
            None => false,
        }
    }

    /// Close every handle and refuse further requests. Safe to call again.
    pub async fn dispose_all(&self) {
        if self.mark_disposed() {
            self.release_handles().await;
        } else {
            debug!("Instance {} already disposed", self.id);
        }
    }

    /// Flip to `Disposed`; true if this call made the transition
    pub(crate) fn mark_disposed(&self) -> bool {
        self.state.swap(InstanceState::Disposed.as_u8(), Ordering::SeqCst)
            != InstanceState::Disposed.as_u8()
    }

    /// Close every cached handle concurrently, each bounded by the dispose
    /// timeout
    pub(crate) async fn release_handles(&self) {
        let keys: Vec<HandleKey> = self.handles.iter().map(|e| e.key().clone()).collect();
        let live: Vec<(HandleKey, BackendHandle)> = keys
            .into_iter()
            .filter_map(|key| self.handles.remove(&key))
            .filter_map(|(key, cell)| cell.get().cloned().map(|handle| (key, handle)))
            .collect();

        let count = live.len();
        let timeout = self.dispose_timeout;
        join_all(
            live.iter()
                .map(|(key, handle)| close_handle(key, handle, timeout)),
        )
        .await;

        info!(
            "Disposed instance {} of data source {} ({} handles)",
            self.id, self.settings.uid, count
        );
    }

    fn ensure_not_disposed(&self) -> BridgeResult<()> {
        if self.state() == InstanceState::Disposed {
            return Err(BridgeError::configuration(
                "data source instance was disposed",
            ));
        }
        Ok(())
    }
}

async fn close_handle(key: &HandleKey, handle: &BackendHandle, timeout: Duration) {
    match tokio::time::timeout(timeout, handle.close()).await {
        Ok(Ok(())) => debug!("Closed handle {}", key),
        Ok(Err(e)) => warn!("Failed to close handle {}: {}", key, e),
        Err(_) => warn!("Handle {} did not close within {:?}, abandoning", key, timeout),
    }
}

impl fmt::Debug for InstanceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceManager")
            .field("id", &self.id)
            .field("uid", &self.settings.uid)
            .field("state", &self.state())
            .field("handles", &self.handles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::{MockFailure, MockHandleFactory, MockMetricsClient};
    use framebridge_core::Credential;

    fn settings() -> DataSourceSettings {
        DataSourceSettings::new("sfx", BackendKind::Metrics)
            .with_host("api.example.test")
            .with_secret("token", "t")
    }

    fn manager(factory: Arc<MockHandleFactory>) -> InstanceManager {
        InstanceManager::new(settings(), factory, Duration::from_millis(200))
    }

    fn metrics_factory() -> Arc<MockHandleFactory> {
        Arc::new(MockHandleFactory::new(|_| MockMetricsClient::new().into()))
    }

    #[test]
    fn test_resolve_key() {
        let manager = manager(metrics_factory());
        let key = manager.resolve_key(None).unwrap();
        assert_eq!(key.host(), "api.example.test");
        assert_eq!(key.identity(), Credential::token("t").identity());

        let key = manager.resolve_key(Some("  other.example.test ")).unwrap();
        assert_eq!(key.host(), "other.example.test");
    }

    #[test]
    fn test_missing_host_is_configuration_error() {
        let manager = InstanceManager::new(
            DataSourceSettings::new("ds", BackendKind::WideColumn),
            metrics_factory(),
            Duration::from_millis(200),
        );
        let err = manager.resolve_key(Some("")).unwrap_err();
        assert_eq!(err.error_type(), "Configuration");
        assert!(err.to_string().contains("no host supplied for connection"));
    }

    #[test]
    fn test_object_store_falls_back_to_default_host() {
        let manager = InstanceManager::new(
            DataSourceSettings::new("s3", BackendKind::ObjectStore),
            metrics_factory(),
            Duration::from_millis(200),
        );
        let key = manager.resolve_key(None).unwrap();
        assert_eq!(key.host(), DEFAULT_OBJECT_STORE_HOST);
        assert_eq!(key.identity(), ANONYMOUS_IDENTITY);
    }

    #[tokio::test]
    async fn test_handle_is_cached() {
        let factory = metrics_factory();
        let manager = manager(factory.clone());
        assert_eq!(manager.state(), InstanceState::Uninitialized);

        let a = manager.get_handle(None).await.unwrap();
        let b = manager.get_handle(None).await.unwrap();
        assert!(a.same_instance(&b));
        assert_eq!(factory.connect_count(), 1);
        assert_eq!(manager.handles_created(), 1);
        assert_eq!(manager.state(), InstanceState::Active);
        assert_eq!(manager.handle_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_targets_get_distinct_handles() {
        let factory = metrics_factory();
        let manager = manager(factory.clone());
        let a = manager.get_handle(Some("a.example.test")).await.unwrap();
        let b = manager.get_handle(Some("b.example.test")).await.unwrap();
        assert!(!a.same_instance(&b));
        assert_eq!(manager.handle_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_creation_is_retried() {
        let factory = Arc::new(
            MockHandleFactory::new(|_| MockMetricsClient::new().into())
                .with_failure(MockFailure::Connection),
        );
        let manager = manager(factory.clone());
        assert!(manager.get_handle(None).await.is_err());
        assert!(manager.get_handle(None).await.is_err());
        assert_eq!(factory.connect_count(), 2);
        assert_eq!(manager.handle_count(), 0);
        assert_eq!(manager.state(), InstanceState::Uninitialized);
    }

    #[tokio::test]
    async fn test_invalidate_creates_new_handle() {
        let factory = metrics_factory();
        let manager = manager(factory.clone());
        let first = manager.get_handle(None).await.unwrap();
        let key = manager.resolve_key(None).unwrap();

        assert!(manager.invalidate(&key).await);
        assert!(!manager.invalidate(&key).await);

        let second = manager.get_handle(None).await.unwrap();
        assert!(!first.same_instance(&second));
        assert_eq!(factory.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_final() {
        let manager = manager(metrics_factory());
        manager.get_handle(None).await.unwrap();

        manager.dispose_all().await;
        manager.dispose_all().await;

        assert_eq!(manager.state(), InstanceState::Disposed);
        assert_eq!(manager.handle_count(), 0);
        let err = manager.get_handle(None).await.unwrap_err();
        assert_eq!(err.error_type(), "Configuration");
    }

    #[tokio::test]
    async fn test_invalidate_during_creation_closes_orphan() {
        let clients: Arc<std::sync::Mutex<Vec<Arc<MockMetricsClient>>>> = Default::default();
        let recorded = Arc::clone(&clients);
        let factory = Arc::new(
            MockHandleFactory::new(move |_| {
                let client = Arc::new(MockMetricsClient::new());
                recorded.lock().unwrap().push(Arc::clone(&client));
                BackendHandle::Metrics(client)
            })
            .with_connect_delay(Duration::from_millis(200)),
        );
        let manager = Arc::new(manager(factory.clone()));

        let creating = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_handle(None).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let key = manager.resolve_key(None).unwrap();
        assert!(manager.invalidate(&key).await);

        let handle = creating.await.unwrap().unwrap();
        let again = manager.get_handle(None).await.unwrap();
        assert!(handle.same_instance(&again));
        assert_eq!(factory.connect_count(), 2);
        assert_eq!(manager.handle_count(), 1);

        manager.dispose_all().await;
        let clients = clients.lock().unwrap();
        assert_eq!(clients.len(), 2);
        assert!(clients.iter().all(|c| c.is_closed()));
    }
}
