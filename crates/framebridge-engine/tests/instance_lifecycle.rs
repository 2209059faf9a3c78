//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Handle caching, invalidation and disposal tests

use framebridge_core::types::{BatchRequest, Query, QueryKind};
use framebridge_core::{BackendKind, DataSourceSettings, EngineConfig};
use framebridge_engine::sources::mock::{MockHandleFactory, MockWideColumnSession};
use framebridge_engine::sources::RowSet;
use framebridge_engine::{BackendHandle, BatchExecutor, InstanceProvider, InstanceState};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

type Sessions = Arc<Mutex<Vec<Arc<MockWideColumnSession>>>>;

/// Factory that builds a fresh session per connect and remembers each one
fn recording_factory(
    connect_delay: Duration,
    close_delay: Option<Duration>,
) -> (Arc<MockHandleFactory>, Sessions) {
    let sessions: Sessions = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&sessions);
    let factory = MockHandleFactory::new(move |_| {
        let mut session = MockWideColumnSession::new(RowSet::default());
        if let Some(delay) = close_delay {
            session = session.with_close_delay(delay);
        }
        let session = Arc::new(session);
        recorded.lock().unwrap().push(Arc::clone(&session));
        BackendHandle::WideColumn(session)
    })
    .with_connect_delay(connect_delay);
    (Arc::new(factory), sessions)
}

fn settings() -> DataSourceSettings {
    DataSourceSettings::new("scylla", BackendKind::WideColumn)
        .with_host("10.0.0.1")
        .with_secret("user", "cassandra")
        .with_secret("password", "cassandra")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_handle() {
    let (factory, sessions) = recording_factory(Duration::from_millis(50), None);
    let provider = InstanceProvider::new(factory.clone(), Duration::from_millis(200));
    let manager = provider.get(&settings()).await.unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_handle(None).await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }

    assert_eq!(factory.connect_count(), 1);
    assert_eq!(sessions.lock().unwrap().len(), 1);
    assert!(handles.iter().all(|h| h.same_instance(&handles[0])));
    assert_eq!(manager.state(), InstanceState::Active);
}

#[tokio::test]
async fn test_settings_change_replaces_and_closes_handles() {
    let (factory, sessions) = recording_factory(Duration::ZERO, None);
    let provider = InstanceProvider::new(factory.clone(), Duration::from_millis(200));

    let old_manager = provider.get(&settings()).await.unwrap();
    let old_handle = old_manager.get_handle(None).await.unwrap();

    let rotated = settings().with_secret("password", "rotated");
    let new_manager = provider.get(&rotated).await.unwrap();
    let new_handle = new_manager.get_handle(None).await.unwrap();

    assert!(!old_handle.same_instance(&new_handle));
    assert_eq!(factory.connect_count(), 2);
    assert_eq!(old_manager.state(), InstanceState::Disposed);
    assert!(old_manager.get_handle(None).await.is_err());

    let sessions = sessions.lock().unwrap();
    assert!(sessions[0].is_closed());
    assert!(!sessions[1].is_closed());
}

#[tokio::test]
async fn test_invalidate_then_reconnect() {
    let (factory, sessions) = recording_factory(Duration::ZERO, None);
    let provider = InstanceProvider::new(factory.clone(), Duration::from_millis(200));
    let manager = provider.get(&settings()).await.unwrap();

    let first = manager.get_handle(None).await.unwrap();
    let key = manager.resolve_key(None).unwrap();
    assert!(manager.invalidate(&key).await);
    let second = manager.get_handle(None).await.unwrap();

    assert!(!first.same_instance(&second));
    assert!(sessions.lock().unwrap()[0].is_closed());
    assert_eq!(manager.handles_created(), 2);
    assert_eq!(factory.connect_count(), 2);
}

#[tokio::test]
async fn test_dispose_does_not_wait_for_hung_close() {
    let (factory, sessions) = recording_factory(Duration::ZERO, Some(Duration::from_secs(30)));
    let provider = InstanceProvider::new(factory, Duration::from_millis(50));
    let manager = provider.get(&settings()).await.unwrap();
    manager.get_handle(None).await.unwrap();
    manager.get_handle(Some("10.0.0.2")).await.unwrap();

    let started = Instant::now();
    provider.dispose().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(manager.state(), InstanceState::Disposed);
    assert_eq!(manager.handle_count(), 0);
    assert_eq!(sessions.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_executor_shutdown_closes_handles() {
    let (factory, sessions) = recording_factory(Duration::ZERO, None);
    let executor = BatchExecutor::new(EngineConfig::default(), factory);

    let request = BatchRequest::new(
        settings(),
        vec![Query::new("A", QueryKind::Statement).with_program("SELECT now() FROM system.local")],
    );
    let response = executor
        .query_data(request, CancellationToken::new())
        .await
        .unwrap();
    assert!(response.get("A").unwrap().is_ok());

    executor.shutdown().await;
    assert!(sessions.lock().unwrap().iter().all(|s| s.is_closed()));
    assert!(executor.provider().current("scylla").await.is_none());
    assert_eq!(executor.provider().instance_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_batches_for_different_data_sources() {
    let (factory, sessions) = recording_factory(Duration::from_millis(200), None);
    let executor = Arc::new(BatchExecutor::new(EngineConfig::default(), factory.clone()));
    let statement = || {
        vec![Query::new("A", QueryKind::Statement).with_program("SELECT now() FROM system.local")]
    };

    let first = {
        let executor = Arc::clone(&executor);
        let request = BatchRequest::new(settings(), statement());
        tokio::spawn(async move { executor.query_data(request, CancellationToken::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut other = settings().with_host("10.0.0.9");
    other.uid = "scylla-replica".to_string();
    let second = executor
        .query_data(BatchRequest::new(other, statement()), CancellationToken::new())
        .await
        .unwrap();
    let first = first.await.unwrap().unwrap();

    assert!(first.get("A").unwrap().is_ok());
    assert!(second.get("A").unwrap().is_ok());
    assert_eq!(factory.connect_count(), 2);
    assert_eq!(executor.provider().instance_count().await, 2);
    assert!(sessions.lock().unwrap().iter().all(|s| !s.is_closed()));

    let scylla = executor.provider().current("scylla").await.unwrap();
    assert_eq!(scylla.state(), InstanceState::Active);

    executor.shutdown().await;
    assert!(sessions.lock().unwrap().iter().all(|s| s.is_closed()));
}
