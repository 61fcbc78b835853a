// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Session Pool Integration Tests
//!
//! - `test_pool_*`: Initialization, borrowing, replacement and disposal

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use s7ua::{ConnectionConfig, PoolConfig, PoolError, S7Error, SessionPool};

use s7ua_tests::common::{init_test_logging, ConfigFixtures, MockAddressSpace, MockSessionFactory};

fn pool(size: usize) -> (SessionPool, Arc<MockSessionFactory>) {
    let factory = MockSessionFactory::new(MockAddressSpace::new());
    let pool = SessionPool::new(factory.clone(), PoolConfig::with_size(size));
    (pool, factory)
}

fn connection() -> ConnectionConfig {
    ConnectionConfig::new(ConfigFixtures::ENDPOINT)
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn test_pool_initialize_creates_all_sessions() {
    init_test_logging();
    let (pool, factory) = pool(3);

    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();

    assert!(pool.is_initialized());
    assert_eq!(factory.created(), 3);
    assert_eq!(pool.available(), 3);
    assert_eq!(pool.available_permits(), 3);
    assert_eq!(pool.stats().sessions_created(), 3);
}

#[tokio::test]
async fn test_pool_partial_initialization_closes_created_sessions() {
    init_test_logging();
    let (pool, factory) = pool(5);
    factory.fail_at(2);

    let err = pool
        .initialize(&connection(), ConfigFixtures::ENDPOINT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        S7Error::Pool(PoolError::Exhausted {
            created: 2,
            requested: 5
        })
    ));
    assert!(err.to_string().contains("2 out of 5"));
    assert_eq!(factory.attempts(), 3);
    assert_eq!(factory.closed(), 2);
    assert!(!pool.is_initialized());
    assert_eq!(pool.stats().failures(), 1);
}

#[tokio::test]
async fn test_pool_rejects_second_initialize() {
    let (pool, factory) = pool(2);
    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();

    let err = pool
        .initialize(&connection(), ConfigFixtures::ENDPOINT)
        .await
        .unwrap_err();

    assert!(matches!(err, S7Error::Pool(PoolError::AlreadyInitialized)));
    assert_eq!(pool.available(), 2);
    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn test_pool_borrow_before_initialize_fails() {
    let (pool, _factory) = pool(2);

    let err = pool
        .execute_with_session(|_session| async { Ok(()) })
        .await
        .unwrap_err();

    assert!(matches!(err, S7Error::Pool(PoolError::Uninitialized)));
}

// =============================================================================
// Borrowing
// =============================================================================

#[tokio::test]
async fn test_pool_concurrent_mixed_borrows_return_every_session() {
    init_test_logging();
    let (pool, _factory) = pool(3);
    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();

    let pool = &pool;
    let in_flight = &AtomicUsize::new(0);
    let peak = &AtomicUsize::new(0);

    let borrow = |fail: bool| async move {
        pool.execute_with_session(|session| async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            if fail {
                return Err(S7Error::not_connected());
            }
            Ok(session.is_connected())
        })
        .await
    };

    let results = tokio::join!(
        borrow(false),
        borrow(true),
        borrow(false),
        borrow(true),
        borrow(false),
        borrow(true)
    );
    let results = [results.0, results.1, results.2, results.3, results.4, results.5];
    assert_eq!(results.iter().filter(|r| matches!(r, Ok(true))).count(), 3);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(S7Error::Connection(_))))
            .count(),
        3
    );

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(pool.available(), 3);
    assert_eq!(pool.available_permits(), 3);
    assert_eq!(pool.stats().borrows(), 6);
}

#[tokio::test]
async fn test_pool_returns_session_when_operation_fails() {
    let (pool, _factory) = pool(1);
    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();

    let result: Result<(), S7Error> = pool
        .execute_with_session(|_session| async { Err(S7Error::not_connected()) })
        .await;

    assert!(result.is_err());
    assert_eq!(pool.available(), 1);
    assert_eq!(pool.available_permits(), 1);
}

#[tokio::test]
async fn test_pool_cancelled_borrows_keep_permits_and_sessions() {
    init_test_logging();
    let (pool, _factory) = pool(1);
    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();
    let pool = Arc::new(pool);

    let holder = tokio::spawn({
        let pool = Arc::clone(&pool);
        async move {
            pool.execute_with_session(|_session| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
        }
    });
    while pool.available() > 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let waiter = tokio::time::timeout(
        Duration::from_millis(50),
        pool.execute_with_session(|_session| async { Ok(()) }),
    )
    .await;
    assert!(waiter.is_err());
    assert_eq!(pool.available_permits(), 0);

    holder.abort();
    assert!(holder.await.unwrap_err().is_cancelled());

    assert_eq!(pool.available(), 1);
    assert_eq!(pool.available_permits(), 1);
    let connected = pool
        .execute_with_session(|session| async move { Ok(session.is_connected()) })
        .await
        .unwrap();
    assert!(connected);
}

#[tokio::test]
async fn test_pool_replaces_disconnected_session() {
    init_test_logging();
    let (pool, factory) = pool(1);
    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();
    factory.sessions()[0].disconnect();

    let connected = pool
        .execute_with_session(|session| async move { Ok(session.is_connected()) })
        .await
        .unwrap();

    assert!(connected);
    assert_eq!(factory.created(), 2);
    assert_eq!(factory.closed(), 1);
    assert_eq!(pool.stats().replacements(), 1);
    assert_eq!(pool.available(), 1);
}

#[tokio::test]
async fn test_pool_failed_replacement_keeps_permit_count() {
    let (pool, factory) = pool(1);
    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();
    factory.sessions()[0].disconnect();
    factory.fail_at(1);

    let err = pool
        .execute_with_session(|_session| async { Ok(()) })
        .await
        .unwrap_err();

    assert!(matches!(err, S7Error::Pool(PoolError::ReplacementFailed { .. })));
    assert_eq!(pool.available(), 1);
    assert_eq!(pool.available_permits(), 1);
}

// =============================================================================
// Disposal
// =============================================================================

#[tokio::test]
async fn test_pool_dispose_closes_sessions_and_rejects_borrows() {
    let (pool, factory) = pool(3);
    pool.initialize(&connection(), ConfigFixtures::ENDPOINT).await.unwrap();

    pool.dispose().await;

    assert_eq!(factory.closed(), 3);
    assert!(!pool.is_initialized());
    let err = pool
        .execute_with_session(|_session| async { Ok(()) })
        .await
        .unwrap_err();
    assert!(matches!(err, S7Error::Pool(PoolError::Disposed)));

    pool.dispose().await;
    assert_eq!(factory.closed(), 3);
}
