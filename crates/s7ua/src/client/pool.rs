// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bounded pool of protocol sessions.
//!
//! The pool creates a fixed number of sessions up front and lends them out
//! one borrower at a time. A semaphore gates borrowing; each permit matches a
//! queued session. The [`SessionLease`] owns both the borrowed session and its
//! permit, and returns them together when dropped, so the number of queued
//! sessions always equals the number of available permits.
//!
//! # Example
//!
//! ```rust,ignore
//! let pool = SessionPool::new(factory, PoolConfig::with_size(4));
//! pool.initialize(&connection, "opc.tcp://plc:4840").await?;
//!
//! let children = pool
//!     .execute_with_session(|session| async move {
//!         session.browse(&root, NodeClass::MASK_VARIABLE).await
//!     })
//!     .await?;
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::client::session::{SessionFactory, UaSession};
use crate::error::{PoolError, S7Result};
use crate::types::{ConnectionConfig, PoolConfig};

// =============================================================================
// PoolStats
// =============================================================================

/// Counters for pool activity.
#[derive(Debug, Default)]
pub struct PoolStats {
    sessions_created: AtomicU64,
    sessions_closed: AtomicU64,
    borrows: AtomicU64,
    replacements: AtomicU64,
    failures: AtomicU64,
}

impl PoolStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_creation(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    fn record_close(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_borrow(&self) {
        self.borrows.fetch_add(1, Ordering::Relaxed);
    }

    fn record_replacement(&self) {
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Sessions created through the factory, replacements included.
    pub fn sessions_created(&self) -> u64 {
        self.sessions_created.load(Ordering::Relaxed)
    }

    /// Sessions closed by the pool.
    pub fn sessions_closed(&self) -> u64 {
        self.sessions_closed.load(Ordering::Relaxed)
    }

    /// Completed borrows.
    pub fn borrows(&self) -> u64 {
        self.borrows.load(Ordering::Relaxed)
    }

    /// Dead sessions replaced during a borrow.
    pub fn replacements(&self) -> u64 {
        self.replacements.load(Ordering::Relaxed)
    }

    /// Failed session creations.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Resets all counters.
    pub fn reset(&self) {
        self.sessions_created.store(0, Ordering::Relaxed);
        self.sessions_closed.store(0, Ordering::Relaxed);
        self.borrows.store(0, Ordering::Relaxed);
        self.replacements.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }
}

// =============================================================================
// PoolInner
// =============================================================================

struct PoolInner {
    connection: ConnectionConfig,
    endpoint: String,
    sessions: Mutex<VecDeque<Arc<dyn UaSession>>>,
    semaphore: Arc<Semaphore>,
    disposed: AtomicBool,
    stats: Arc<PoolStats>,
}

impl PoolInner {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

async fn close_session(session: Arc<dyn UaSession>, stats: &PoolStats) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Failed to close session");
    }
    stats.record_close();
}

// =============================================================================
// SessionLease
// =============================================================================

/// A borrowed session together with its permit.
///
/// Dropping the lease pushes the session back and then releases the permit.
/// After the pool was disposed the session is closed instead.
pub struct SessionLease {
    session: Option<Arc<dyn UaSession>>,
    permit: Option<OwnedSemaphorePermit>,
    inner: Arc<PoolInner>,
}

impl SessionLease {
    /// Returns the borrowed session.
    pub fn session(&self) -> Option<&Arc<dyn UaSession>> {
        self.session.as_ref()
    }

    /// Swaps the borrowed session, returning the previous one.
    fn replace(&mut self, session: Arc<dyn UaSession>) -> Option<Arc<dyn UaSession>> {
        self.session.replace(session)
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            // The disposed flag only changes under the queue lock, so a
            // session is either queued before dispose drains or closed here.
            let orphan = {
                let mut queue = self.inner.sessions.lock();
                if self.inner.is_disposed() {
                    Some(session)
                } else {
                    queue.push_back(session);
                    None
                }
            };
            if let Some(session) = orphan {
                let stats = Arc::clone(&self.inner.stats);
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move { close_session(session, &stats).await });
                    }
                    Err(_) => tracing::warn!("No runtime to close a session returned after dispose"),
                }
            }
        }
        drop(self.permit.take());
    }
}

impl std::fmt::Debug for SessionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLease")
            .field("has_session", &self.session.is_some())
            .finish()
    }
}

// =============================================================================
// SessionPool
// =============================================================================

/// Fixed-size pool of sessions created through a [`SessionFactory`].
pub struct SessionPool {
    factory: Arc<dyn SessionFactory>,
    config: PoolConfig,
    inner: Mutex<Option<Arc<PoolInner>>>,
    stats: Arc<PoolStats>,
}

impl SessionPool {
    /// Creates an uninitialized pool.
    pub fn new(factory: Arc<dyn SessionFactory>, config: PoolConfig) -> Self {
        Self {
            factory,
            config,
            inner: Mutex::new(None),
            stats: Arc::new(PoolStats::new()),
        }
    }

    /// Configured number of sessions.
    pub fn size(&self) -> usize {
        self.config.size
    }

    /// Returns the pool statistics.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Returns `true` once `initialize` succeeded and until `dispose`.
    pub fn is_initialized(&self) -> bool {
        self.current().is_some_and(|inner| !inner.is_disposed())
    }

    /// Number of sessions currently queued.
    pub fn available(&self) -> usize {
        self.current().map_or(0, |inner| inner.sessions.lock().len())
    }

    /// Number of permits currently available.
    pub fn available_permits(&self) -> usize {
        self.current().map_or(0, |inner| inner.semaphore.available_permits())
    }

    fn current(&self) -> Option<Arc<PoolInner>> {
        self.inner.lock().clone()
    }

    /// Creates all sessions.
    ///
    /// Sessions are created one after another. If one fails, the sessions
    /// created so far are closed and [`PoolError::Exhausted`] reports how many
    /// of the requested sessions existed.
    pub async fn initialize(&self, connection: &ConnectionConfig, endpoint: &str) -> S7Result<()> {
        self.config.validate()?;
        if self.is_initialized() {
            return Err(PoolError::AlreadyInitialized.into());
        }

        let requested = self.config.size;
        tracing::info!(endpoint = %endpoint, pool_size = requested, "Initializing session pool");

        let mut created: VecDeque<Arc<dyn UaSession>> = VecDeque::with_capacity(requested);
        for index in 0..requested {
            match self.factory.create_session(connection, endpoint).await {
                Ok(session) => {
                    self.stats.record_creation();
                    created.push_back(session);
                }
                Err(e) => {
                    self.stats.record_failure();
                    tracing::error!(
                        endpoint = %endpoint,
                        index,
                        error = %e,
                        "Session creation failed, closing partial pool"
                    );
                    let count = created.len();
                    for session in created {
                        close_session(session, &self.stats).await;
                    }
                    return Err(PoolError::exhausted(count, requested).into());
                }
            }
        }

        let inner = Arc::new(PoolInner {
            connection: connection.clone(),
            endpoint: endpoint.to_string(),
            sessions: Mutex::new(created),
            semaphore: Arc::new(Semaphore::new(requested)),
            disposed: AtomicBool::new(false),
            stats: Arc::clone(&self.stats),
        });

        let rejected = {
            let mut slot = self.inner.lock();
            match slot.as_ref() {
                Some(existing) if !existing.is_disposed() => Some(inner),
                _ => {
                    *slot = Some(inner);
                    None
                }
            }
        };
        if let Some(rejected) = rejected {
            let sessions: Vec<_> = rejected.sessions.lock().drain(..).collect();
            for session in sessions {
                close_session(session, &self.stats).await;
            }
            return Err(PoolError::AlreadyInitialized.into());
        }

        tracing::info!(endpoint = %endpoint, pool_size = requested, "Session pool ready");
        Ok(())
    }

    /// Borrows a session, runs `operation` with it and returns it.
    ///
    /// Suspends while all sessions are lent out. A session that reports
    /// itself disconnected is replaced through the factory before use. The
    /// session goes back to the pool however `operation` ends, including when
    /// the returned future is dropped.
    pub async fn execute_with_session<F, Fut, R>(&self, operation: F) -> S7Result<R>
    where
        F: FnOnce(Arc<dyn UaSession>) -> Fut,
        Fut: Future<Output = S7Result<R>>,
    {
        let mut lease = self.acquire().await?;

        let needs_replacement = lease.session().is_some_and(|s| !s.is_connected());
        if needs_replacement {
            self.replace_dead(&mut lease).await?;
        }

        let session = match lease.session() {
            Some(session) => Arc::clone(session),
            None => return Err(PoolError::Disposed.into()),
        };
        let result = operation(session).await;
        self.stats.record_borrow();
        drop(lease);
        result
    }

    /// Checks out a session. The returned lease gives it back on drop.
    pub async fn acquire(&self) -> S7Result<SessionLease> {
        let inner = self.current().ok_or(PoolError::Uninitialized)?;
        if inner.is_disposed() {
            return Err(PoolError::Disposed.into());
        }

        let permit = Arc::clone(&inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Disposed)?;

        let session = inner.sessions.lock().pop_front();
        match session {
            Some(session) => Ok(SessionLease {
                session: Some(session),
                permit: Some(permit),
                inner,
            }),
            None => Err(PoolError::Disposed.into()),
        }
    }

    async fn replace_dead(&self, lease: &mut SessionLease) -> S7Result<()> {
        let inner = Arc::clone(&lease.inner);
        tracing::warn!(endpoint = %inner.endpoint, "Replacing disconnected session");

        match self
            .factory
            .create_session(&inner.connection, &inner.endpoint)
            .await
        {
            Ok(fresh) => {
                self.stats.record_creation();
                self.stats.record_replacement();
                if let Some(dead) = lease.replace(fresh) {
                    close_session(dead, &self.stats).await;
                }
                Ok(())
            }
            Err(e) => {
                self.stats.record_failure();
                tracing::error!(endpoint = %inner.endpoint, error = %e, "Session replacement failed");
                Err(PoolError::replacement_failed(e.to_string()).into())
            }
        }
    }

    /// Closes all queued sessions and rejects further borrows.
    ///
    /// Sessions still lent out are closed when their lease ends.
    pub async fn dispose(&self) {
        let Some(inner) = self.current() else {
            return;
        };
        let sessions: Vec<_> = {
            let mut queue = inner.sessions.lock();
            if inner.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            queue.drain(..).collect()
        };
        inner.semaphore.close();

        tracing::info!(endpoint = %inner.endpoint, closing = sessions.len(), "Disposing session pool");
        for session in sessions {
            close_session(session, &self.stats).await;
        }
    }
}

impl std::fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPool")
            .field("size", &self.config.size)
            .field("initialized", &self.is_initialized())
            .field("available", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::{BrowseResult, DataValue, UaValue};
    use crate::error::S7Error;
    use crate::types::{AttributeId, NodeId, StatusCode};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct TestSession {
        connected: AtomicBool,
    }

    #[async_trait]
    impl UaSession for TestSession {
        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn browse(&self, _: &NodeId, _: u32) -> S7Result<Vec<BrowseResult>> {
            Ok(Vec::new())
        }

        async fn read(&self, nodes: &[(NodeId, AttributeId)]) -> S7Result<Vec<DataValue>> {
            Ok(nodes.iter().map(|_| DataValue::good(UaValue::Null)).collect())
        }

        async fn write(&self, values: &[(NodeId, UaValue)]) -> S7Result<Vec<StatusCode>> {
            Ok(values.iter().map(|_| StatusCode::GOOD).collect())
        }

        async fn close(&self) -> S7Result<()> {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestFactory {
        created: AtomicUsize,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl SessionFactory for TestFactory {
        async fn create_session(
            &self,
            _: &ConnectionConfig,
            endpoint: &str,
        ) -> S7Result<Arc<dyn UaSession>> {
            let index = self.created.fetch_add(1, Ordering::SeqCst);
            if Some(index) == self.fail_at {
                return Err(S7Error::session_failed(endpoint, "refused"));
            }
            Ok(Arc::new(TestSession {
                connected: AtomicBool::new(true),
            }))
        }
    }

    fn connection() -> ConnectionConfig {
        ConnectionConfig::new("opc.tcp://localhost:4840")
    }

    #[tokio::test]
    async fn test_uninitialized_borrow_fails() {
        let pool = SessionPool::new(Arc::new(TestFactory::default()), PoolConfig::with_size(2));
        let err = pool
            .execute_with_session(|_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, S7Error::Pool(PoolError::Uninitialized)));
    }

    #[tokio::test]
    async fn test_initialize_twice_fails() {
        let pool = SessionPool::new(Arc::new(TestFactory::default()), PoolConfig::with_size(2));
        pool.initialize(&connection(), "opc.tcp://localhost:4840").await.unwrap();
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.available_permits(), 2);
        let err = pool
            .initialize(&connection(), "opc.tcp://localhost:4840")
            .await
            .unwrap_err();
        assert!(matches!(err, S7Error::Pool(PoolError::AlreadyInitialized)));
    }

    #[tokio::test]
    async fn test_partial_initialization_reports_count() {
        let factory = TestFactory {
            fail_at: Some(2),
            ..Default::default()
        };
        let pool = SessionPool::new(Arc::new(factory), PoolConfig::with_size(4));
        let err = pool
            .initialize(&connection(), "opc.tcp://localhost:4840")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("2 out of 4"));
        assert_eq!(pool.stats().sessions_closed(), 2);
        assert!(!pool.is_initialized());
    }

    #[tokio::test]
    async fn test_session_returned_after_error() {
        let pool = SessionPool::new(Arc::new(TestFactory::default()), PoolConfig::with_size(1));
        pool.initialize(&connection(), "opc.tcp://localhost:4840").await.unwrap();

        let result: S7Result<()> = pool
            .execute_with_session(|_| async { Err(S7Error::not_connected()) })
            .await;
        assert!(result.is_err());
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_dead_session_replaced() {
        let pool = SessionPool::new(Arc::new(TestFactory::default()), PoolConfig::with_size(1));
        pool.initialize(&connection(), "opc.tcp://localhost:4840").await.unwrap();

        pool.execute_with_session(|session| async move { session.close().await })
            .await
            .unwrap();

        let connected = pool
            .execute_with_session(|session| async move { Ok(session.is_connected()) })
            .await
            .unwrap();
        assert!(connected);
        assert_eq!(pool.stats().replacements(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_dispose_rejects_borrows() {
        let pool = SessionPool::new(Arc::new(TestFactory::default()), PoolConfig::with_size(2));
        pool.initialize(&connection(), "opc.tcp://localhost:4840").await.unwrap();
        pool.dispose().await;

        assert_eq!(pool.available(), 0);
        assert_eq!(pool.stats().sessions_closed(), 2);
        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, S7Error::Pool(PoolError::Disposed)));
    }

    #[tokio::test]
    async fn test_lease_returned_after_dispose_is_closed() {
        let pool = SessionPool::new(Arc::new(TestFactory::default()), PoolConfig::with_size(2));
        pool.initialize(&connection(), "opc.tcp://localhost:4840").await.unwrap();

        let lease = pool.acquire().await.unwrap();
        let session = Arc::clone(lease.session().unwrap());
        pool.dispose().await;
        assert_eq!(pool.stats().sessions_closed(), 1);

        drop(lease);
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(pool.available(), 0);
        assert!(!session.is_connected());
        assert_eq!(pool.stats().sessions_closed(), 2);
    }

    #[tokio::test]
    async fn test_zero_size_rejected() {
        let pool = SessionPool::new(Arc::new(TestFactory::default()), PoolConfig::with_size(0));
        let err = pool
            .initialize(&connection(), "opc.tcp://localhost:4840")
            .await
            .unwrap_err();
        assert!(matches!(err, S7Error::Pool(PoolError::InvalidSize { size: 0 })));
    }
}
