// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! A cooperative cancellation token plus a coordinator that waits for
//! in-flight work to drain within a grace period before reporting a timeout.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;

/// Cooperative cancellation signal. Cloning shares the same underlying flag;
/// any clone can request cancellation and every clone observes it.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: std::sync::atomic::AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: std::sync::atomic::AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, std::sync::atomic::Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called. If already cancelled,
    /// resolves immediately. `notify_waiters()` stores no permit, so the
    /// `notified()` future is created before the recheck below rather than
    /// after: a `cancel()` landing between a bare check and the await would
    /// otherwise be missed forever.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned when the grace period elapses before drain completes.
#[derive(Debug, thiserror::Error)]
#[error("shutdown grace period of {grace_period:?} elapsed before drain completed")]
pub struct ShutdownTimeout {
    pub grace_period: Duration,
}

/// Coordinates an orderly shutdown: signal cancellation, then wait for a
/// caller-supplied drain future to finish within a grace period.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace_period,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signals cancellation, then awaits `drain` up to the grace period.
    pub async fn shutdown<F>(&self, drain: F) -> Result<(), ShutdownTimeout>
    where
        F: std::future::Future<Output = ()>,
    {
        self.token.cancel();
        timeout(self.grace_period, drain)
            .await
            .map_err(|_| ShutdownTimeout { grace_period: self.grace_period })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancellation_token_wakes_waiters() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        token.cancel();
        handle.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn shutdown_succeeds_when_drain_finishes_in_time() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(200));
        let result = coordinator.shutdown(async {}).await;
        assert!(result.is_ok());
        assert!(coordinator.token().is_cancelled());
    }

    #[tokio::test]
    async fn shutdown_times_out_when_drain_is_slow() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(10));
        let result = coordinator
            .shutdown(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
            })
            .await;
        assert!(result.is_err());
    }
}
