// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Alert Bus
//!
//! Fans an `Alert` out to every registered provider. Each provider owns an
//! unbounded queue, optionally capped by configuration, and a single worker
//! task that delivers alerts until the queue closes or shutdown fires,
//! matching `original_source/bspump/asab/alert.py`'s `AlertAsyncProviderABC`
//! loop.

use flowpump_bootstrap::CancellationToken;
use flowpump_domain::{Alert, AlertProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Supervises one provider's queue and worker task.
struct ProviderHandle {
    provider: Arc<dyn AlertProvider>,
    sender: mpsc::UnboundedSender<Alert>,
    capacity: Option<usize>,
    queued: Arc<AtomicUsize>,
}

/// Fans alerts out to every registered provider via `trigger` (non-blocking
/// enqueue); each provider's worker calls `deliver` in a loop.
pub struct AlertBus {
    providers: Vec<ProviderHandle>,
}

impl AlertBus {
    pub fn new() -> Self {
        Self { providers: Vec::new() }
    }

    /// Registers a provider and spawns its supervised worker. `capacity`
    /// bounds the provider's queue; `None` means unbounded (spec.md §3,
    /// "enqueued per provider; dropped only if ... explicitly capped").
    pub fn register(&mut self, provider: Arc<dyn AlertProvider>, capacity: Option<usize>, shutdown: CancellationToken) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queued = Arc::new(AtomicUsize::new(0));
        spawn_worker(provider.clone(), receiver, queued.clone(), shutdown);
        self.providers.push(ProviderHandle { provider, sender, capacity, queued });
    }

    /// Enqueues `alert` on every registered provider. Providers with a
    /// configured capacity drop the alert once their queue is full rather
    /// than blocking the publisher.
    pub fn trigger(&self, alert: Alert) {
        for handle in &self.providers {
            handle.provider.trigger(alert.clone());

            if let Some(capacity) = handle.capacity {
                if handle.queued.load(Ordering::SeqCst) >= capacity {
                    tracing::warn!(provider = handle.provider.name(), "alert queue capped, dropping alert");
                    continue;
                }
            }

            handle.queued.fetch_add(1, Ordering::SeqCst);
            let _ = handle.sender.send(alert.clone());
        }
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_worker(
    provider: Arc<dyn AlertProvider>,
    mut receiver: mpsc::UnboundedReceiver<Alert>,
    queued: Arc<AtomicUsize>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = receiver.recv() => {
                    match next {
                        Some(alert) => {
                            queued.fetch_sub(1, Ordering::SeqCst);
                            provider.deliver(alert).await;
                        }
                        None => break,
                    }
                }
            }
        }
        tracing::debug!(provider = provider.name(), "alert provider worker stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        delivered: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AlertProvider for CountingProvider {
        fn trigger(&self, _alert: Alert) {}

        async fn deliver(&self, _alert: Alert) {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn triggered_alerts_are_delivered_by_the_worker() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let mut bus = AlertBus::new();
        let shutdown = CancellationToken::new();
        bus.register(
            Arc::new(CountingProvider { delivered: delivered.clone() }),
            None,
            shutdown.clone(),
        );

        bus.trigger(Alert::new("test", "class", "id-1", "title"));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 1);

        shutdown.cancel();
    }
}
