// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Proactor Service
//!
//! Offloads blocking, synchronous work (a third-party client library with
//! no async API, CPU-bound transforms) onto a dedicated worker pool and
//! hands the result back to the calling async task. Grounded on
//! `original_source/bspump/ldap/source.py`'s `ProactorService.execute`,
//! which runs `self._search_worker` off the event loop and awaits its
//! result.

use flowpump_domain::PumpError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::oneshot;

/// A handle to a rayon thread pool dedicated to blocking work. Distinct
/// from tokio's own blocking pool so CPU-bound jobs don't compete with
/// tokio's file/IO blocking tasks.
pub struct ProactorService {
    pool: ThreadPool,
}

impl ProactorService {
    pub fn new(threads: usize) -> Result<Self, PumpError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("flowpump-proactor-{i}"))
            .build()
            .map_err(|error| PumpError::infrastructure(format!("failed to start proactor pool: {error}")))?;

        Ok(Self { pool })
    }

    /// Runs `work` on the pool and awaits its result without blocking the
    /// calling task's executor thread.
    pub async fn execute<F, T>(&self, work: F) -> Result<T, PumpError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.pool.spawn(move || {
            let result = work();
            let _ = sender.send(result);
        });

        receiver
            .await
            .map_err(|_| PumpError::infrastructure("proactor worker dropped its result sender"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_returns_the_worker_result() {
        let proactor = ProactorService::new(2).unwrap();
        let result = proactor.execute(|| 2 + 2).await.unwrap();
        assert_eq!(result, 4);
    }

    #[tokio::test]
    async fn execute_runs_concurrently_with_async_work() {
        let proactor = ProactorService::new(2).unwrap();
        let slow = proactor.execute(|| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            "done"
        });
        let (result, _) = tokio::join!(slow, tokio::time::sleep(std::time::Duration::from_millis(1)));
        assert_eq!(result.unwrap(), "done");
    }
}
