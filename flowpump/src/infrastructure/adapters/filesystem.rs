// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Library Provider
//!
//! Watches a directory tree for changes and republishes aggregated change
//! notifications on a timer, coalescing bursts of filesystem events into
//! one batch per tick. Grounded on
//! `original_source/asab/library/providers/filesystem.py`'s
//! `FileSystemLibraryProvider`, whose `_on_aggr_timer` drained a shared
//! `AggrEvents` list with a TODO noting a race: the list could be mutated
//! mid-iteration by the inotify callback running on another task. This
//! adapter resolves that by swapping the whole buffer out atomically under
//! the lock before iterating the drained copy.

use crate::application::bus::{Message, PubSub};
use flowpump_domain::PumpError;
use notify::{RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Stable bus topic spec.md §6 lists as emitted "on tree changes".
const LIBRARY_CHANGE_TOPIC: &str = "ASABLibrary.change!";

/// One filesystem change, aggregated across a tick.
#[derive(Debug, Clone)]
pub struct LibraryChange {
    pub path: PathBuf,
}

struct Aggregator {
    pending: Mutex<Vec<LibraryChange>>,
}

impl Aggregator {
    fn new() -> Arc<Self> {
        Arc::new(Self { pending: Mutex::new(Vec::new()) })
    }

    fn push(&self, change: LibraryChange) {
        self.pending.lock().push(change);
    }

    /// Atomically swaps the pending buffer out and returns the drained
    /// contents, so concurrent `push` calls from the watcher thread never
    /// observe or corrupt an in-progress drain.
    fn drain(&self) -> Vec<LibraryChange> {
        std::mem::take(&mut *self.pending.lock())
    }
}

/// Watches `root` recursively and delivers coalesced batches of changes
/// over the returned channel, at most once per `aggregation_period`.
pub struct FilesystemLibraryProvider {
    _watcher: notify::RecommendedWatcher,
}

impl FilesystemLibraryProvider {
    /// Watches `root`, delivering coalesced batches over the returned
    /// channel and publishing `ASABLibrary.change!` on `bus` for each
    /// non-empty batch, alongside the channel send (spec.md §6).
    pub fn watch(root: &Path, aggregation_period: Duration, bus: PubSub) -> Result<(Self, mpsc::Receiver<Vec<LibraryChange>>), PumpError> {
        let aggregator = Aggregator::new();
        let (sender, receiver) = mpsc::channel(16);

        let watcher_aggregator = aggregator.clone();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| match event {
            Ok(event) => {
                for path in event.paths {
                    watcher_aggregator.push(LibraryChange { path });
                }
            }
            Err(error) => {
                tracing::warn!(%error, "filesystem watch error");
            }
        })
        .map_err(|error| PumpError::infrastructure(format!("failed to start filesystem watcher: {error}")))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|error| PumpError::infrastructure(format!("failed to watch '{}': {error}", root.display())))?;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(aggregation_period);
            loop {
                interval.tick().await;
                let batch = aggregator.drain();
                if batch.is_empty() {
                    continue;
                }
                let paths: Vec<String> = batch.iter().map(|change| change.path.display().to_string()).collect();
                bus.publish(LIBRARY_CHANGE_TOPIC, Message::Text(serde_json::json!(paths).to_string()));
                if sender.send(batch).await.is_err() {
                    break;
                }
            }
        });

        Ok((Self { _watcher: watcher }, receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_pushed_changes_and_empties_the_buffer() {
        let aggregator = Aggregator::new();
        aggregator.push(LibraryChange { path: PathBuf::from("/a") });
        aggregator.push(LibraryChange { path: PathBuf::from("/b") });

        let drained = aggregator.drain();
        assert_eq!(drained.len(), 2);
        assert!(aggregator.drain().is_empty());
    }

    #[tokio::test]
    async fn watching_a_directory_reports_a_new_file() {
        let dir = tempdir();
        let bus = PubSub::new();
        let (_provider, mut receiver) = FilesystemLibraryProvider::watch(&dir, Duration::from_millis(50), bus).unwrap();

        std::fs::write(dir.join("new-file.txt"), b"hello").unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(2), receiver.recv()).await;
        assert!(batch.is_ok(), "expected a change batch within the timeout");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn watching_a_directory_publishes_the_stable_library_change_topic() {
        let dir = tempdir();
        let bus = PubSub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_callback = seen.clone();
        bus.subscribe(LIBRARY_CHANGE_TOPIC, move |message| {
            if let Message::Text(paths) = message {
                seen_in_callback.lock().push(paths.clone());
            }
        });

        let (_provider, mut receiver) = FilesystemLibraryProvider::watch(&dir, Duration::from_millis(50), bus).unwrap();
        std::fs::write(dir.join("new-file.txt"), b"hello").unwrap();

        let _ = tokio::time::timeout(Duration::from_secs(2), receiver.recv()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!seen.lock().is_empty(), "expected ASABLibrary.change! to be published");

        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flowpump-fs-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
