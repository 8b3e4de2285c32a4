// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Trigger Framework
//!
//! Built-in `Trigger` implementations (periodic, one-shot, pub/sub) and the
//! driver that wires a `TriggeredSource` to one or more triggers, running
//! one `cycle()` per pulse with pulses coalesced while a cycle is in flight.

use crate::application::bus::PubSub;
use async_trait::async_trait;
use flowpump_domain::traits::TriggeredSource;
use flowpump_domain::{PipelineHandle, Trigger};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Fires every `period`, starting one `period` after creation.
pub struct PeriodicTrigger {
    name: String,
    sender: watch::Sender<u64>,
    receiver: watch::Receiver<u64>,
}

impl PeriodicTrigger {
    /// Spawns the periodic timer task and returns the trigger handle.
    pub fn start(name: impl Into<String>, period: Duration) -> Arc<Self> {
        let (sender, receiver) = watch::channel(0);
        let trigger = Arc::new(Self {
            name: name.into(),
            sender,
            receiver,
        });

        let sender = trigger.sender.clone();
        tokio::spawn(async move {
            let mut cycle: u64 = 0;
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                cycle += 1;
                if sender.send(cycle).is_err() {
                    break;
                }
            }
        });

        trigger
    }
}

#[async_trait]
impl Trigger for PeriodicTrigger {
    fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fires exactly once, after `delay`.
pub struct OneShotTrigger {
    name: String,
    receiver: watch::Receiver<u64>,
}

impl OneShotTrigger {
    pub fn start(name: impl Into<String>, delay: Duration) -> Arc<Self> {
        let (sender, receiver) = watch::channel(0);
        let trigger = Arc::new(Self { name: name.into(), receiver });

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(1);
        });

        trigger
    }
}

#[async_trait]
impl Trigger for OneShotTrigger {
    fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fires whenever `topic` is published on `bus`.
pub struct PubSubTrigger {
    name: String,
    receiver: watch::Receiver<u64>,
}

impl PubSubTrigger {
    pub fn bind(name: impl Into<String>, bus: &PubSub, topic: impl Into<String>) -> Arc<Self> {
        let (sender, receiver) = watch::channel(0);
        let counter = Arc::new(AtomicU64::new(0));

        bus.subscribe(topic, move |_message| {
            let cycle = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = sender.send(cycle);
        });

        Arc::new(Self { name: name.into(), receiver })
    }
}

#[async_trait]
impl Trigger for PubSubTrigger {
    fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Drives `source.cycle()` once per pulse from any of `triggers`. Pulses
/// arriving while a cycle is running are coalesced: `watch::Receiver`
/// only ever yields the latest value, so a burst of pulses collapses into
/// at most one pending cycle (spec.md §4.4).
pub async fn drive<S>(source: Arc<S>, pipeline: Arc<dyn PipelineHandle>, triggers: Vec<Arc<dyn Trigger>>)
where
    S: TriggeredSource + 'static,
{
    let mut receivers: Vec<_> = triggers.iter().map(|t| t.subscribe()).collect();

    loop {
        let changed = futures::future::select_all(receivers.iter_mut().map(|r| Box::pin(r.changed()))).await;
        if changed.0.is_err() {
            break;
        }

        if let Err(error) = source.cycle(pipeline.clone()).await {
            tracing::error!(%error, source = source.name(), "triggered source cycle failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn periodic_trigger_fires_after_first_period() {
        let trigger = PeriodicTrigger::start("tick", Duration::from_millis(10));
        let mut receiver = trigger.subscribe();
        receiver.changed().await.unwrap();
        assert!(*receiver.borrow() >= 1);
    }

    #[tokio::test]
    async fn one_shot_trigger_fires_once() {
        let trigger = OneShotTrigger::start("once", Duration::from_millis(5));
        let mut receiver = trigger.subscribe();
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), 1);
    }

    #[tokio::test]
    async fn pubsub_trigger_fires_on_publish() {
        let bus = PubSub::new();
        let trigger = PubSubTrigger::bind("on-topic", &bus, "custom.topic!");
        let mut receiver = trigger.subscribe();

        bus.publish_empty("custom.topic!");
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), 1);
    }
}
