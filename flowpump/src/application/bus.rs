// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Publish/Subscribe Bus
//!
//! A topic-keyed event bus. Synchronous subscribers run inline, in
//! subscription order, during `publish`; async subscribers are spawned as
//! fire-and-forget tasks so a slow subscriber never blocks the publisher or
//! its siblings.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A value carried on the bus. Topics are free-form strings by convention
/// (`Application.tick!`, `Application.exit!`, ...); payload shape is left to
/// callers since the bus itself is not domain-aware.
#[derive(Clone)]
pub enum Message {
    Empty,
    Text(String),
    Cycle(u64),
}

/// A handle returned from `subscribe`/`subscribe_async`, passed back to
/// `PubSub::unsubscribe` to remove the subscription. Carries its own topic
/// so `unsubscribe` doesn't need it repeated by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    topic: String,
    sequence: u64,
}

type SyncSubscriber = Arc<dyn Fn(&Message) + Send + Sync>;
type AsyncSubscriber = Arc<dyn Fn(Message) -> futures::future::BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone)]
struct SyncEntry {
    sequence: u64,
    callback: SyncSubscriber,
}

#[derive(Clone)]
struct AsyncEntry {
    sequence: u64,
    callback: AsyncSubscriber,
}

#[derive(Default)]
struct Topic {
    sync_subscribers: Vec<SyncEntry>,
    async_subscribers: Vec<AsyncEntry>,
}

/// The bus itself. Cheap to clone: internally an `Arc` over shared state.
#[derive(Clone)]
pub struct PubSub {
    topics: Arc<RwLock<HashMap<String, Topic>>>,
    next_sequence: Arc<AtomicU64>,
}

impl PubSub {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            next_sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a synchronous subscriber, invoked inline during `publish`.
    pub fn subscribe<F>(&self, topic: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let sequence = self.next_sequence();
        self.topics
            .write()
            .entry(topic.clone())
            .or_default()
            .sync_subscribers
            .push(SyncEntry {
                sequence,
                callback: Arc::new(callback),
            });
        SubscriptionId { topic, sequence }
    }

    /// Registers an async subscriber. Each publish spawns it as its own
    /// task; the publisher does not await it.
    pub fn subscribe_async<F, Fut>(&self, topic: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let topic = topic.into();
        let sequence = self.next_sequence();
        self.topics
            .write()
            .entry(topic.clone())
            .or_default()
            .async_subscribers
            .push(AsyncEntry {
                sequence,
                callback: Arc::new(move |message| Box::pin(callback(message))),
            });
        SubscriptionId { topic, sequence }
    }

    /// Removes a subscription. Safe to call from inside a subscriber
    /// callback that is itself running as part of a `publish`: the
    /// dispatch loop re-checks each subscriber's membership just before
    /// invoking it, so an unsubscribe landing mid-publish causes that
    /// subscriber to be skipped for the remainder of the current
    /// publication rather than removed retroactively.
    pub fn unsubscribe(&self, id: &SubscriptionId) {
        if let Some(topic) = self.topics.write().get_mut(&id.topic) {
            topic.sync_subscribers.retain(|entry| entry.sequence != id.sequence);
            topic.async_subscribers.retain(|entry| entry.sequence != id.sequence);
        }
    }

    /// Publishes `message` on `topic`. Synchronous subscribers run inline in
    /// subscription order; async subscribers are spawned and not awaited.
    /// A subscriber that unsubscribes (its own or another's) before its
    /// turn comes up is skipped for this publication.
    pub fn publish(&self, topic: &str, message: Message) {
        let sync_subscribers;
        let async_subscribers;
        {
            let topics = self.topics.read();
            match topics.get(topic) {
                Some(t) => {
                    sync_subscribers = t.sync_subscribers.clone();
                    async_subscribers = t.async_subscribers.clone();
                }
                None => return,
            }
        }

        for entry in &sync_subscribers {
            if !self.is_still_subscribed(topic, entry.sequence) {
                continue;
            }
            (entry.callback)(&message);
        }

        for entry in async_subscribers {
            let message = message.clone();
            let bus = self.clone();
            let topic = topic.to_string();
            tokio::spawn(async move {
                if bus.is_still_subscribed(&topic, entry.sequence) {
                    (entry.callback)(message).await;
                }
            });
        }
    }

    fn is_still_subscribed(&self, topic: &str, sequence: u64) -> bool {
        self.topics.read().get(topic).is_some_and(|t| {
            t.sync_subscribers.iter().any(|entry| entry.sequence == sequence)
                || t.async_subscribers.iter().any(|entry| entry.sequence == sequence)
        })
    }

    /// Convenience for topics that carry no payload.
    pub fn publish_empty(&self, topic: &str) {
        self.publish(topic, Message::Empty);
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn sync_subscribers_run_in_subscription_order() {
        let bus = PubSub::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let o1 = order.clone();
        bus.subscribe("topic", move |_| o1.lock().push(1));
        let o2 = order.clone();
        bus.subscribe("topic", move |_| o2.lock().push(2));

        bus.publish_empty("topic");
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn publish_on_unsubscribed_topic_is_a_no_op() {
        let bus = PubSub::new();
        bus.publish_empty("nothing-here");
    }

    #[test]
    fn unsubscribe_removes_the_callback_from_future_publications() {
        let bus = PubSub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let id = bus.subscribe("topic", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish_empty("topic");
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.unsubscribe(&id);
        bus.publish_empty("topic");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn a_subscriber_that_unsubscribes_itself_mid_dispatch_is_skipped_for_the_current_publication() {
        let bus = PubSub::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        // `self_id` is populated once `subscribe` returns below; the
        // callback closes over a cell so it can reach its own id.
        let self_id: Arc<parking_lot::Mutex<Option<SubscriptionId>>> = Arc::new(parking_lot::Mutex::new(None));
        let bus_for_callback = bus.clone();
        let id_for_callback = self_id.clone();
        let o1 = order.clone();
        let first = bus.subscribe("topic", move |_| {
            o1.lock().push(1);
            if let Some(id) = id_for_callback.lock().as_ref() {
                bus_for_callback.unsubscribe(id);
            }
        });
        *self_id.lock() = Some(first);

        let o2 = order.clone();
        bus.subscribe("topic", move |_| o2.lock().push(2));

        // First subscriber unsubscribes itself; since it already ran this
        // publication, both still fire once this round.
        bus.publish_empty("topic");
        assert_eq!(*order.lock(), vec![1, 2]);

        // Second publication: the first subscriber is gone.
        bus.publish_empty("topic");
        assert_eq!(*order.lock(), vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn async_subscriber_runs_without_blocking_publish() {
        let bus = PubSub::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        bus.subscribe_async("topic", move |_| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        bus.publish_empty("topic");
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
