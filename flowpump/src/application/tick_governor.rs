// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tick Governor
//!
//! Drives the application's run-time heartbeat: every `tick_period`, it
//! publishes `Application.tick!` and, on top of that, publishes coarser
//! `Application.tick/N!` topics whenever the cycle count is a multiple of N.
//! The multiples mirror a typical monitoring cadence — every 10, 60, 300,
//! 600, 1800, 3600, 43200, and 86400 cycles.

use crate::application::bus::{Message, PubSub};
use flowpump_bootstrap::CancellationToken;
use std::time::Duration;

const TICK_MULTIPLES: &[u64] = &[10, 60, 300, 600, 1800, 3600, 43200, 86400];

/// Runs the tick loop until `token` is cancelled. Intended to be raced
/// against the application's `main()` future with first-exception semantics.
pub async fn run(bus: &PubSub, token: &CancellationToken, tick_period: Duration) {
    bus.publish_empty("Application.run!");

    let mut cycle_no: u64 = 0;
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(tick_period) => {
                cycle_no += 1;
                bus.publish("Application.tick!", Message::Cycle(cycle_no));
                for &multiple in TICK_MULTIPLES {
                    if cycle_no % multiple == 0 {
                        bus.publish(&format!("Application.tick/{multiple}!"), Message::Cycle(cycle_no));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn publishes_plain_tick_every_cycle() {
        let bus = PubSub::new();
        let token = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let t = ticks.clone();
        bus.subscribe("Application.tick!", move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        });

        let stop_token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(35)).await;
            stop_token.cancel();
        });

        run(&bus, &token, Duration::from_millis(10)).await;
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn publishes_tick_10_only_on_tenth_cycle() {
        let bus = PubSub::new();
        let token = CancellationToken::new();
        let tick10_count = Arc::new(AtomicU64::new(0));
        let t = tick10_count.clone();
        bus.subscribe("Application.tick/10!", move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        });

        let stop_token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(115)).await;
            stop_token.cancel();
        });

        run(&bus, &token, Duration::from_millis(10)).await;
        assert!(tick10_count.load(Ordering::SeqCst) >= 1);
    }
}
