// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Trigger contract (spec.md §4.4). A trigger fires named pulses; a
//! `TriggeredSource` subscribes to one or more and runs a `cycle()` per
//! pulse, with pulses coalesced while a cycle is in progress.

use async_trait::async_trait;
use tokio::sync::watch;

/// A pulse producer. `subscribe` returns a receiver that is notified
/// (via a unit `watch` channel) on every pulse; receivers that lag behind
/// simply observe the latest pulse, which is how coalescing is implemented
/// at the source side (spec.md §4.4, "pulses ... coalesced").
#[async_trait]
pub trait Trigger: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<u64>;

    fn name(&self) -> &str;
}
