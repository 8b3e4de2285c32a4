// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Processor abstractions: the seams the pipeline runtime dispatches
//! through. `Source`, `Processor`, `Generator`, and `Sink` are the four
//! roles a pipeline stage can play (spec.md §4.2-§4.3); `Module` is the
//! application-level lifecycle seam (spec.md §4.10).

use crate::error::PumpError;
use crate::event::{Context, Event, ProcessorOutcome};
use async_trait::async_trait;
use std::sync::Arc;

/// A handle back into the owning pipeline, given to sources and generators
/// so they can observe readiness and re-inject derived events. Implemented
/// by the pipeline runtime in the `flowpump` crate; kept as a trait here so
/// domain-level code never depends on the concrete runtime type.
#[async_trait]
pub trait PipelineHandle: Send + Sync {
    /// Resolves once the pipeline has no throttle owners and no error state.
    async fn ready(&self);

    /// Injects an event at the front door, depth 0.
    async fn process(&self, context: Context, event: Event) -> Result<(), PumpError>;

    /// Re-enters the pipeline at `depth`, used by generator continuations.
    async fn inject(&self, context: Context, event: Event, depth: usize) -> Result<(), PumpError>;

    /// Adds or removes `owner` from the throttle set.
    fn throttle(&self, owner: &str, enable: bool);

    fn id(&self) -> &str;
}

/// Drives events into its parent pipeline. Must await `ready()` between
/// productions and release any external handles cleanly on cancellation.
#[async_trait]
pub trait Source: Send + Sync {
    /// Runs until cancellation. Implementations loop: await `ready()`,
    /// produce one event, call `pipeline.process(...)`.
    async fn main(&self, pipeline: Arc<dyn PipelineHandle>) -> Result<(), PumpError>;

    fn name(&self) -> &str;
}

/// A source driven by `Trigger` pulses rather than its own loop. Each pulse
/// enqueues one `cycle()`; pulses received while a cycle is in flight are
/// coalesced (spec.md §4.4).
#[async_trait]
pub trait TriggeredSource: Send + Sync {
    async fn cycle(&self, pipeline: Arc<dyn PipelineHandle>) -> Result<(), PumpError>;

    fn name(&self) -> &str;
}

/// Synchronous, non-blocking transform. Exceptions (returned `Err`)
/// propagate to the pipeline's error router.
pub trait Processor: Send + Sync {
    fn process(&self, context: &mut Context, event: Event) -> Result<ProcessorOutcome, PumpError>;

    fn name(&self) -> &str;
}

/// A processor that may suspend and later re-inject zero or more derived
/// events at a recorded depth. The generator owns the lifetime of its
/// continuation; the event is considered consumed at this branch the moment
/// `generate` is invoked (spec.md §4.1 step 1, §4.3).
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        pipeline: Arc<dyn PipelineHandle>,
        context: Context,
        event: Event,
        depth: usize,
    ) -> Result<(), PumpError>;

    fn name(&self) -> &str;
}

/// The terminal processor. A marker trait: sinks are `Processor`s that
/// never return `ProcessorOutcome::Forward` past themselves in practice, but
/// the runtime enforces "last entry only" at build time rather than through
/// the type system (spec.md §4.1 `build`).
pub trait Sink: Processor {}
impl<T: Processor + ?Sized> Sink for T {}

/// One of the four roles a stage in `Pipeline::Processors` can occupy.
/// `Generator` stages are dispatched asynchronously; all others
/// synchronously (spec.md §4.1 step 1-2).
pub enum Stage {
    Processor(Box<dyn Processor>),
    Generator(Box<dyn Generator>),
}

impl Stage {
    pub fn name(&self) -> &str {
        match self {
            Stage::Processor(p) => p.name(),
            Stage::Generator(g) => g.name(),
        }
    }
}

/// Application-level lifecycle participant (spec.md §4.10). Modules are
/// notified on `initialize`/`finalize`; services additionally have a name
/// and are looked up by it.
#[async_trait]
pub trait Module: Send + Sync {
    async fn initialize(&self) -> Result<(), PumpError> {
        Ok(())
    }

    async fn finalize(&self) -> Result<(), PumpError> {
        Ok(())
    }

    fn name(&self) -> &str;
}
