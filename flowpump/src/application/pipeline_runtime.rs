// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Runtime
//!
//! The event-flow engine: a fixed, ordered sequence of processor stages
//! terminated by a mandatory sink, fed by one or more sources, gated by a
//! throttle set, and halted on error until the registered handler or an
//! external caller clears it.
//!
//! Each pipeline owns a single-task event loop in spirit: `submit_at_depth`
//! runs a whole event to completion (or drop, or error) before returning,
//! and the pipeline's processor order is fixed after `build`, so no two
//! in-flight events can observe interleaved mutation of the stage list.
//! Concurrency comes from multiple events in flight across different
//! pipelines and from generator continuations running as independent tasks.

use crate::application::bus::{Message, PubSub};
use async_trait::async_trait;
use flowpump_domain::pipeline::{ErrorClassification, ErrorHandler, ErrorState};
use flowpump_domain::{
    AlwaysHardErrorHandler, Context, Event, PipelineHandle, PipelineId, ProcessorOutcome,
    PumpError, Source, Stage, ThrottleOwner,
};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Sink for per-pipeline observability. Implemented by the metrics registry
/// in `infrastructure::metrics`; kept as a trait here so the runtime does
/// not depend on the concrete metric storage.
pub trait PipelineMetricsSink: Send + Sync {
    fn record_event(&self, pipeline_id: &PipelineId);
    fn record_processor_time(&self, pipeline_id: &PipelineId, processor: &str, elapsed: Duration);
}

/// Discards all observability signal. The default until a real sink is
/// attached.
pub struct NoOpMetricsSink;

impl PipelineMetricsSink for NoOpMetricsSink {
    fn record_event(&self, _pipeline_id: &PipelineId) {}
    fn record_processor_time(&self, _pipeline_id: &PipelineId, _processor: &str, _elapsed: Duration) {}
}

struct Inner {
    id: PipelineId,
    stages: Vec<Stage>,
    throttle_owners: Mutex<BTreeSet<ThrottleOwner>>,
    error_state: Mutex<Option<ErrorState>>,
    error_handler: Box<dyn ErrorHandler>,
    bus: PubSub,
    readiness_notify: Notify,
    metrics_sink: Mutex<Arc<dyn PipelineMetricsSink>>,
}

/// A built, running pipeline. Cloning shares all state — clones are handles,
/// not copies.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    /// Builds a pipeline. `stages` must be non-empty; `sink` is appended as
    /// the mandatory terminal processor, so "a sink only as the last entry"
    /// holds by construction rather than by a runtime check against the
    /// stage list (spec.md §4.1 `build`).
    pub fn build(
        id: PipelineId,
        stages: Vec<Stage>,
        sink: Box<dyn flowpump_domain::traits::Processor>,
        error_handler: Box<dyn ErrorHandler>,
        bus: PubSub,
    ) -> Result<Pipeline, PumpError> {
        if stages.is_empty() {
            return Err(PumpError::configuration(format!(
                "pipeline '{id}' requires at least one processor stage before its sink"
            )));
        }

        let mut all_stages = stages;
        all_stages.push(Stage::Processor(sink));

        Ok(Pipeline {
            inner: Arc::new(Inner {
                id,
                stages: all_stages,
                throttle_owners: Mutex::new(BTreeSet::new()),
                error_state: Mutex::new(None),
                error_handler,
                bus,
                readiness_notify: Notify::new(),
                metrics_sink: Mutex::new(Arc::new(NoOpMetricsSink)),
            }),
        })
    }

    /// Attaches a metrics sink, replacing the no-op default. Typically
    /// called once, right after `build`, before the pipeline's sources are
    /// started.
    pub fn with_metrics_sink(self, sink: Arc<dyn PipelineMetricsSink>) -> Self {
        *self.inner.metrics_sink.lock() = sink;
        self
    }

    /// Builds a pipeline with `AlwaysHardErrorHandler` and a fresh bus.
    /// Convenient for tests and small standalone pipelines.
    pub fn build_simple(
        id: PipelineId,
        stages: Vec<Stage>,
        sink: Box<dyn flowpump_domain::traits::Processor>,
    ) -> Result<Pipeline, PumpError> {
        Self::build(id, stages, sink, Box::new(AlwaysHardErrorHandler), PubSub::new())
    }

    pub fn id(&self) -> &PipelineId {
        &self.inner.id
    }

    pub fn bus(&self) -> &PubSub {
        &self.inner.bus
    }

    /// Runs every source's `main()` loop against this pipeline until each
    /// either returns or is cancelled externally. Returns once all sources
    /// have stopped.
    pub async fn run_sources(self: &Arc<Self>, sources: Vec<Arc<dyn Source>>) {
        let handles = sources.into_iter().map(|source| {
            let pipeline: Arc<dyn PipelineHandle> = self.clone();
            let name = source.name().to_string();
            tokio::spawn(async move {
                if let Err(error) = source.main(pipeline).await {
                    tracing::error!(%error, source = %name, "source exited with error");
                }
            })
        });
        futures::future::join_all(handles).await;
    }

    fn is_ready(&self) -> bool {
        self.inner.throttle_owners.lock().is_empty() && self.inner.error_state.lock().is_none()
    }

    async fn submit_at_depth(&self, mut context: Context, mut event: Event, depth: usize) -> Result<(), PumpError> {
        if let Some(error_state) = self.inner.error_state.lock().clone() {
            return Err(PumpError::PipelineHalted {
                pipeline_id: self.inner.id.to_string(),
                reason: error_state.error,
            });
        }

        let mut index = depth;

        while index < self.inner.stages.len() {
            match &self.inner.stages[index] {
                Stage::Generator(generator) => {
                    let min_depth = index + 1;
                    let scoped: Arc<dyn PipelineHandle> = Arc::new(ScopedHandle {
                        pipeline: self.clone(),
                        min_depth,
                    });
                    let context_for_error = context.clone();
                    let event_for_error = event.clone();
                    let result = generator.generate(scoped, context, event, min_depth).await;
                    if let Err(error) = result {
                        self.route_error(context_for_error, event_for_error, error.clone()).await;
                        return Err(error);
                    }
                    return Ok(());
                }
                Stage::Processor(processor) => {
                    let context_for_error = context.clone();
                    let event_for_error = event.clone();
                    let started = Instant::now();
                    let outcome = processor.process(&mut context, event);
                    let elapsed = started.elapsed();
                    self.inner
                        .metrics_sink
                        .lock()
                        .record_processor_time(&self.inner.id, processor.name(), elapsed);

                    match outcome {
                        Ok(ProcessorOutcome::Drop) => return Ok(()),
                        Ok(ProcessorOutcome::Forward(next_event)) => {
                            event = next_event;
                            index += 1;
                        }
                        Err(error) => {
                            self.route_error(context_for_error, event_for_error, error.clone()).await;
                            return Err(error);
                        }
                    }
                }
            }
        }

        self.inner.metrics_sink.lock().record_event(&self.inner.id);
        Ok(())
    }

    async fn route_error(&self, context: Context, event: Event, error: PumpError) {
        // Configuration/depth-violation/infrastructure/metrics errors are
        // never eligible for soft classification, regardless of what the
        // registered handler says — the handler only gets a vote for error
        // kinds that are actually recoverable.
        let classification = if error.is_recoverable_kind() {
            self.inner.error_handler.classify(&self.inner.id, &error)
        } else {
            ErrorClassification::Hard
        };
        let soft = matches!(classification, ErrorClassification::Soft);
        let state = if soft {
            ErrorState::soft(event, context, error.to_string())
        } else {
            ErrorState::hard(event, context, error.to_string())
        };

        *self.inner.error_state.lock() = Some(state);
        self.inner
            .bus
            .publish(&format!("{}.error!", self.inner.id), Message::Text(error.to_string()));

        if soft {
            *self.inner.error_state.lock() = None;
        }
        self.inner.readiness_notify.notify_waiters();
    }

    /// Explicitly clears a hard error, allowing the pipeline to resume.
    pub fn clear_error(&self) {
        *self.inner.error_state.lock() = None;
        self.inner.readiness_notify.notify_waiters();
    }

    pub fn error_state(&self) -> Option<ErrorState> {
        self.inner.error_state.lock().clone()
    }
}

#[async_trait]
impl PipelineHandle for Pipeline {
    async fn ready(&self) {
        loop {
            if self.is_ready() {
                return;
            }
            let notified = self.inner.readiness_notify.notified();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }

    async fn process(&self, context: Context, event: Event) -> Result<(), PumpError> {
        self.submit_at_depth(context, event, 0).await
    }

    async fn inject(&self, context: Context, event: Event, depth: usize) -> Result<(), PumpError> {
        self.submit_at_depth(context, event, depth).await
    }

    fn throttle(&self, owner: &str, enable: bool) {
        let mut owners = self.inner.throttle_owners.lock();
        let was_ready = owners.is_empty();
        if enable {
            owners.insert(ThrottleOwner::new(owner));
        } else {
            owners.remove(&ThrottleOwner::new(owner));
        }
        let is_ready = owners.is_empty();
        drop(owners);

        if was_ready != is_ready {
            let topic = if is_ready { "ready!" } else { "not_ready!" };
            self.inner.bus.publish_empty(&format!("{}.{}", self.inner.id, topic));
            self.inner.readiness_notify.notify_waiters();
        }
    }

    fn id(&self) -> &str {
        self.inner.id.as_str()
    }
}

/// Wraps a `Pipeline` with a floor on the depth a generator continuation is
/// permitted to re-inject at (spec.md §3 invariant 4; SPEC_FULL.md §4
/// depth-violation note). Handed to a generator in place of the raw
/// pipeline so the floor cannot be bypassed.
struct ScopedHandle {
    pipeline: Pipeline,
    min_depth: usize,
}

#[async_trait]
impl PipelineHandle for ScopedHandle {
    async fn ready(&self) {
        self.pipeline.ready().await
    }

    async fn process(&self, context: Context, event: Event) -> Result<(), PumpError> {
        self.pipeline.process(context, event).await
    }

    async fn inject(&self, context: Context, event: Event, depth: usize) -> Result<(), PumpError> {
        if depth < self.min_depth {
            return Err(PumpError::DepthViolation {
                generator_index: self.min_depth - 1,
                attempted_depth: depth,
            });
        }
        self.pipeline.submit_at_depth(context, event, depth).await
    }

    fn throttle(&self, owner: &str, enable: bool) {
        self.pipeline.throttle(owner, enable)
    }

    fn id(&self) -> &str {
        self.pipeline.id()
    }
}
