// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Integration tests walking through the concrete scenarios a complete
//! pipeline runtime must support: an echo pass-through, backpressure
//! gating, generator fan-out, an error halting readiness, histogram
//! observation, and the tick governor's coarser multiples.

use async_trait::async_trait;
use flowpump::application::bus::Message;
use flowpump::application::tick_governor;
use flowpump::application::{Pipeline, PipelineMetricsSink};
use flowpump::infrastructure::metrics::{MetricsRegistry, PipelineMetrics};
use flowpump_bootstrap::CancellationToken;
use flowpump_domain::traits::{Generator, PipelineHandle, Processor};
use flowpump_domain::{Context, Event, PipelineId, ProcessorOutcome, PumpError, Stage};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

struct Uppercase;

impl Processor for Uppercase {
    fn process(&self, _context: &mut Context, event: Event) -> Result<ProcessorOutcome, PumpError> {
        let text = event.value().as_str().unwrap_or_default().to_uppercase();
        Ok(ProcessorOutcome::Forward(Event::new(json!(text))))
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}

struct CollectingSink {
    received: Arc<Mutex<Vec<Event>>>,
}

impl Processor for CollectingSink {
    fn process(&self, _context: &mut Context, event: Event) -> Result<ProcessorOutcome, PumpError> {
        self.received.lock().push(event.clone());
        Ok(ProcessorOutcome::Forward(event))
    }

    fn name(&self) -> &str {
        "collecting-sink"
    }
}

/// Scenario: echo pipeline. A single uppercasing processor feeds a sink;
/// one event in yields one event out, unchanged in shape.
#[tokio::test]
async fn echo_pipeline_forwards_a_transformed_event_to_the_sink() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::build_simple(
        PipelineId::new("echo"),
        vec![Stage::Processor(Box::new(Uppercase))],
        Box::new(CollectingSink { received: received.clone() }),
    )
    .unwrap();

    pipeline.process(Context::new(), Event::new(json!("hello"))).await.unwrap();

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].value(), &json!("HELLO"));
}

/// Scenario: backpressure. A throttle owner makes the pipeline not-ready;
/// `ready()` only resolves after the owner releases it, and a
/// `<pipeline>.not_ready!`/`ready!` pair is published around the window.
#[tokio::test]
async fn backpressure_gates_readiness_until_the_throttle_owner_releases() {
    let pipeline = Pipeline::build_simple(
        PipelineId::new("throttled"),
        vec![Stage::Processor(Box::new(Uppercase))],
        Box::new(CollectingSink { received: Arc::new(Mutex::new(Vec::new())) }),
    )
    .unwrap();

    let not_ready_count = Arc::new(AtomicU64::new(0));
    let ready_count = Arc::new(AtomicU64::new(0));
    {
        let counter = not_ready_count.clone();
        pipeline.bus().subscribe("throttled.not_ready!", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let counter = ready_count.clone();
        pipeline.bus().subscribe("throttled.ready!", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    let handle: &dyn PipelineHandle = &pipeline;
    pipeline.throttle("downstream-sink", true);
    assert_eq!(not_ready_count.load(Ordering::SeqCst), 1);

    let pipeline_for_release = pipeline.clone();
    let release_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        pipeline_for_release.throttle("downstream-sink", false);
    });

    handle.ready().await;
    release_task.await.unwrap();
    assert_eq!(ready_count.load(Ordering::SeqCst), 1);
}

struct Fanout {
    copies: usize,
}

#[async_trait]
impl Generator for Fanout {
    async fn generate(
        &self,
        pipeline: Arc<dyn PipelineHandle>,
        context: Context,
        event: Event,
        depth: usize,
    ) -> Result<(), PumpError> {
        for n in 0..self.copies {
            let mut tagged = context.clone();
            tagged.insert("copy", json!(n));
            pipeline.inject(tagged, event.clone(), depth).await?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fanout"
    }
}

/// Scenario: generator fan-out. A single inbound event produces several
/// downstream events, each retaining the generator's own annotation.
#[tokio::test]
async fn generator_fans_one_event_out_into_several_downstream_events() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::build_simple(
        PipelineId::new("fanout"),
        vec![Stage::Generator(Box::new(Fanout { copies: 4 }))],
        Box::new(CollectingSink { received: received.clone() }),
    )
    .unwrap();

    pipeline.process(Context::new(), Event::new(json!("source-event"))).await.unwrap();

    let received = received.lock();
    assert_eq!(received.len(), 4);
    for event in received.iter() {
        assert_eq!(event.value(), &json!("source-event"));
    }
}

struct AlwaysFails;

impl Processor for AlwaysFails {
    fn process(&self, _context: &mut Context, _event: Event) -> Result<ProcessorOutcome, PumpError> {
        Err(PumpError::processor("always-fails", "simulated failure"))
    }

    fn name(&self) -> &str {
        "always-fails"
    }
}

/// Scenario: an unhandled processor error halts the pipeline. The default
/// `AlwaysHardErrorHandler` installs a hard error state, `ready()` never
/// resolves until it is explicitly cleared, and a `<pipeline>.error!`
/// message is published.
#[tokio::test]
async fn processor_error_halts_readiness_until_explicitly_cleared() {
    let pipeline = Pipeline::build_simple(
        PipelineId::new("erroring"),
        vec![Stage::Processor(Box::new(AlwaysFails))],
        Box::new(CollectingSink { received: Arc::new(Mutex::new(Vec::new())) }),
    )
    .unwrap();

    let error_messages = Arc::new(AtomicU64::new(0));
    {
        let counter = error_messages.clone();
        pipeline.bus().subscribe("erroring.error!", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    let result = pipeline.process(Context::new(), Event::new(json!(1))).await;
    assert!(result.is_err());
    assert_eq!(error_messages.load(Ordering::SeqCst), 1);
    assert!(!pipeline.error_state().unwrap().soft);

    let handle: &dyn PipelineHandle = &pipeline;
    let ready_future = handle.ready();
    tokio::select! {
        _ = ready_future => panic!("pipeline should not be ready while a hard error is installed"),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {}
    }

    // spec.md §8 scenario 4: subsequent process() calls are refused until
    // cleared, rather than silently re-running the halted pipeline.
    let refused = pipeline.process(Context::new(), Event::new(json!(2))).await;
    assert!(matches!(refused, Err(PumpError::PipelineHalted { .. })));
    // A refused call must not publish a second error! or re-invoke the
    // failing processor.
    assert_eq!(error_messages.load(Ordering::SeqCst), 1);

    pipeline.clear_error();
    handle.ready().await;

    // Once cleared, the pipeline actually runs the next event through the
    // stage list again rather than short-circuiting it (this processor
    // always fails, so it surfaces as a fresh Processor error, not a
    // PipelineHalted refusal).
    let result = pipeline.process(Context::new(), Event::new(json!(3))).await;
    assert!(matches!(result, Err(PumpError::Processor { .. })));
    assert_eq!(error_messages.load(Ordering::SeqCst), 2);
}

struct RecordingSink;

impl Processor for RecordingSink {
    fn process(&self, _context: &mut Context, event: Event) -> Result<ProcessorOutcome, PumpError> {
        Ok(ProcessorOutcome::Forward(event))
    }

    fn name(&self) -> &str {
        "recording-sink"
    }
}

/// Scenario: histogram observation. Counts in every bucket whose bound is
/// at or above the observed value, cumulative across buckets, with an
/// always-present `+Inf` overflow bucket.
#[tokio::test]
async fn histogram_buckets_counts_are_cumulative_across_observations() {
    let registry = MetricsRegistry::new(Duration::from_secs(60));
    let histogram = registry
        .histogram("request.latency_seconds", Default::default(), vec![0.1, 0.5, 1.0], false)
        .unwrap();

    histogram.observe(0.05, None);
    histogram.observe(0.3, None);
    histogram.observe(2.5, None);

    let snapshot = histogram.flush(SystemTime::now());
    assert_eq!(snapshot.len(), 1);
    let values = &snapshot[0].values;

    assert_eq!(values.get("le_0.1").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(values.get("le_0.5").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(values.get("le_1").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(values.get("le_+Inf").and_then(|v| v.as_u64()), Some(3));
}

/// Exercises `PipelineMetrics` end to end: events and processor timings
/// recorded through a live pipeline show up in the backing registry.
#[tokio::test]
async fn pipeline_metrics_sink_records_events_delivered_through_a_real_pipeline() {
    let registry = Arc::new(MetricsRegistry::new(Duration::from_secs(60)));
    let sink: Arc<dyn PipelineMetricsSink> = Arc::new(PipelineMetrics::new(registry.clone()));

    let pipeline = Pipeline::build_simple(
        PipelineId::new("metered"),
        vec![Stage::Processor(Box::new(Uppercase))],
        Box::new(RecordingSink),
    )
    .unwrap()
    .with_metrics_sink(sink);

    pipeline.process(Context::new(), Event::new(json!("a"))).await.unwrap();
    pipeline.process(Context::new(), Event::new(json!("b"))).await.unwrap();

    let flushed = registry.flush_all(SystemTime::now());
    assert!(flushed.contains_key("pipeline.events"));
    assert!(flushed.contains_key("pipeline.processor_time_seconds"));
}

/// Scenario: tick governor multiples. Running the governor for enough
/// cycles at a short period publishes both the plain tick and its 10-cycle
/// multiple, in the right ratio.
#[tokio::test]
async fn tick_governor_publishes_both_plain_and_tenth_cycle_ticks() {
    let bus = flowpump::application::PubSub::new();
    let token = CancellationToken::new();

    let plain_ticks = Arc::new(AtomicU64::new(0));
    let tick_10 = Arc::new(AtomicU64::new(0));
    {
        let counter = plain_ticks.clone();
        bus.subscribe("Application.tick!", move |message| {
            if matches!(message, Message::Cycle(_)) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
    }
    {
        let counter = tick_10.clone();
        bus.subscribe("Application.tick/10!", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    let stop_token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(125)).await;
        stop_token.cancel();
    });

    tick_governor::run(&bus, &token, Duration::from_millis(10)).await;

    let plain = plain_ticks.load(Ordering::SeqCst);
    let tenths = tick_10.load(Ordering::SeqCst);
    assert!(plain >= 10, "expected at least 10 plain ticks, saw {plain}");
    assert!(tenths >= 1, "expected at least one tick/10, saw {tenths}");
    assert!(plain >= tenths * 10);
}
