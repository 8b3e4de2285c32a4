// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metric Registry
//!
//! Concrete metric kinds (Gauge, Counter, EPS counter, duty cycle,
//! histogram) built on top of `flowpump_domain::metrics::{Field, FieldSet}`,
//! plus the registry that creates and flushes them. Grounded on
//! `original_source/asab/metrics/metrics.py`'s five metric classes.
//!
//! Identity is simplified from the three-part `(service, name, static_tags)`
//! key described in spec.md §4.7 to a single registry-wide name string per
//! metric instance; `static_tags` still live on the instance's `FieldSet`
//! and still participate in `locate_or_create`. See DESIGN.md.

use crate::application::pipeline_runtime::PipelineMetricsSink;
use flowpump_domain::metrics::{FieldSet, Tags};
use flowpump_domain::{PipelineId, PumpError};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Snapshot of one field's last-flushed values, for exposition.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldSnapshot {
    pub tags: Tags,
    pub values: std::collections::BTreeMap<String, Value>,
}

/// Last value written, per tag set.
pub struct Gauge {
    fieldset: Mutex<FieldSet>,
    expiration: Duration,
}

impl Gauge {
    fn new(static_tags: Tags, expiration: Duration) -> Self {
        Self {
            fieldset: Mutex::new(FieldSet::new(static_tags)),
            expiration,
        }
    }

    pub fn set(&self, value: f64, tags: Option<&Tags>) {
        let mut fieldset = self.fieldset.lock();
        let idx = fieldset.locate_or_create(tags, self.expiration, SystemTime::now());
        fieldset.field_mut(idx).values.insert("value".to_string(), json!(value));
    }

    pub fn flush(&self, now: SystemTime) -> Vec<FieldSnapshot> {
        let mut fieldset = self.fieldset.lock();
        fieldset.evict_expired(now);
        snapshot(&fieldset)
    }
}

/// Accumulates into `actuals`; `flush` copies into `values` and, in reset
/// mode, zeroes `actuals` back to zero.
pub struct Counter {
    fieldset: Mutex<FieldSet>,
    expiration: Duration,
    reset: bool,
}

impl Counter {
    fn new(static_tags: Tags, expiration: Duration, reset: bool) -> Self {
        Self {
            fieldset: Mutex::new(FieldSet::new(static_tags)),
            expiration,
            reset,
        }
    }

    pub fn add(&self, amount: f64, tags: Option<&Tags>) {
        let mut fieldset = self.fieldset.lock();
        let idx = fieldset.locate_or_create(tags, self.expiration, SystemTime::now());
        let field = fieldset.field_mut(idx);
        let current = field.actuals.get("value").and_then(Value::as_f64).unwrap_or(0.0);
        field.actuals.insert("value".to_string(), json!(current + amount));
    }

    pub fn flush(&self, now: SystemTime) -> Vec<FieldSnapshot> {
        let mut fieldset = self.fieldset.lock();
        for field in fieldset.iter_mut() {
            field.values = field.actuals.clone();
            if self.reset {
                field.actuals.insert("value".to_string(), json!(0.0));
            }
        }
        fieldset.evict_expired(now);
        snapshot(&fieldset)
    }
}

/// Like `Counter`, but `flush` divides the accumulated total by elapsed
/// wall-clock seconds (minimum one tick) to produce an events-per-second
/// rate.
pub struct EpsCounter {
    fieldset: Mutex<FieldSet>,
    expiration: Duration,
    reset: bool,
    last_flush: Mutex<SystemTime>,
    min_interval: Duration,
}

impl EpsCounter {
    fn new(static_tags: Tags, expiration: Duration, reset: bool, min_interval: Duration) -> Self {
        Self {
            fieldset: Mutex::new(FieldSet::new(static_tags)),
            expiration,
            reset,
            last_flush: Mutex::new(SystemTime::now()),
            min_interval,
        }
    }

    pub fn add(&self, amount: f64, tags: Option<&Tags>) {
        let mut fieldset = self.fieldset.lock();
        let idx = fieldset.locate_or_create(tags, self.expiration, SystemTime::now());
        let field = fieldset.field_mut(idx);
        let current = field.actuals.get("value").and_then(Value::as_f64).unwrap_or(0.0);
        field.actuals.insert("value".to_string(), json!(current + amount));
    }

    pub fn flush(&self, now: SystemTime) -> Vec<FieldSnapshot> {
        let mut last_flush = self.last_flush.lock();
        let elapsed = now
            .duration_since(*last_flush)
            .unwrap_or(Duration::ZERO)
            .max(self.min_interval)
            .as_secs_f64();
        *last_flush = now;
        drop(last_flush);

        let mut fieldset = self.fieldset.lock();
        for field in fieldset.iter_mut() {
            let total = field.actuals.get("value").and_then(Value::as_f64).unwrap_or(0.0);
            field.values.insert("eps".to_string(), json!(total / elapsed));
            if self.reset {
                field.actuals.insert("value".to_string(), json!(0.0));
            }
        }
        fieldset.evict_expired(now);
        snapshot(&fieldset)
    }
}

struct DutyState {
    on: bool,
    since: SystemTime,
    on_accum: Duration,
    off_accum: Duration,
}

/// Tracks the fraction of time a named binary state has spent "on" since
/// the last flush. Per-name state (current flag, timestamp of last
/// transition) doesn't fit `Field`'s JSON value map, so it is kept in a
/// side table keyed by the same tag identity and only the derived ratio is
/// published through the fieldset at flush time.
pub struct DutyCycle {
    fieldset: Mutex<FieldSet>,
    states: Mutex<HashMap<String, DutyState>>,
    expiration: Duration,
}

impl DutyCycle {
    fn new(static_tags: Tags, expiration: Duration) -> Self {
        Self {
            fieldset: Mutex::new(FieldSet::new(static_tags)),
            states: Mutex::new(HashMap::new()),
            expiration,
        }
    }

    pub fn set(&self, name: &str, on: bool) {
        let now = SystemTime::now();
        let mut states = self.states.lock();
        let state = states.entry(name.to_string()).or_insert_with(|| DutyState {
            on,
            since: now,
            on_accum: Duration::ZERO,
            off_accum: Duration::ZERO,
        });

        if state.on == on {
            return;
        }

        let elapsed = now.duration_since(state.since).unwrap_or(Duration::ZERO);
        if state.on {
            state.on_accum += elapsed;
        } else {
            state.off_accum += elapsed;
        }
        state.on = on;
        state.since = now;
    }

    pub fn flush(&self, now: SystemTime) -> Vec<FieldSnapshot> {
        let mut states = self.states.lock();
        let mut fieldset = self.fieldset.lock();

        for (name, state) in states.iter_mut() {
            let elapsed = now.duration_since(state.since).unwrap_or(Duration::ZERO);
            if state.on {
                state.on_accum += elapsed;
            } else {
                state.off_accum += elapsed;
            }
            state.since = now;

            let total = (state.on_accum + state.off_accum).as_secs_f64();
            let ratio = if total > 0.0 { state.on_accum.as_secs_f64() / total } else { 0.0 };

            let mut tags = Tags::new();
            tags.insert("name".to_string(), name.clone());
            let idx = fieldset.locate_or_create(Some(&tags), self.expiration, now);
            fieldset.field_mut(idx).values.insert("duty_cycle".to_string(), json!(ratio));

            state.on_accum = Duration::ZERO;
            state.off_accum = Duration::ZERO;
        }

        fieldset.evict_expired(now);
        snapshot(&fieldset)
    }
}

/// Cumulative bucket counts (value <= upper bound). An implicit `+Inf`
/// bucket is appended automatically; callers supply the finite bounds in
/// strictly ascending order.
pub struct Histogram {
    fieldset: Mutex<FieldSet>,
    buckets: Vec<f64>,
    expiration: Duration,
    reset: bool,
}

impl Histogram {
    fn new(static_tags: Tags, buckets: Vec<f64>, expiration: Duration, reset: bool) -> Result<Self, PumpError> {
        if buckets.is_empty() {
            return Err(PumpError::metrics("histogram requires at least one finite bucket bound"));
        }
        for window in buckets.windows(2) {
            if window[0] >= window[1] {
                return Err(PumpError::metrics("histogram buckets must be strictly ascending"));
            }
        }

        let mut all_buckets = buckets;
        all_buckets.push(f64::INFINITY);
        if all_buckets.len() < 2 {
            return Err(PumpError::metrics("histogram requires at least two buckets including +Inf"));
        }

        Ok(Self {
            fieldset: Mutex::new(FieldSet::new(static_tags)),
            buckets: all_buckets,
            expiration,
            reset,
        })
    }

    pub fn observe(&self, value: f64, tags: Option<&Tags>) {
        let mut fieldset = self.fieldset.lock();
        let idx = fieldset.locate_or_create(tags, self.expiration, SystemTime::now());
        let field = fieldset.field_mut(idx);
        for &bound in &self.buckets {
            if value <= bound {
                let key = bucket_label(bound);
                let current = field.actuals.get(&key).and_then(Value::as_u64).unwrap_or(0);
                field.actuals.insert(key, json!(current + 1));
            }
        }
    }

    pub fn flush(&self, now: SystemTime) -> Vec<FieldSnapshot> {
        let mut fieldset = self.fieldset.lock();
        for field in fieldset.iter_mut() {
            field.values = field.actuals.clone();
            if self.reset {
                field.actuals.clear();
            }
        }
        fieldset.evict_expired(now);
        snapshot(&fieldset)
    }
}

fn bucket_label(bound: f64) -> String {
    if bound.is_infinite() {
        "le_+Inf".to_string()
    } else {
        format!("le_{bound}")
    }
}

fn snapshot(fieldset: &FieldSet) -> Vec<FieldSnapshot> {
    fieldset
        .iter()
        .map(|field| FieldSnapshot {
            tags: field.tags.clone(),
            values: field.values.clone(),
        })
        .collect()
}

enum Metric {
    Gauge(Arc<Gauge>),
    Counter(Arc<Counter>),
    EpsCounter(Arc<EpsCounter>),
    DutyCycle(Arc<DutyCycle>),
    Histogram(Arc<Histogram>),
}

impl Metric {
    fn flush(&self, now: SystemTime) -> Vec<FieldSnapshot> {
        match self {
            Metric::Gauge(m) => m.flush(now),
            Metric::Counter(m) => m.flush(now),
            Metric::EpsCounter(m) => m.flush(now),
            Metric::DutyCycle(m) => m.flush(now),
            Metric::Histogram(m) => m.flush(now),
        }
    }
}

/// Owns every metric created through it and exposes a flush-everything
/// operation for the HTTP exposition endpoint and the tick governor.
pub struct MetricsRegistry {
    expiration: Duration,
    metrics: Mutex<HashMap<String, Metric>>,
}

impl MetricsRegistry {
    pub fn new(expiration: Duration) -> Self {
        Self {
            expiration,
            metrics: Mutex::new(HashMap::new()),
        }
    }

    pub fn gauge(&self, name: &str, static_tags: Tags) -> Arc<Gauge> {
        let mut metrics = self.metrics.lock();
        match metrics.get(name) {
            Some(Metric::Gauge(existing)) => existing.clone(),
            _ => {
                let metric = Arc::new(Gauge::new(static_tags, self.expiration));
                metrics.insert(name.to_string(), Metric::Gauge(metric.clone()));
                metric
            }
        }
    }

    pub fn counter(&self, name: &str, static_tags: Tags, reset: bool) -> Arc<Counter> {
        let mut metrics = self.metrics.lock();
        match metrics.get(name) {
            Some(Metric::Counter(existing)) => existing.clone(),
            _ => {
                let metric = Arc::new(Counter::new(static_tags, self.expiration, reset));
                metrics.insert(name.to_string(), Metric::Counter(metric.clone()));
                metric
            }
        }
    }

    pub fn eps_counter(&self, name: &str, static_tags: Tags, reset: bool, tick_period: Duration) -> Arc<EpsCounter> {
        let mut metrics = self.metrics.lock();
        match metrics.get(name) {
            Some(Metric::EpsCounter(existing)) => existing.clone(),
            _ => {
                let metric = Arc::new(EpsCounter::new(static_tags, self.expiration, reset, tick_period));
                metrics.insert(name.to_string(), Metric::EpsCounter(metric.clone()));
                metric
            }
        }
    }

    pub fn duty_cycle(&self, name: &str, static_tags: Tags) -> Arc<DutyCycle> {
        let mut metrics = self.metrics.lock();
        match metrics.get(name) {
            Some(Metric::DutyCycle(existing)) => existing.clone(),
            _ => {
                let metric = Arc::new(DutyCycle::new(static_tags, self.expiration));
                metrics.insert(name.to_string(), Metric::DutyCycle(metric.clone()));
                metric
            }
        }
    }

    pub fn histogram(&self, name: &str, static_tags: Tags, buckets: Vec<f64>, reset: bool) -> Result<Arc<Histogram>, PumpError> {
        let mut metrics = self.metrics.lock();
        if let Some(Metric::Histogram(existing)) = metrics.get(name) {
            return Ok(existing.clone());
        }
        let metric = Arc::new(Histogram::new(static_tags, buckets, self.expiration, reset)?);
        metrics.insert(name.to_string(), Metric::Histogram(metric.clone()));
        Ok(metric)
    }

    /// Flushes every registered metric and returns a name-keyed snapshot,
    /// suitable for JSON exposition.
    pub fn flush_all(&self, now: SystemTime) -> HashMap<String, Vec<FieldSnapshot>> {
        let metrics = self.metrics.lock();
        metrics.iter().map(|(name, metric)| (name.clone(), metric.flush(now))).collect()
    }
}

/// Bridges the pipeline runtime's per-event/per-processor observability
/// hooks into the metric registry: one EPS counter for event throughput per
/// pipeline, one histogram-free duration gauge per processor.
pub struct PipelineMetrics {
    registry: Arc<MetricsRegistry>,
}

impl PipelineMetrics {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }
}

impl PipelineMetricsSink for PipelineMetrics {
    fn record_event(&self, pipeline_id: &PipelineId) {
        let mut tags = Tags::new();
        tags.insert("pipeline".to_string(), pipeline_id.as_str().to_string());
        self.registry.eps_counter("pipeline.events", Tags::new(), true, Duration::from_secs(1)).add(1.0, Some(&tags));
    }

    fn record_processor_time(&self, pipeline_id: &PipelineId, processor: &str, elapsed: Duration) {
        let mut tags = Tags::new();
        tags.insert("pipeline".to_string(), pipeline_id.as_str().to_string());
        tags.insert("processor".to_string(), processor.to_string());
        self.registry
            .gauge("pipeline.processor_time_seconds", Tags::new())
            .set(elapsed.as_secs_f64(), Some(&tags));
    }
}
