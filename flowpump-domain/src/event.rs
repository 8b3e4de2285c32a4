// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Event and context: the two values that flow through a pipeline.
//!
//! An `Event` is an opaque value carried through the pipeline; the core
//! never inspects its shape. A `Context` travels alongside it for
//! out-of-band annotations (timestamps, correlation ids) that processors may
//! read or add to without touching the event itself.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// An opaque event value. Typically a JSON object, but the runtime places no
/// constraints on its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Event(Value);

impl Event {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Out-of-band annotations carried alongside an event. Keys are arbitrary
/// strings (`@timestamp`, `correlation_id`, ...); values are opaque JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context(BTreeMap<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The sentinel a `Processor` returns to terminate an event's flow without
/// error. A dropped event is not delivered and does not advance
/// `MetricEventCount`.
pub enum ProcessorOutcome {
    Forward(Event),
    Drop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_roundtrips_its_value() {
        let e = Event::new(json!({"n": 1}));
        assert_eq!(e.value(), &json!({"n": 1}));
    }

    #[test]
    fn context_insert_and_get() {
        let mut ctx = Context::new();
        assert!(ctx.insert("@timestamp", json!(1_700_000_000)).is_none());
        assert_eq!(ctx.get("@timestamp"), Some(&json!(1_700_000_000)));
        assert!(!ctx.contains_key("missing"));
    }
}
