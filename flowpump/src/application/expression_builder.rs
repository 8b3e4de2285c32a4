// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Expression Builder
//!
//! Constructs `Expression` trees from declarative `{class: NAME, ...}`
//! descriptors. Grounded on `original_source/bspump/declarative/expression/
//! logical/{andexpr,equalsexpr}.py`: `AND` short-circuits over an ordered
//! list of items, `EQUALS` compares items pairwise.

use flowpump_domain::{Context, Event, Expression, PumpError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A declarative node descriptor: `{class: NAME, items: [...], ...}`.
/// Deserialized straight from configuration or pipeline declarations.
pub type NodeDescriptor = Value;

type NodeFactory = Arc<dyn Fn(&NodeDescriptor, &ExpressionBuilder) -> Result<Box<dyn Expression>, PumpError> + Send + Sync>;

/// Registry mapping a descriptor's `class` field to a node factory. Built-in
/// classes (`AND`, `EQUALS`) are registered by `ExpressionBuilder::new`;
/// callers may register additional classes before building.
pub struct ExpressionBuilder {
    factories: HashMap<String, NodeFactory>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        let mut builder = Self { factories: HashMap::new() };
        builder.register("AND", |descriptor, builder| {
            let items = parse_items(descriptor, builder)?;
            Ok(Box::new(AndExpr { items }) as Box<dyn Expression>)
        });
        builder.register("EQUALS", |descriptor, builder| {
            let items = parse_items(descriptor, builder)?;
            if items.len() < 2 {
                return Err(PumpError::configuration("EQUALS requires at least two items"));
            }
            Ok(Box::new(EqualsExpr { items }) as Box<dyn Expression>)
        });
        builder
    }

    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn(&NodeDescriptor, &ExpressionBuilder) -> Result<Box<dyn Expression>, PumpError> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Arc::new(factory));
    }

    /// Builds one node from a descriptor. Recurses into nested descriptors
    /// via the same registry.
    pub fn build(&self, descriptor: &NodeDescriptor) -> Result<Box<dyn Expression>, PumpError> {
        let class = descriptor
            .get("class")
            .and_then(Value::as_str)
            .ok_or_else(|| PumpError::configuration("expression descriptor missing 'class'"))?;

        let factory = self
            .factories
            .get(class)
            .ok_or_else(|| PumpError::configuration(format!("unknown expression class '{class}'")))?;

        factory(descriptor, self)
    }
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_items(descriptor: &NodeDescriptor, builder: &ExpressionBuilder) -> Result<Vec<Box<dyn Expression>>, PumpError> {
    let items = descriptor
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| PumpError::configuration("expression descriptor missing 'items' array"))?;

    items.iter().map(|item| builder.build(item)).collect()
}

/// A literal value, not further evaluated against context/event.
pub struct Literal {
    value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Expression for Literal {
    fn evaluate(&self, _context: &Context, _event: &Event) -> Value {
        self.value.clone()
    }

    fn class_name(&self) -> &'static str {
        "LITERAL"
    }
}

/// Reads a dotted path out of the event's JSON value, or `null` if absent.
pub struct EventPath {
    path: Vec<String>,
}

impl EventPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into().split('.').map(str::to_string).collect(),
        }
    }
}

impl Expression for EventPath {
    fn evaluate(&self, _context: &Context, event: &Event) -> Value {
        let mut current = event.value();
        for segment in &self.path {
            match current.get(segment) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        current.clone()
    }

    fn class_name(&self) -> &'static str {
        "EVENT_PATH"
    }
}

struct AndExpr {
    items: Vec<Box<dyn Expression>>,
}

impl Expression for AndExpr {
    fn evaluate(&self, context: &Context, event: &Event) -> Value {
        for item in &self.items {
            if !truthy(&item.evaluate(context, event)) {
                return Value::Bool(false);
            }
        }
        Value::Bool(true)
    }

    fn class_name(&self) -> &'static str {
        "AND"
    }
}

struct EqualsExpr {
    items: Vec<Box<dyn Expression>>,
}

impl Expression for EqualsExpr {
    fn evaluate(&self, context: &Context, event: &Event) -> Value {
        let first = self.items[0].evaluate(context, event);
        let all_equal = self.items[1..].iter().all(|item| item.evaluate(context, event) == first);
        Value::Bool(all_equal)
    }

    fn class_name(&self) -> &'static str {
        "EQUALS"
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
