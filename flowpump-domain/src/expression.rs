// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The expression engine's evaluable node contract (spec.md §4.9). Grounded
//! on `original_source/bspump/declarative/expression/logical/{andexpr,
//! equalsexpr}.py`: each node is callable as `node(context, event)`. Nodes
//! must be pure relative to their declared inputs.

use crate::event::{Context, Event};
use serde_json::Value;

/// A node in the declarative expression tree.
pub trait Expression: Send + Sync {
    fn evaluate(&self, context: &Context, event: &Event) -> Value;

    /// The `class` tag this node was built from, used for diagnostics.
    fn class_name(&self) -> &'static str;
}
