// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pipeline identity and the error-state triple.
//!
//! This module holds the data shapes the runtime operates on
//! (`PipelineId`, `ErrorState`, `ThrottleOwner`). The scheduling behavior
//! itself — event flow, backpressure, readiness — lives in the
//! `flowpump` crate's `application::pipeline_runtime` module; this crate
//! only defines what a pipeline *is*, not how it runs.

use crate::event::{Context, Event};
use crate::error::PumpError;
use std::fmt;

/// Unique string identifying a pipeline within the application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PipelineId(String);

impl PipelineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token held by a downstream stage while it cannot accept more
/// input. The pipeline is ready iff no owners are registered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThrottleOwner(String);

impl ThrottleOwner {
    pub fn new(owner: impl Into<String>) -> Self {
        Self(owner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThrottleOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `(event, context, error)` triple installed when a pipeline halts.
/// While present, invariant 1 (spec.md §3) holds: the pipeline is never
/// ready and must not advance events.
#[derive(Debug, Clone)]
pub struct ErrorState {
    pub event: Event,
    pub context: Context,
    pub error: String,
    /// Whether this error was classified soft by the registered error
    /// handler. Soft errors clear automatically after the `<pipeline>.error!`
    /// publish; hard errors remain until cleared via the explicit API.
    pub soft: bool,
}

impl ErrorState {
    pub fn hard(event: Event, context: Context, error: impl Into<String>) -> Self {
        Self {
            event,
            context,
            error: error.into(),
            soft: false,
        }
    }

    pub fn soft(event: Event, context: Context, error: impl Into<String>) -> Self {
        Self {
            event,
            context,
            error: error.into(),
            soft: true,
        }
    }
}

/// Reclassifies a routed error as soft (recoverable, pipeline resumes after
/// the `<pipeline>.error!` publish) or hard (halts until explicitly
/// cleared). Unhandled errors — no registered handler, or the handler
/// itself erroring — are always hard (spec.md §4.1, §7).
pub trait ErrorHandler: Send + Sync {
    fn classify(&self, pipeline_id: &PipelineId, error: &PumpError) -> ErrorClassification;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    Soft,
    Hard,
}

/// Default handler: everything is hard, matching "unhandled errors are
/// always hard" (spec.md §4.1).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysHardErrorHandler;

impl ErrorHandler for AlwaysHardErrorHandler {
    fn classify(&self, _pipeline_id: &PipelineId, _error: &PumpError) -> ErrorClassification {
        ErrorClassification::Hard
    }
}
