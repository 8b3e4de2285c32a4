// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pump Error
//!
//! The error type shared across the pipeline runtime and its collaborators.
//! Variants correspond to the error kinds enumerated in the error handling
//! design: transient processor errors, source errors, configuration errors
//! raised at build time, and fatal infrastructure errors. Backpressure is
//! deliberately not representable here — it is signalled through
//! `Pipeline::throttle`, never through an error.

use thiserror::Error;

/// Errors that can occur anywhere in the pipeline runtime or its
/// collaborators.
#[derive(Debug, Clone, Error)]
pub enum PumpError {
    /// Raised inside a `Processor::process` or `Generator::generate` call.
    #[error("processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    /// Raised inside a `Source::cycle`/`Source::main`.
    #[error("source '{source}' failed: {message}")]
    Source { source: String, message: String },

    /// Surfaced at pipeline build time or configuration load time; aborts
    /// startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A re-injection attempted to enter the pipeline at a depth shallower
    /// than the generator's own index.
    #[error("generator at index {generator_index} attempted to inject at depth {attempted_depth}")]
    DepthViolation {
        generator_index: usize,
        attempted_depth: usize,
    },

    /// An operation was attempted against a pipeline currently halted by an
    /// `ErrorState`.
    #[error("pipeline '{pipeline_id}' is halted: {reason}")]
    PipelineHalted { pipeline_id: String, reason: String },

    /// Loop-level infrastructure failure (bus, tick governor, proactor).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// A metric operation failed (malformed buckets, unknown field, etc).
    #[error("metrics error: {0}")]
    Metrics(String),
}

impl PumpError {
    pub fn processor(processor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processor {
            processor: processor.into(),
            message: message.into(),
        }
    }

    pub fn source(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure(message.into())
    }

    pub fn metrics(message: impl Into<String>) -> Self {
        Self::Metrics(message.into())
    }

    /// Whether this error kind is ever eligible for soft (recoverable)
    /// classification by an error handler. Configuration and depth-violation
    /// errors are always hard.
    pub fn is_recoverable_kind(&self) -> bool {
        matches!(self, Self::Processor { .. } | Self::Source { .. })
    }
}
