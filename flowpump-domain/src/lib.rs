// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # FlowPump Domain
//!
//! Data model and trait contracts for the FlowPump streaming pipeline
//! runtime: events, pipeline identity, the processor abstractions
//! (`Source`/`Processor`/`Generator`/`Sink`), the metric field model, alerts,
//! triggers, and the expression engine's node contract.
//!
//! This crate has no runtime of its own — it defines what the pieces *are*.
//! The scheduling behavior lives in the `flowpump` crate.

pub mod alert;
pub mod error;
pub mod event;
pub mod expression;
pub mod metrics;
pub mod pipeline;
pub mod traits;
pub mod trigger;

pub use alert::{Alert, AlertProvider};
pub use error::PumpError;
pub use event::{Context, Event, ProcessorOutcome};
pub use expression::Expression;
pub use metrics::{Field, FieldSet, Tags};
pub use pipeline::{AlwaysHardErrorHandler, ErrorClassification, ErrorHandler, ErrorState, PipelineId, ThrottleOwner};
pub use traits::{Generator, Module, PipelineHandle, Processor, Sink, Source, Stage, TriggeredSource};
pub use trigger::Trigger;
