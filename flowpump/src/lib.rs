// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # FlowPump
//!
//! A streaming data-processing pipeline runtime: sources push events
//! through an ordered chain of processors and generators to a terminal
//! sink, gated by backpressure and a pluggable error handler, with a
//! publish/subscribe bus, a tick governor, a tag-indexed metric registry,
//! an alert bus, and a small declarative expression engine tying it all
//! together.
//!
//! The `application` module is the runtime: the event-flow engine, the
//! process-wide application host, and their collaborators. `infrastructure`
//! holds everything that talks to the outside world — configuration,
//! logging, metrics exposition, and transport adapters — consumed only
//! through trait contracts defined in `flowpump_domain`.

pub mod application;
pub mod infrastructure;

pub use flowpump_domain as domain;
