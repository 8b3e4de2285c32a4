// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Runtime layer: the application host, the event-flow engine, and the
//! collaborators that drive it (bus, tick governor, triggers, expression
//! builder, alert bus, proactor).

pub mod alert_bus;
pub mod app;
pub mod bus;
pub mod expression_builder;
pub mod pipeline_runtime;
pub mod proactor;
pub mod tick_governor;
pub mod trigger_framework;

pub use alert_bus::AlertBus;
pub use app::Application;
pub use bus::{Message, PubSub};
pub use expression_builder::{ExpressionBuilder, NodeDescriptor};
pub use pipeline_runtime::{NoOpMetricsSink, Pipeline, PipelineMetricsSink};
pub use proactor::ProactorService;
