// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

pub mod http_endpoint;
pub mod registry;

pub use registry::{Counter, DutyCycle, EpsCounter, FieldSnapshot, Gauge, Histogram, MetricsRegistry, PipelineMetrics};
