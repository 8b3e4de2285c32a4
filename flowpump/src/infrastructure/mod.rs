// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! External collaborators: configuration loading, logging setup, the
//! metric registry and its HTTP exposition, and concrete transport
//! adapters. The pipeline runtime in `application` consumes only their
//! trait contracts.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod metrics;

pub use config::Settings;
