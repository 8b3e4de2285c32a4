// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Setup
//!
//! Installs a `tracing-subscriber` formatter. `-v/--verbose` (or
//! `flowpump:general.verbose` in the configuration file) raises the
//! default filter from `info` to `debug`.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber. Safe to call at most once per
/// process; a second call is a logic error in the caller, not something
/// this function defends against.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}
