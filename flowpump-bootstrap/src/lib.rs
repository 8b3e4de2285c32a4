// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # FlowPump Bootstrap
//!
//! Entry-point concerns kept separate from the runtime crate: CLI parsing,
//! signal handling, shutdown coordination, and process exit codes. None of
//! this depends on `flowpump-domain` — it only knows how to get a process
//! started and stopped cleanly.

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, Cli, ParseError, ValidatedCli};
pub use exit_code::ExitCode;
pub use logger::{BootstrapLogger, ConsoleLogger, NoOpLogger};
pub use shutdown::{CancellationToken, ShutdownCoordinator, ShutdownTimeout};

/// Parses CLI arguments and installs a `CancellationToken` wired to
/// SIGINT/SIGTERM. Returns the validated arguments and the token; the
/// caller is expected to hand the token to its application's run loop and
/// to the signal-handling task spawned alongside it.
pub fn bootstrap_cli() -> Result<(ValidatedCli, CancellationToken), ParseError> {
    let validated = cli::parse_and_validate()?;
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if let Err(error) = signals::install(signal_token).await {
            tracing::error!(%error, "failed to install signal handlers");
        }
    });
    Ok((validated, token))
}
