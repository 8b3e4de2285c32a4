// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling. Parses the two flags the core consumes
//! (spec.md §6): `-c/--config PATH` and `-v/--verbose`.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "flowpump", about = "Streaming data-processing pipeline runtime", version)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI arguments after validation.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// Parse and validate CLI arguments. Clap handles `--help`/`--version` and
/// exits the process on its own.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = Cli::parse();
    validate(cli)
}

fn validate(cli: Cli) -> Result<ValidatedCli, ParseError> {
    if let Some(ref path) = cli.config {
        if path.as_os_str().is_empty() {
            return Err(ParseError::InvalidValue {
                arg: "config".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    Ok(ValidatedCli {
        config: cli.config,
        verbose: cli.verbose,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_flags() {
        let cli = Cli::try_parse_from(["flowpump"]).unwrap();
        let validated = validate(cli).unwrap();
        assert!(!validated.verbose);
        assert!(validated.config.is_none());
    }

    #[test]
    fn parses_config_and_verbose() {
        let cli = Cli::try_parse_from(["flowpump", "-c", "flowpump.ini", "-v"]).unwrap();
        let validated = validate(cli).unwrap();
        assert!(validated.verbose);
        assert_eq!(validated.config, Some(PathBuf::from("flowpump.ini")));
    }
}
