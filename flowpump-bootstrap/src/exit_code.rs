// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! Standardized Unix exit codes for the `flowpump` binary, following the
//! BSD `sysexits.h` conventions.
//!
//! ## Exit code ranges
//!
//! - **0**: Success
//! - **1**: General error
//! - **64-78**: Specific error conditions (BSD sysexits.h)
//! - **128+N**: Fatal signal N (e.g. 130 = SIGINT, 143 = SIGTERM)
//!
//! spec.md itself only distinguishes a clean exit (0) from a crash (any
//! non-zero code); the finer-grained variants below exist so a caller that
//! wants to distinguish configuration failure from a signal-driven shutdown
//! from an unexpected internal error can do so, without spec.md needing to
//! enumerate them all itself.

use std::fmt;

/// Exit codes following Unix conventions (BSD `sysexits.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0).
    #[default]
    Success = 0,

    /// General, unclassified error (1).
    GeneralError = 1,

    /// Command line usage error (64): invalid arguments, missing required
    /// arguments, unknown flags.
    UsageError = 64,

    /// Data format error (65): malformed input, parse failure.
    DataError = 65,

    /// Cannot open input (66): file not found, cannot read, permission
    /// denied on input.
    NoInput = 66,

    /// Service unavailable (69): a required dependency is not running or
    /// not reachable.
    Unavailable = 69,

    /// Internal software error (70): assertion failure, internal
    /// consistency check failed.
    Software = 70,

    /// I/O error (74): read, write, or network I/O failure.
    IoError = 74,

    /// Configuration error (78): invalid or missing configuration, a
    /// malformed `[section]` the loader could not parse.
    ConfigurationError = 78,

    /// Interrupted by SIGINT (130), e.g. Ctrl-C.
    Interrupted = 130,

    /// Terminated by SIGTERM (143), a graceful-shutdown request.
    Terminated = 143,
}

impl ExitCode {
    /// Converts to the `i32` `std::process::exit` expects.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps any error to the exit code a caller should report for it, by
    /// matching common phrasing in its `Display` output. Intended for
    /// errors without a more specific mapping of their own; callers that
    /// already know they're handling a configuration failure should use
    /// `ConfigurationError` directly rather than going through this
    /// heuristic.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let message = error.to_string().to_lowercase();

        if message.contains("config") {
            ExitCode::ConfigurationError
        } else if message.contains("permission") || message.contains("access denied") {
            ExitCode::NoInput
        } else if message.contains("not found") || message.contains("no such") {
            ExitCode::NoInput
        } else if message.contains("invalid") || message.contains("argument") {
            ExitCode::UsageError
        } else if message.contains("parse") || message.contains("format") {
            ExitCode::DataError
        } else if message.contains("io") || message.contains("read") || message.contains("write") {
            ExitCode::IoError
        } else if message.contains("unavailable") || message.contains("not available") {
            ExitCode::Unavailable
        } else {
            ExitCode::GeneralError
        }
    }

    /// Human-readable description of the exit code.
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "success",
            ExitCode::GeneralError => "general error",
            ExitCode::UsageError => "command line usage error",
            ExitCode::DataError => "data format error",
            ExitCode::NoInput => "cannot open input",
            ExitCode::Unavailable => "service unavailable",
            ExitCode::Software => "internal software error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigurationError => "configuration error",
            ExitCode::Interrupted => "interrupted by signal (SIGINT)",
            ExitCode::Terminated => "terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_matches_ex_config() {
        assert_eq!(ExitCode::ConfigurationError.as_i32(), 78);
    }

    #[test]
    fn interrupted_matches_sigint_convention() {
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn terminated_matches_sigterm_convention() {
        assert_eq!(ExitCode::Terminated.as_i32(), 143);
    }

    #[test]
    fn is_success_is_true_only_for_success() {
        assert!(ExitCode::Success.is_success());
        assert!(!ExitCode::GeneralError.is_success());
    }

    #[test]
    fn is_error_is_the_complement_of_is_success() {
        assert!(!ExitCode::Success.is_error());
        assert!(ExitCode::ConfigurationError.is_error());
    }

    #[test]
    fn is_signal_is_true_only_for_interrupted_and_terminated() {
        assert!(ExitCode::Interrupted.is_signal());
        assert!(ExitCode::Terminated.is_signal());
        assert!(!ExitCode::GeneralError.is_signal());
    }

    #[test]
    fn default_is_success() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
    }

    #[test]
    fn display_includes_description_and_numeric_code() {
        let rendered = format!("{}", ExitCode::UsageError);
        assert!(rendered.contains("usage error"));
        assert!(rendered.contains("64"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct StubError(String);

    #[test]
    fn from_error_maps_configuration_phrasing_to_configuration_error() {
        let error = StubError("configuration error: bad section".into());
        assert_eq!(ExitCode::from_error(&error), ExitCode::ConfigurationError);
    }

    #[test]
    fn from_error_falls_back_to_general_error_for_unrecognized_messages() {
        let error = StubError("bus exploded".into());
        assert_eq!(ExitCode::from_error(&error), ExitCode::GeneralError);
    }

    #[test]
    fn conversion_to_i32_matches_as_i32() {
        let code: i32 = ExitCode::ConfigurationError.into();
        assert_eq!(code, 78);
    }
}
