// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! SIGINT/SIGTERM escalation mirroring the host application's own stop
//! counter: the first signal requests a graceful stop, the second escalates
//! to an immediate one, and the third aborts the process outright.

use crate::shutdown::CancellationToken;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

/// How far along the stop escalation the process has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopEscalation {
    Graceful,
    Immediate,
    Abort,
}

/// Installs SIGINT/SIGTERM handlers that escalate a cancellation token
/// through up to three presses: graceful, immediate, then process abort.
///
/// Runs until the cancellation token is observed elsewhere as fully
/// cancelled; intended to be spawned as its own task.
pub async fn install(token: CancellationToken) -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let counter = Arc::new(AtomicU8::new(0));

    loop {
        tokio::select! {
            _ = sigint.recv() => handle_signal(&token, &counter),
            _ = sigterm.recv() => handle_signal(&token, &counter),
            _ = token.cancelled() => break,
        }
    }

    Ok(())
}

fn handle_signal(token: &CancellationToken, counter: &Arc<AtomicU8>) {
    let previous = counter.fetch_add(1, Ordering::SeqCst);
    match previous {
        0 => {
            tracing::warn!("received stop signal, beginning graceful shutdown");
            token.cancel();
        }
        1 => {
            tracing::warn!("received second stop signal, shutdown already in progress");
        }
        _ => {
            tracing::error!("received third stop signal, aborting immediately");
            std::process::exit(crate::exit_code::ExitCode::Interrupted.as_i32());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_levels_are_distinct() {
        assert_ne!(StopEscalation::Graceful, StopEscalation::Immediate);
        assert_ne!(StopEscalation::Immediate, StopEscalation::Abort);
    }

    #[test]
    fn handle_signal_cancels_token_on_first_call() {
        let token = CancellationToken::new();
        let counter = Arc::new(AtomicU8::new(0));
        handle_signal(&token, &counter);
        assert!(token.is_cancelled());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
