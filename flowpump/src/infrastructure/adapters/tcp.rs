// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TCP Line Source
//!
//! A `Source` that accepts TCP connections on `addr` and emits one event
//! per newline-terminated line received, as a JSON string. Demonstrates how
//! an external transport wires into the pipeline runtime through
//! `Source::main` and `pipeline.ready()` (spec.md §4.2).

use async_trait::async_trait;
use flowpump_domain::{Context, Event, PipelineHandle, PumpError, Source};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

pub struct TcpLineSource {
    name: String,
    addr: String,
}

impl TcpLineSource {
    pub fn new(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self { name: name.into(), addr: addr.into() }
    }
}

#[async_trait]
impl Source for TcpLineSource {
    async fn main(&self, pipeline: Arc<dyn PipelineHandle>) -> Result<(), PumpError> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|error| PumpError::source(self.name.clone(), format!("failed to bind {}: {error}", self.addr)))?;

        loop {
            let (socket, peer) = listener
                .accept()
                .await
                .map_err(|error| PumpError::source(self.name.clone(), format!("accept failed: {error}")))?;

            let pipeline = pipeline.clone();
            let name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(socket).lines();
                loop {
                    pipeline.ready().await;

                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            let mut context = Context::new();
                            context.insert("peer", json!(peer.to_string()));
                            if let Err(error) = pipeline.process(context, Event::new(json!(line))).await {
                                tracing::error!(%error, source = %name, "failed to process TCP line");
                            }
                        }
                        Ok(None) => break,
                        Err(error) => {
                            tracing::warn!(%error, source = %name, "error reading from TCP connection");
                            break;
                        }
                    }
                }
            });
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
