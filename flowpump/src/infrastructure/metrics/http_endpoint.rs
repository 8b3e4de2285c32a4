// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics HTTP Exposition
//!
//! Serves a JSON snapshot of every registered metric at `GET /metrics`.
//! Grounded on `original_source/asab/metrics/http_target.py`, which exposes
//! the same registry over HTTP for scraping; JSON is used here in place of
//! the Prometheus text format since the registry's fieldset model is
//! dynamic rather than fixed-at-startup (see DESIGN.md on dropping the
//! `prometheus` crate).

use crate::infrastructure::metrics::registry::MetricsRegistry;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Clone)]
struct MetricsState {
    registry: Arc<MetricsRegistry>,
}

/// Builds the router serving `/metrics`. Split out from `serve` so tests
/// can exercise it without binding a socket.
pub fn router(registry: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .with_state(MetricsState { registry })
}

/// Binds `addr` and serves the metrics endpoint until the returned future
/// is dropped or errors.
pub async fn serve(registry: Arc<MetricsRegistry>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(registry)).await
}

async fn get_metrics(State(state): State<MetricsState>) -> Json<Value> {
    let snapshot = state.registry.flush_all(SystemTime::now());

    let body: serde_json::Map<String, Value> = snapshot
        .into_iter()
        .map(|(name, fields)| {
            let fields_json: Vec<Value> = fields
                .into_iter()
                .map(|field| json!({ "tags": field.tags, "values": field.values }))
                .collect();
            (name, Value::Array(fields_json))
        })
        .collect();

    Json(Value::Object(body))
}
