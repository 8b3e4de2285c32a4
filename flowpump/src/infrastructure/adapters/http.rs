// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Alert Providers: HTTP and Log
//!
//! `HttpAlertProvider` delivers alerts by POSTing them as JSON to a
//! configured webhook. Grounded on `original_source/bspump/asab/alert.py`'s
//! provider contract; the delivery transport itself (an outbound HTTP call)
//! is this crate's own choice of `reqwest`, the HTTP client the rest of the
//! pack reaches for. `LogAlertProvider` is the zero-config default named in
//! SPEC_FULL.md §3: it writes the alert through `tracing` instead of
//! delivering it anywhere, for tests and unconfigured deployments.

use async_trait::async_trait;
use flowpump_domain::{Alert, AlertProvider};
use serde::Serialize;

#[derive(Serialize)]
struct AlertPayload<'a> {
    source: &'a str,
    class: &'a str,
    id: &'a str,
    title: &'a str,
    detail: &'a str,
    exception: Option<&'a str>,
    data: &'a std::collections::BTreeMap<String, serde_json::Value>,
}

/// Posts each alert to a webhook URL as a JSON body.
pub struct HttpAlertProvider {
    name: String,
    webhook_url: String,
    client: reqwest::Client,
}

impl HttpAlertProvider {
    pub fn new(name: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            webhook_url: webhook_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AlertProvider for HttpAlertProvider {
    fn trigger(&self, _alert: Alert) {
        // Enqueue is handled by the alert bus's channel; nothing to do here
        // beyond what the bus already does on our behalf.
    }

    async fn deliver(&self, alert: Alert) {
        let payload = AlertPayload {
            source: &alert.source,
            class: &alert.class,
            id: &alert.id,
            title: &alert.title,
            detail: &alert.detail,
            exception: alert.exception.as_deref(),
            data: &alert.data,
        };

        if let Err(error) = self.client.post(&self.webhook_url).json(&payload).send().await {
            tracing::error!(%error, provider = %self.name, alert_id = %alert.id, "failed to deliver alert");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Writes each alert through `tracing` rather than delivering it anywhere.
/// The zero-config default provider kind (SPEC_FULL.md §3): used in tests
/// and whenever no `[flowpump:alert:*]` webhook section is configured.
pub struct LogAlertProvider {
    name: String,
}

impl LogAlertProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl AlertProvider for LogAlertProvider {
    fn trigger(&self, _alert: Alert) {}

    async fn deliver(&self, alert: Alert) {
        tracing::warn!(
            provider = %self.name,
            alert_id = %alert.id,
            class = %alert.class,
            title = %alert.title,
            detail = %alert.detail,
            exception = ?alert.exception,
            "alert"
        );
    }

    fn name(&self) -> &str {
        &self.name
    }
}
