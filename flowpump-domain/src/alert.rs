// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Alerts: non-persistent records fanned out to configured providers.
//! Grounded directly on `original_source/bspump/asab/alert.py`'s
//! `Alert` dataclass and `AlertProviderABC`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// `(source, class, id, title, data, detail, exception?)` per spec.md §3.
#[derive(Debug, Clone)]
pub struct Alert {
    pub source: String,
    pub class: String,
    pub id: String,
    pub title: String,
    pub data: BTreeMap<String, Value>,
    pub detail: String,
    pub exception: Option<String>,
}

impl Alert {
    pub fn new(source: impl Into<String>, class: impl Into<String>, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            class: class.into(),
            id: id.into(),
            title: title.into(),
            data: BTreeMap::new(),
            detail: String::new(),
            exception: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// A provider enqueues non-blocking (`trigger`) and delivers from its own
/// worker task (spec.md §4.8). Implemented by concrete transports in
/// `flowpump::infrastructure::adapters`.
#[async_trait]
pub trait AlertProvider: Send + Sync {
    /// Non-blocking enqueue.
    fn trigger(&self, alert: Alert);

    /// Delivers one alert. Called in a loop by the provider's worker task;
    /// the supervisor restarts the loop whenever it exits, per spec.md
    /// §4.8 ("if the worker task exits abnormally, it is restarted; if it
    /// exits normally, it is restarted").
    async fn deliver(&self, alert: Alert);

    fn name(&self) -> &str;
}
