// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration Loading
//!
//! Loads the INI-style configuration file named by `-c/--config`, falling
//! back to built-in defaults for any section or key left unset. The core
//! sections and keys (`[general] config_file/verbose/tick_period`,
//! `[asab:metrics] expiration`) match spec.md §6 literally, carried over
//! from `original_source/asab`'s own section naming. Ambient-stack additions
//! with no spec.md counterpart (alert queue capacity, proactor thread
//! count, the metrics HTTP exposition port) live under a `flowpump:`-
//! prefixed section of their own rather than inside the core sections.

use flowpump_domain::PumpError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Path to the configuration file itself, as loaded. Informational;
    /// not consulted by the loader (which already received the path as an
    /// argument), but part of the `[general]` section spec.md §6 names.
    pub config_file: Option<String>,
    pub verbose: bool,
    /// Tick period in whole seconds (spec.md §6: "integer seconds, default 1").
    pub tick_period: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            config_file: None,
            verbose: false,
            tick_period: 1,
        }
    }
}

/// `[asab:metrics]` section: exactly the one key spec.md §6 names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsabMetricsSettings {
    /// Field expiration, in seconds (spec.md §6: "float seconds").
    pub expiration: f64,
}

impl Default for AsabMetricsSettings {
    fn default() -> Self {
        Self { expiration: 60.0 }
    }
}

/// `[flowpump:metrics:http]` section: the metrics HTTP exposition endpoint.
/// Ambient stack, no spec.md counterpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsHttpSettings {
    pub port: u16,
}

impl Default for MetricsHttpSettings {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// `[flowpump:alert]` section. Ambient stack, no spec.md counterpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    pub queue_capacity: Option<usize>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self { queue_capacity: None }
    }
}

/// `[flowpump:proactor]` section. Ambient stack, no spec.md counterpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProactorSettings {
    pub worker_threads: usize,
}

impl Default for ProactorSettings {
    fn default() -> Self {
        Self { worker_threads: 4 }
    }
}

/// Top-level configuration tree. Every field has a default, so a missing
/// or partial configuration file is never a startup error on its own —
/// only a malformed one is (spec.md §7, "configuration errors ... abort
/// startup").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default, rename = "asab:metrics")]
    pub metrics: AsabMetricsSettings,
    #[serde(default, rename = "flowpump:metrics:http")]
    pub metrics_http: MetricsHttpSettings,
    #[serde(default, rename = "flowpump:alert")]
    pub alert: AlertSettings,
    #[serde(default, rename = "flowpump:proactor")]
    pub proactor: ProactorSettings,
}

impl Settings {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.general.tick_period.max(1))
    }

    pub fn metrics_expiration(&self) -> Duration {
        Duration::from_secs_f64(self.metrics.expiration.max(1.0))
    }
}

/// Loads `path` as an INI file and deserializes it into `Settings`,
/// applying defaults for anything left unset. `path` of `None` yields
/// pure defaults.
pub fn load(path: Option<&Path>) -> Result<Settings, PumpError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Ini).required(false));
    }

    let config = builder
        .build()
        .map_err(|error| PumpError::configuration(format!("failed to load configuration: {error}")))?;

    let mut settings: Settings = config
        .try_deserialize()
        .map_err(|error| PumpError::configuration(format!("failed to parse configuration: {error}")))?;

    if settings.general.config_file.is_none() {
        settings.general.config_file = path.map(|p| p.display().to_string());
    }

    Ok(settings)
}
