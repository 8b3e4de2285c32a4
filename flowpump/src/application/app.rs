// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Host
//!
//! The process-wide singleton that owns the event bus, the module and
//! service registries, and drives the init/run/exit lifecycle governors.
//! Exactly one `Application` may exist per process; a second call to
//! `Application::initialize` returns an error rather than silently
//! overwriting the first.

use crate::application::bus::PubSub;
use crate::application::tick_governor;
use flowpump_bootstrap::CancellationToken;
use flowpump_domain::{traits::Module, PumpError};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

static INSTANCE: OnceCell<Application> = OnceCell::new();

/// A registered service, type-erased so the registry can hold services of
/// differing concrete types under a single map.
pub type AnyService = Arc<dyn Any + Send + Sync>;

struct Inner {
    bus: PubSub,
    modules: RwLock<Vec<Arc<dyn Module>>>,
    services: RwLock<HashMap<String, AnyService>>,
    tick_period: Duration,
    shutdown: CancellationToken,
}

/// The application host. Clone is cheap — an `Arc` handle over shared state.
#[derive(Clone)]
pub struct Application {
    inner: Arc<Inner>,
}

impl Application {
    /// Initializes the process-wide singleton. Must be called exactly once;
    /// subsequent calls return `PumpError::Configuration`.
    pub fn initialize(tick_period: Duration, shutdown: CancellationToken) -> Result<Application, PumpError> {
        let app = Application {
            inner: Arc::new(Inner {
                bus: PubSub::new(),
                modules: RwLock::new(Vec::new()),
                services: RwLock::new(HashMap::new()),
                tick_period,
                shutdown,
            }),
        };

        INSTANCE
            .set(app.clone())
            .map_err(|_| PumpError::configuration("Application already initialized"))?;

        Ok(app)
    }

    /// Returns the process-wide singleton, if initialized.
    pub fn instance() -> Option<Application> {
        INSTANCE.get().cloned()
    }

    pub fn bus(&self) -> &PubSub {
        &self.inner.bus
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Loads a module: appends it to the registry and schedules its
    /// `initialize()` as a detached task, matching the fire-and-forget
    /// semantics of the originating framework's `add_module`.
    pub async fn add_module(&self, module: Arc<dyn Module>) {
        self.inner.modules.write().await.push(module.clone());
        tokio::spawn(async move {
            if let Err(error) = module.initialize().await {
                tracing::error!(%error, module = module.name(), "module initialization failed");
            }
        });
    }

    /// Registers a named service. Returns an error if the name is already
    /// taken, rather than silently overwriting the existing registration.
    pub async fn register_service(&self, name: impl Into<String>, service: AnyService) -> Result<(), PumpError> {
        let name = name.into();
        let mut services = self.inner.services.write().await;
        if services.contains_key(&name) {
            return Err(PumpError::configuration(format!("service '{name}' already registered")));
        }
        services.insert(name, service);
        Ok(())
    }

    /// Looks up a registered service by name and concrete type.
    pub async fn get_service<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        let services = self.inner.services.read().await;
        services.get(name).and_then(|service| service.clone().downcast::<T>().ok())
    }

    /// Runs the init-time governor: publishes `Application.init!` on the bus.
    pub async fn run_init_governor(&self) {
        self.inner.bus.publish_empty("Application.init!");
    }

    /// Runs the run-time governor (tick loop) until shutdown is requested.
    pub async fn run_time_governor(&self) {
        tick_governor::run(&self.inner.bus, &self.inner.shutdown, self.inner.tick_period).await;
    }

    /// Runs the exit-time governor: publishes `Application.exit!`, then
    /// finalizes every registered module, awaiting them all regardless of
    /// individual failures.
    pub async fn run_exit_governor(&self) {
        self.inner.bus.publish_empty("Application.exit!");

        let modules = self.inner.modules.read().await.clone();
        let finalizations = modules.into_iter().map(|module| async move {
            if let Err(error) = module.finalize().await {
                tracing::error!(%error, module = module.name(), "module finalization failed");
            }
        });
        futures::future::join_all(finalizations).await;
    }
}
