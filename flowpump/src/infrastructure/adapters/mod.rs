// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete transport adapters. Pipelines locate a named `Connection`
//! (spec.md §4, "pipeline-local connection lookup") through a
//! `ConnectionRegistry`; sources and generators hold their connection by
//! name rather than owning it directly, matching
//! `original_source/bspump/ldap/source.py`'s `pipeline.locate_connection`.

pub mod filesystem;
pub mod http;
pub mod ldap;
pub mod mysql;
pub mod tcp;

use flowpump_domain::PumpError;
use std::collections::HashMap;
use std::sync::Arc;

/// A named, shareable external connection.
pub trait Connection: Send + Sync {
    fn name(&self) -> &str;
}

/// Looks connections up by name. Populated at startup from configuration;
/// read-only thereafter.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, Arc<dyn Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: Arc<dyn Connection>) -> Result<(), PumpError> {
        let name = connection.name().to_string();
        if self.connections.contains_key(&name) {
            return Err(PumpError::configuration(format!("connection '{name}' already registered")));
        }
        self.connections.insert(name, connection);
        Ok(())
    }

    pub fn locate(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.connections.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub(&'static str);
    impl Connection for Stub {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn locate_finds_a_registered_connection() {
        let mut registry = ConnectionRegistry::new();
        registry.register(Arc::new(Stub("primary"))).unwrap();
        assert!(registry.locate("primary").is_some());
        assert!(registry.locate("missing").is_none());
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = ConnectionRegistry::new();
        registry.register(Arc::new(Stub("primary"))).unwrap();
        let result = registry.register(Arc::new(Stub("primary")));
        assert!(result.is_err());
    }
}
