// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # LDAP Connection
//!
//! LDAP is kept as an abstract contract only: no crate in this workspace's
//! dependency stack provides an LDAP client, and fabricating one would
//! violate the "never fabricate dependencies" rule. `LdapSearch` is the
//! seam a concrete adapter would implement; `InMemoryLdapDirectory` is a
//! test double exercising the contract end to end. Grounded on
//! `original_source/bspump/ldap/source.py`'s `LDAPSource`, which pages a
//! search through `ProactorService::execute` — the offload pattern itself
//! lives in `application::proactor`, not here.

use async_trait::async_trait;
use flowpump_domain::PumpError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::infrastructure::adapters::Connection;

/// One page of search results plus an opaque cookie for the next page, or
/// an empty cookie when the search is exhausted.
pub struct SearchPage {
    pub entries: Vec<Map<String, Value>>,
    pub cookie: Vec<u8>,
}

/// Abstract contract for a paged LDAP search. A real implementation would
/// run the blocking `ldap3`-style call through `ProactorService::execute`;
/// see `application::proactor`.
#[async_trait]
pub trait LdapSearch: Send + Sync {
    async fn search_page(&self, base: &str, filter: &str, attributes: &[String], cookie: Vec<u8>) -> Result<SearchPage, PumpError>;
}

/// An in-memory directory used to exercise `LdapSearch` without a real LDAP
/// server. Returns its entire contents as a single page.
pub struct InMemoryLdapDirectory {
    name: String,
    entries: Vec<BTreeMap<String, Value>>,
}

impl InMemoryLdapDirectory {
    pub fn new(name: impl Into<String>, entries: Vec<BTreeMap<String, Value>>) -> Self {
        Self { name: name.into(), entries }
    }
}

#[async_trait]
impl LdapSearch for InMemoryLdapDirectory {
    async fn search_page(&self, _base: &str, _filter: &str, attributes: &[String], cookie: Vec<u8>) -> Result<SearchPage, PumpError> {
        if !cookie.is_empty() {
            return Ok(SearchPage { entries: Vec::new(), cookie: Vec::new() });
        }

        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let mut projected = Map::new();
                for attribute in attributes {
                    if let Some(value) = entry.get(attribute) {
                        projected.insert(attribute.clone(), value.clone());
                    }
                }
                projected
            })
            .collect();

        Ok(SearchPage { entries, cookie: Vec::new() })
    }
}

impl Connection for InMemoryLdapDirectory {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn in_memory_directory_projects_requested_attributes() {
        let mut entry = BTreeMap::new();
        entry.insert("cn".to_string(), json!("vhavel"));
        entry.insert("email".to_string(), json!("vhavel@example.org"));
        let directory = InMemoryLdapDirectory::new("test-dir", vec![entry]);

        let page = directory
            .search_page("dc=example,dc=org", "(objectClass=*)", &["cn".to_string()], Vec::new())
            .await
            .unwrap();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].get("cn"), Some(&json!("vhavel")));
        assert!(!page.entries[0].contains_key("email"));
        assert!(page.cookie.is_empty());
    }
}
