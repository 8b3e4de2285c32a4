// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # MySQL Connection
//!
//! A pipeline-local connection adapter over `sqlx::MySqlPool`. Pipelines
//! locate connections by name (spec.md §4 "pipeline-local connection
//! lookup"); this is one concrete `Connection` implementation among
//! several (HTTP, LDAP, filesystem, TCP).

use crate::infrastructure::adapters::Connection;
use flowpump_domain::PumpError;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool, Row};

pub struct MySqlConnection {
    name: String,
    pool: Pool<MySql>,
}

impl MySqlConnection {
    pub async fn connect(name: impl Into<String>, url: &str, max_connections: u32) -> Result<Self, PumpError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|error| PumpError::infrastructure(format!("failed to connect to MySQL: {error}")))?;

        Ok(Self { name: name.into(), pool })
    }

    /// Runs a single-column lookup query, returning the first row's value as
    /// a string, or `None` if no row matched.
    pub async fn lookup_string(&self, query: &str, key: &str) -> Result<Option<String>, PumpError> {
        let row = sqlx::query(query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| PumpError::infrastructure(format!("MySQL lookup failed: {error}")))?;

        match row {
            Some(row) => row
                .try_get::<String, _>(0)
                .map(Some)
                .map_err(|error| PumpError::infrastructure(format!("MySQL row decode failed: {error}"))),
            None => Ok(None),
        }
    }
}

impl Connection for MySqlConnection {
    fn name(&self) -> &str {
        &self.name
    }
}
