// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Database connection configuration: pool size, timeouts, and DSN.
//! Pool size defaults to `worker_count * 2` per spec.md §5.

use ledger_domain::value_objects::WorkerCount;
use ledger_domain::PipelineError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub database_url: String,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl DbConfig {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| PipelineError::configuration_error(format!("loading {}: {e}", path.display())))?;
        settings
            .try_deserialize()
            .map_err(|e| PipelineError::configuration_error(format!("parsing {}: {e}", path.display())))
    }

    /// Pool size: the configured override, or `worker_count * 2` (spec.md
    /// §5) when none was given.
    pub fn pool_size(&self, workers: WorkerCount) -> u32 {
        self.max_connections.unwrap_or_else(|| workers.db_pool_size())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}
