// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage Commands
//!
//! One config struct per S1-S8 use case, built by `ledger_bootstrap` from
//! CLI flags and [`IngestionConfig`](crate::infrastructure::config::IngestionConfig)
//! and handed to that stage's `execute`.

use ledger_domain::value_objects::ChunkSize;

#[derive(Debug, Clone)]
pub struct IngestCommand {
    pub chunk_size: ChunkSize,
}

#[derive(Debug, Clone)]
pub struct StandardizeCommand {
    pub chunk_size: ChunkSize,
}

#[derive(Debug, Clone)]
pub struct ResolveIdentityCommand {
    pub chunk_rows: usize,
    /// spec.md §4.3 pass 2 trigram threshold.
    pub fuzzy_threshold: f64,
}

impl Default for ResolveIdentityCommand {
    fn default() -> Self {
        Self { chunk_rows: 2_000, fuzzy_threshold: 0.6 }
    }
}

#[derive(Debug, Clone)]
pub struct LoadLedgerCommand {
    pub chunk_rows: usize,
}

impl Default for LoadLedgerCommand {
    fn default() -> Self {
        Self { chunk_rows: 2_000 }
    }
}

#[derive(Debug, Clone)]
pub struct MirrorMatchCommand {
    pub batch_size: usize,
}

impl Default for MirrorMatchCommand {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

#[derive(Debug, Clone)]
pub struct BuildProfilesCommand {
    pub lookback_days: i64,
}

impl Default for BuildProfilesCommand {
    fn default() -> Self {
        Self { lookback_days: 7 }
    }
}

#[derive(Debug, Clone)]
pub struct RiskScoreCommand {
    pub lookback_days: i64,
    pub engine_version: String,
    pub batch_size: usize,
}

impl Default for RiskScoreCommand {
    fn default() -> Self {
        Self { lookback_days: 7, engine_version: "v1".to_string(), batch_size: 500 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RefreshServingCommand;
