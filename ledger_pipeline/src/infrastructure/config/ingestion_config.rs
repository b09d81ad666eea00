// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Chunk sizes, the raw-data root path, and the mapping-config directory
//! (spec.md §6: "connection pool parameters, chunk sizes, and the raw-data
//! root path").

use ledger_domain::value_objects::ChunkSize;
use ledger_domain::PipelineError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    pub raw_data_root: PathBuf,
    pub mapping_config_dir: PathBuf,
    #[serde(default = "default_ingest_chunk_rows")]
    pub ingest_chunk_rows: usize,
    #[serde(default = "default_standardize_chunk_rows")]
    pub standardize_chunk_rows: usize,
    #[serde(default = "default_lookback_days")]
    pub default_lookback_days: i64,
}

fn default_ingest_chunk_rows() -> usize {
    ChunkSize::DEFAULT_INGEST_ROWS
}

fn default_standardize_chunk_rows() -> usize {
    ChunkSize::DEFAULT_STANDARDIZE_ROWS
}

fn default_lookback_days() -> i64 {
    7
}

impl IngestionConfig {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| PipelineError::configuration_error(format!("loading {}: {e}", path.display())))?;
        settings
            .try_deserialize()
            .map_err(|e| PipelineError::configuration_error(format!("parsing {}: {e}", path.display())))
    }

    pub fn ingest_chunk_size(&self) -> Result<ChunkSize, PipelineError> {
        ChunkSize::new(self.ingest_chunk_rows)
    }

    pub fn standardize_chunk_size(&self) -> Result<ChunkSize, PipelineError> {
        ChunkSize::new(self.standardize_chunk_rows)
    }
}
