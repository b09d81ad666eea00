// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Raw Row Repository

use crate::entities::RawRow;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait RawRowRepository: Send + Sync {
    /// Bulk-loads a chunk; implementations should use the fastest
    /// available bulk-insert path (spec.md §4.1), not row-at-a-time
    /// inserts.
    async fn insert_batch(&self, rows: &[RawRow]) -> Result<u64, PipelineError>;

    async fn count_for_file(&self, file_id: Uuid) -> Result<u64, PipelineError>;

    async fn delete_for_file(&self, file_id: Uuid) -> Result<u64, PipelineError>;

    /// A chunk of rows belonging to `file_id` that have no corresponding
    /// `StandardizedRow` yet, ordered by `row_number`.
    async fn find_unstandardized_chunk(&self, file_id: Uuid, chunk_size: usize) -> Result<Vec<RawRow>, PipelineError>;
}
