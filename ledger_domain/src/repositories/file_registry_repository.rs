// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Registry Repository
//!
//! Persistence contract for [`FileRegistry`]. `try_claim_stage` is the
//! coordination primitive described in spec.md §5: it must perform its
//! check-then-set under one transaction so two workers never both win
//! the lease for the same `(file_id, stage)`.

use crate::entities::FileRegistry;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait FileRegistryRepository: Send + Sync {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<FileRegistry>, PipelineError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRegistry>, PipelineError>;

    async fn insert(&self, file: &FileRegistry) -> Result<(), PipelineError>;

    async fn save(&self, file: &FileRegistry) -> Result<(), PipelineError>;

    /// Atomically verifies `<stage>_completed_at IS NULL` and sets
    /// `<stage>_started_at = now()`. Returns `false` if another worker
    /// already holds the lease.
    async fn try_claim_stage(&self, file_id: Uuid, stage: &str) -> Result<bool, PipelineError>;

    async fn complete_stage(&self, file_id: Uuid, stage: &str) -> Result<(), PipelineError>;

    async fn abandon_stage(&self, file_id: Uuid, stage: &str) -> Result<(), PipelineError>;

    /// Files whose `<stage>_completed_at IS NULL`, for the next run to
    /// pick back up (spec.md §5 cancellation semantics).
    async fn find_pending_for_stage(&self, stage: &str, limit: usize) -> Result<Vec<FileRegistry>, PipelineError>;
}
