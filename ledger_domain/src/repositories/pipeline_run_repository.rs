// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Run Repository
//!
//! The sole contract external observers consume to render pipeline
//! health (spec.md §4.8). `find_running` surfaces crashed-worker
//! evidence: there SHOULD be at most one `RUNNING` row per stage name.

use crate::entities::PipelineRun;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait PipelineRunRepository: Send + Sync {
    async fn insert(&self, run: &PipelineRun) -> Result<(), PipelineError>;

    async fn update(&self, run: &PipelineRun) -> Result<(), PipelineError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PipelineRun>, PipelineError>;

    async fn find_running(&self, stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError>;
}
