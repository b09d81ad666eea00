// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Risk Opinion Repository
//!
//! `upsert` is expected to land on the unique `(entity_type, entity_id,
//! scope_key, engine_version)` key; the history-table archival on update
//! is a database trigger, invisible to this trait (spec.md §4.7).

use crate::entities::{RiskEntityType, RiskOpinion};
use crate::value_objects::ScopeKey;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait RiskOpinionRepository: Send + Sync {
    async fn upsert(&self, opinion: &RiskOpinion) -> Result<(), PipelineError>;

    async fn find_current(
        &self,
        entity_type: RiskEntityType,
        entity_id: Uuid,
        scope_key: &ScopeKey,
    ) -> Result<Option<RiskOpinion>, PipelineError>;
}
