// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mirror Match Repository

use crate::entities::MirrorMatch;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait MirrorMatchRepository: Send + Sync {
    /// Unique on `export_transaction_id`; conflict means skip (spec.md
    /// §4.5 idempotency). Returns `true` iff a row was inserted.
    async fn insert_if_not_exists(&self, mirror_match: &MirrorMatch) -> Result<bool, PipelineError>;

    async fn find_by_export(&self, export_transaction_id: Uuid) -> Result<Option<MirrorMatch>, PipelineError>;
}
