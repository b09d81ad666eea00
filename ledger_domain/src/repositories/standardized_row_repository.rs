// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Standardized Row Repository

use crate::entities::StandardizedRow;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

/// One resolved identity to write back onto a standardized row (spec.md
/// §4.3 step 7). `buyer_uuid`/`supplier_uuid` are `None` when that side
/// wasn't part of this batch and must be left untouched.
#[derive(Debug, Clone, Copy)]
pub struct IdentityWriteback {
    pub std_id: Uuid,
    pub buyer_uuid: Option<Uuid>,
    pub supplier_uuid: Option<Uuid>,
    pub hidden_buyer_flag: bool,
}

#[async_trait]
pub trait StandardizedRowRepository: Send + Sync {
    async fn insert_batch(&self, rows: &[StandardizedRow]) -> Result<u64, PipelineError>;

    async fn exists_for_raw_row(&self, raw_row_id: Uuid) -> Result<bool, PipelineError>;

    /// Rows with a NULL `buyer_uuid` or `supplier_uuid`, for S3 to resolve.
    async fn find_missing_identity(&self, limit: usize) -> Result<Vec<StandardizedRow>, PipelineError>;

    async fn writeback_identities(&self, updates: &[IdentityWriteback]) -> Result<u64, PipelineError>;

    /// Rows not yet promoted to the ledger, for S4.
    async fn find_unpromoted(&self, limit: usize) -> Result<Vec<StandardizedRow>, PipelineError>;
}
