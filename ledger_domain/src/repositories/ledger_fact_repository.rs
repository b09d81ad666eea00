// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ledger Fact Repository
//!
//! Facts are append-only: the only mutation this trait exposes is
//! [`apply_mirror_match`](LedgerFactRepository::apply_mirror_match), which
//! touches exactly `buyer_uuid` and `mirror_matched_at` (spec.md §3, §4.5).

use crate::entities::LedgerFact;
use crate::value_objects::CountryCode;
use chrono::NaiveDate;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait LedgerFactRepository: Send + Sync {
    /// `ON CONFLICT (std_id, year) DO NOTHING`; returns `true` iff a row
    /// was actually inserted (spec.md §4.4 idempotency).
    async fn insert_if_not_exists(&self, fact: &LedgerFact) -> Result<bool, PipelineError>;

    async fn find_by_transaction(&self, transaction_id: Uuid, year: i32) -> Result<Option<LedgerFact>, PipelineError>;

    /// Export facts eligible for mirror matching: `hidden_buyer_flag`,
    /// `buyer_uuid IS NULL`, `mirror_matched_at IS NULL` (spec.md §4.5).
    async fn find_mirror_eligible(&self, destination_country: &CountryCode, limit: usize) -> Result<Vec<LedgerFact>, PipelineError>;

    /// Import-side candidates for one export, already filtered by the
    /// spec.md §4.5 candidate-set predicate.
    async fn find_mirror_candidates(
        &self,
        reporting_country: &CountryCode,
        origin_country: &CountryCode,
        hs_code_6: &str,
        date_window: (NaiveDate, NaiveDate),
    ) -> Result<Vec<LedgerFact>, PipelineError>;

    async fn apply_mirror_match(&self, transaction_id: Uuid, year: i32, buyer_uuid: Uuid) -> Result<(), PipelineError>;

    /// Facts with `shipment_date` at or after `since`, for S6/S7
    /// incremental aggregation.
    async fn find_since(&self, since: chrono::DateTime<chrono::Utc>, limit: usize) -> Result<Vec<LedgerFact>, PipelineError>;
}
