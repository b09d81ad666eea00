// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Organization Repository
//!
//! spec.md §4.3 passes 1-2: exact match is a single bulk `IN` query over
//! candidate tuples, fuzzy match uses the trigram similarity index.
//! `insert_or_get` races safely on the infrastructure side via the
//! `(normalized_name, country)` unique constraint and `ON CONFLICT ...
//! RETURNING`.

use crate::entities::Organization;
use crate::value_objects::CountryCode;
use crate::PipelineError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, PipelineError>;

    /// Pass 1: bulk exact match over `(normalized_name, country)` tuples.
    async fn find_exact_batch(&self, tuples: &[(String, CountryCode)]) -> Result<Vec<Organization>, PipelineError>;

    /// Pass 2: best trigram match within `country` at or above
    /// `threshold`; ties broken by lexicographic UUID order (spec.md §4.3).
    async fn find_best_fuzzy_match(
        &self,
        normalized_name: &str,
        country: &CountryCode,
        threshold: f64,
    ) -> Result<Option<Organization>, PipelineError>;

    /// Insert-if-not-exists; returns the row that exists after the call,
    /// whether freshly inserted or pre-existing.
    async fn insert_or_get(&self, org: &Organization) -> Result<Organization, PipelineError>;

    async fn save(&self, org: &Organization) -> Result<(), PipelineError>;
}
