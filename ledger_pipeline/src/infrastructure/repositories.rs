// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Repository Implementations
//!
//! One sqlx-backed implementation per `ledger_domain::repositories` trait.
//! Every query relies on unique constraints plus `ON CONFLICT` instead of
//! explicit locking (spec.md §5 "Locking discipline"): any number of
//! workers can run any stage concurrently without deadlock risk.

pub mod schema;

mod analytics_repository;
mod file_registry_repository;
mod ledger_fact_repository;
mod mirror_match_repository;
mod organization_repository;
mod pipeline_run_repository;
mod raw_row_repository;
mod risk_opinion_repository;
mod standardized_row_repository;
mod watermark_repository;

pub use analytics_repository::PgAnalyticsRepository;
pub use file_registry_repository::PgFileRegistryRepository;
pub use ledger_fact_repository::PgLedgerFactRepository;
pub use mirror_match_repository::PgMirrorMatchRepository;
pub use organization_repository::PgOrganizationRepository;
pub use pipeline_run_repository::PgPipelineRunRepository;
pub use raw_row_repository::PgRawRowRepository;
pub use risk_opinion_repository::PgRiskOpinionRepository;
pub use standardized_row_repository::PgStandardizedRowRepository;
pub use watermark_repository::PgWatermarkRepository;

use ledger_domain::PipelineError;

/// Maps a `sqlx::Error` onto the pipeline's unified error type. Unique
/// constraint violations become `ConstraintViolation` so callers can treat
/// them as idempotent no-ops (spec.md §5); everything else is a plain
/// database error.
pub(super) fn map_sqlx_error(context: &str, err: sqlx::Error) -> PipelineError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return PipelineError::ConstraintViolation(format!("{context}: {db_err}"));
        }
    }
    PipelineError::database_error(format!("{context}: {err}"))
}
