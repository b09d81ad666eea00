// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres File Registry Repository
//!
//! `try_claim_stage` is the file-level lease from spec.md §5: one
//! `UPDATE ... WHERE <stage>_completed_at IS NULL` statement, so the
//! check-then-set happens atomically inside Postgres without an explicit
//! application-held lock.

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::{FileRegistry, StageLifecycle};
use ledger_domain::repositories::FileRegistryRepository;
use ledger_domain::value_objects::{CountryCode, Direction, FileStatus, SourceFormat};
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgFileRegistryRepository {
    pool: PgPool,
}

impl PgFileRegistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_file(row: &sqlx::postgres::PgRow) -> Result<FileRegistry, PipelineError> {
        let direction: String = row.try_get("direction").map_err(|e| map_sqlx_error("read file_registry.direction", e))?;
        let source_format: String =
            row.try_get("source_format").map_err(|e| map_sqlx_error("read file_registry.source_format", e))?;
        let status: String = row.try_get("status").map_err(|e| map_sqlx_error("read file_registry.status", e))?;
        let reporting_country: String =
            row.try_get("reporting_country").map_err(|e| map_sqlx_error("read file_registry.reporting_country", e))?;
        let stages_json: serde_json::Value = row.try_get("stages").map_err(|e| map_sqlx_error("read file_registry.stages", e))?;
        let stages: StageLifecycle =
            serde_json::from_value(stages_json).map_err(|e| PipelineError::SerializationError(e.to_string()))?;

        Ok(FileRegistry::from_parts(
            row.try_get("id").map_err(|e| map_sqlx_error("read file_registry.id", e))?,
            row.try_get("name").map_err(|e| map_sqlx_error("read file_registry.name", e))?,
            row.try_get("path").map_err(|e| map_sqlx_error("read file_registry.path", e))?,
            row.try_get("fingerprint").map_err(|e| map_sqlx_error("read file_registry.fingerprint", e))?,
            CountryCode::normalize(&reporting_country),
            direction.parse().map_err(|_| PipelineError::BugAssertionFailed(format!("bad direction '{direction}'")))?,
            source_format.parse().map_err(|_| PipelineError::BugAssertionFailed(format!("bad source_format '{source_format}'")))?,
            row.try_get("row_count").map_err(|e| map_sqlx_error("read file_registry.row_count", e))?,
            parse_status(&status)?,
            stages,
            row.try_get("created_at").map_err(|e| map_sqlx_error("read file_registry.created_at", e))?,
        ))
    }
}

fn status_str(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Pending => "PENDING",
        FileStatus::Ingested => "INGESTED",
        FileStatus::Failed => "FAILED",
        FileStatus::Duplicate => "DUPLICATE",
        FileStatus::Test => "TEST",
    }
}

fn parse_status(s: &str) -> Result<FileStatus, PipelineError> {
    match s {
        "PENDING" => Ok(FileStatus::Pending),
        "INGESTED" => Ok(FileStatus::Ingested),
        "FAILED" => Ok(FileStatus::Failed),
        "DUPLICATE" => Ok(FileStatus::Duplicate),
        "TEST" => Ok(FileStatus::Test),
        other => Err(PipelineError::BugAssertionFailed(format!("unknown file status '{other}'"))),
    }
}

#[async_trait]
impl FileRegistryRepository for PgFileRegistryRepository {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<FileRegistry>, PipelineError> {
        let row = sqlx::query("SELECT * FROM file_registry WHERE fingerprint = $1")
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find file_registry by fingerprint", e))?;
        row.as_ref().map(Self::row_to_file).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRegistry>, PipelineError> {
        let row = sqlx::query("SELECT * FROM file_registry WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find file_registry by id", e))?;
        row.as_ref().map(Self::row_to_file).transpose()
    }

    async fn insert(&self, file: &FileRegistry) -> Result<(), PipelineError> {
        let stages = serde_json::to_value(file.stages()).map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO file_registry
                (id, name, path, fingerprint, reporting_country, direction, source_format, row_count, status, stages, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(file.id())
        .bind(file.name())
        .bind(file.path())
        .bind(file.fingerprint())
        .bind(file.reporting_country().as_str())
        .bind(file.direction().as_str())
        .bind(file.source_format().as_str())
        .bind(file.row_count())
        .bind(status_str(file.status()))
        .bind(stages)
        .bind(file.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert file_registry", e))?;
        Ok(())
    }

    async fn save(&self, file: &FileRegistry) -> Result<(), PipelineError> {
        let stages = serde_json::to_value(file.stages()).map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        sqlx::query("UPDATE file_registry SET row_count = $2, status = $3, stages = $4 WHERE id = $1")
            .bind(file.id())
            .bind(file.row_count())
            .bind(status_str(file.status()))
            .bind(stages)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("save file_registry", e))?;
        Ok(())
    }

    async fn try_claim_stage(&self, file_id: Uuid, stage: &str) -> Result<bool, PipelineError> {
        let column = format!("{stage}_completed_at");
        let started_column = format!("{stage}_started_at");
        // Column names come from a fixed, code-controlled set of stage
        // names, never from request input, so interpolation here is safe.
        let sql = format!(
            "UPDATE file_registry SET {started_column} = now() WHERE id = $1 AND {column} IS NULL",
        );
        let result = sqlx::query(&sql)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("claim file stage", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn complete_stage(&self, file_id: Uuid, stage: &str) -> Result<(), PipelineError> {
        let column = format!("{stage}_completed_at");
        let sql = format!("UPDATE file_registry SET {column} = now() WHERE id = $1");
        sqlx::query(&sql).bind(file_id).execute(&self.pool).await.map_err(|e| map_sqlx_error("complete file stage", e))?;
        Ok(())
    }

    async fn abandon_stage(&self, file_id: Uuid, stage: &str) -> Result<(), PipelineError> {
        let started_column = format!("{stage}_started_at");
        let sql = format!("UPDATE file_registry SET {started_column} = NULL WHERE id = $1");
        sqlx::query(&sql).bind(file_id).execute(&self.pool).await.map_err(|e| map_sqlx_error("abandon file stage", e))?;
        Ok(())
    }

    async fn find_pending_for_stage(&self, stage: &str, limit: usize) -> Result<Vec<FileRegistry>, PipelineError> {
        let column = format!("{stage}_completed_at");
        let sql = format!("SELECT * FROM file_registry WHERE {column} IS NULL ORDER BY created_at LIMIT $1");
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find pending files for stage", e))?;
        rows.iter().map(Self::row_to_file).collect()
    }
}
