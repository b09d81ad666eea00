// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Pipeline Run Repository

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::{PipelineRun, RunCounters};
use ledger_domain::repositories::PipelineRunRepository;
use ledger_domain::value_objects::RunStatus;
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgPipelineRunRepository {
    pool: PgPool,
}

impl PgPipelineRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_run(row: &sqlx::postgres::PgRow) -> Result<PipelineRun, PipelineError> {
        let status: String = row.try_get("status").map_err(|e| map_sqlx_error("read pipeline_run.status", e))?;
        let processed: i64 = row.try_get("counter_processed").map_err(|e| map_sqlx_error("read pipeline_run.counter_processed", e))?;
        let created: i64 = row.try_get("counter_created").map_err(|e| map_sqlx_error("read pipeline_run.counter_created", e))?;
        let updated: i64 = row.try_get("counter_updated").map_err(|e| map_sqlx_error("read pipeline_run.counter_updated", e))?;
        let skipped: i64 = row.try_get("counter_skipped").map_err(|e| map_sqlx_error("read pipeline_run.counter_skipped", e))?;
        let failed: i64 = row.try_get("counter_failed").map_err(|e| map_sqlx_error("read pipeline_run.counter_failed", e))?;

        Ok(PipelineRun::from_parts(
            row.try_get("id").map_err(|e| map_sqlx_error("read pipeline_run.id", e))?,
            row.try_get("stage_name").map_err(|e| map_sqlx_error("read pipeline_run.stage_name", e))?,
            row.try_get("filters").map_err(|e| map_sqlx_error("read pipeline_run.filters", e))?,
            RunCounters {
                processed: processed as u64,
                created: created as u64,
                updated: updated as u64,
                skipped: skipped as u64,
                failed: failed as u64,
            },
            parse_status(&status)?,
            row.try_get("started_at").map_err(|e| map_sqlx_error("read pipeline_run.started_at", e))?,
            row.try_get("completed_at").map_err(|e| map_sqlx_error("read pipeline_run.completed_at", e))?,
            row.try_get("error_message").map_err(|e| map_sqlx_error("read pipeline_run.error_message", e))?,
        ))
    }
}

fn status_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "RUNNING",
        RunStatus::Success => "SUCCESS",
        RunStatus::Failed => "FAILED",
        RunStatus::Partial => "PARTIAL",
    }
}

fn parse_status(s: &str) -> Result<RunStatus, PipelineError> {
    match s {
        "RUNNING" => Ok(RunStatus::Running),
        "SUCCESS" => Ok(RunStatus::Success),
        "FAILED" => Ok(RunStatus::Failed),
        "PARTIAL" => Ok(RunStatus::Partial),
        other => Err(PipelineError::BugAssertionFailed(format!("unknown run status '{other}'"))),
    }
}

#[async_trait]
impl PipelineRunRepository for PgPipelineRunRepository {
    async fn insert(&self, run: &PipelineRun) -> Result<(), PipelineError> {
        let counters = run.counters();
        sqlx::query(
            r#"
            INSERT INTO pipeline_runs
                (id, stage_name, filters, counter_processed, counter_created, counter_updated, counter_skipped,
                 counter_failed, status, started_at, completed_at, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(run.id())
        .bind(run.stage_name())
        .bind(run.filters())
        .bind(counters.processed as i64)
        .bind(counters.created as i64)
        .bind(counters.updated as i64)
        .bind(counters.skipped as i64)
        .bind(counters.failed as i64)
        .bind(status_str(run.status()))
        .bind(run.started_at())
        .bind(run.completed_at())
        .bind(run.error_message())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert pipeline_run", e))?;
        Ok(())
    }

    async fn update(&self, run: &PipelineRun) -> Result<(), PipelineError> {
        let counters = run.counters();
        sqlx::query(
            r#"
            UPDATE pipeline_runs SET
                counter_processed = $2, counter_created = $3, counter_updated = $4, counter_skipped = $5,
                counter_failed = $6, status = $7, completed_at = $8, error_message = $9
            WHERE id = $1
            "#,
        )
        .bind(run.id())
        .bind(counters.processed as i64)
        .bind(counters.created as i64)
        .bind(counters.updated as i64)
        .bind(counters.skipped as i64)
        .bind(counters.failed as i64)
        .bind(status_str(run.status()))
        .bind(run.completed_at())
        .bind(run.error_message())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update pipeline_run", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PipelineRun>, PipelineError> {
        let row = sqlx::query("SELECT * FROM pipeline_runs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find pipeline_run by id", e))?;
        row.as_ref().map(Self::row_to_run).transpose()
    }

    async fn find_running(&self, stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM pipeline_runs WHERE stage_name = $1 AND status = 'RUNNING'")
            .bind(stage_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find running pipeline_runs", e))?;
        rows.iter().map(Self::row_to_run).collect()
    }
}
