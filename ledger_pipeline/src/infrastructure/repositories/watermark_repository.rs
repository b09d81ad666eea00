// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Watermark Repository

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::Watermark;
use ledger_domain::repositories::WatermarkRepository;
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};

pub struct PgWatermarkRepository {
    pool: PgPool,
}

impl PgWatermarkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatermarkRepository for PgWatermarkRepository {
    async fn get(&self, job_name: &'static str) -> Result<Watermark, PipelineError> {
        let row = sqlx::query("SELECT consumed_through FROM watermarks WHERE job_name = $1")
            .bind(job_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch watermark", e))?;

        let consumed_through = row.and_then(|r| r.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(0).ok().flatten());
        Ok(Watermark::new(job_name, consumed_through))
    }

    async fn advance(&self, watermark: &Watermark) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            INSERT INTO watermarks (job_name, consumed_through)
            VALUES ($1, $2)
            ON CONFLICT (job_name) DO UPDATE SET consumed_through = EXCLUDED.consumed_through
            WHERE watermarks.consumed_through IS NULL OR watermarks.consumed_through < EXCLUDED.consumed_through
            "#,
        )
        .bind(watermark.job_name())
        .bind(watermark.consumed_through())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("advance watermark", e))?;
        Ok(())
    }
}
