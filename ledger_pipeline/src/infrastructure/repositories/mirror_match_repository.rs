// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Mirror Match Repository

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::MirrorMatch;
use ledger_domain::repositories::MirrorMatchRepository;
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgMirrorMatchRepository {
    pool: PgPool,
}

impl PgMirrorMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_match(row: &sqlx::postgres::PgRow) -> Result<MirrorMatch, PipelineError> {
        Ok(MirrorMatch::from_parts(
            row.try_get("id").map_err(|e| map_sqlx_error("read mirror_match.id", e))?,
            row.try_get("export_transaction_id").map_err(|e| map_sqlx_error("read mirror_match.export_transaction_id", e))?,
            row.try_get("import_transaction_id").map_err(|e| map_sqlx_error("read mirror_match.import_transaction_id", e))?,
            row.try_get("score").map_err(|e| map_sqlx_error("read mirror_match.score", e))?,
            row.try_get("breakdown").map_err(|e| map_sqlx_error("read mirror_match.breakdown", e))?,
        ))
    }
}

#[async_trait]
impl MirrorMatchRepository for PgMirrorMatchRepository {
    async fn insert_if_not_exists(&self, mirror_match: &MirrorMatch) -> Result<bool, PipelineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO mirror_matches (id, export_transaction_id, import_transaction_id, score, breakdown)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (export_transaction_id) DO NOTHING
            "#,
        )
        .bind(mirror_match.id())
        .bind(mirror_match.export_transaction_id())
        .bind(mirror_match.import_transaction_id())
        .bind(mirror_match.score())
        .bind(mirror_match.breakdown())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert mirror_match", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_export(&self, export_transaction_id: Uuid) -> Result<Option<MirrorMatch>, PipelineError> {
        let row = sqlx::query("SELECT * FROM mirror_matches WHERE export_transaction_id = $1")
            .bind(export_transaction_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find mirror_match by export", e))?;
        row.as_ref().map(Self::row_to_match).transpose()
    }
}
