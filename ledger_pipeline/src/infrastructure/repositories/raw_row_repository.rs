// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Raw Row Repository
//!
//! `insert_batch` uses `UNNEST` over bound arrays rather than one `INSERT`
//! per row (spec.md §4.1: ingestion must not be row-at-a-time).

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::RawRow;
use ledger_domain::repositories::RawRowRepository;
use ledger_domain::value_objects::FieldBag;
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgRawRowRepository {
    pool: PgPool,
}

impl PgRawRowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_raw_row(row: &sqlx::postgres::PgRow) -> Result<RawRow, PipelineError> {
        let fields_json: serde_json::Value = row.try_get("fields").map_err(|e| map_sqlx_error("read raw_row.fields", e))?;
        let fields: FieldBag = serde_json::from_value(fields_json).map_err(|e| PipelineError::SerializationError(e.to_string()))?;

        Ok(RawRow::from_parts(
            row.try_get("id").map_err(|e| map_sqlx_error("read raw_row.id", e))?,
            row.try_get("file_id").map_err(|e| map_sqlx_error("read raw_row.file_id", e))?,
            row.try_get("row_number").map_err(|e| map_sqlx_error("read raw_row.row_number", e))?,
            fields,
            row.try_get("hint_hs_code_raw").map_err(|e| map_sqlx_error("read raw_row.hint_hs_code_raw", e))?,
            row.try_get("hint_buyer_name_raw").map_err(|e| map_sqlx_error("read raw_row.hint_buyer_name_raw", e))?,
            row.try_get("hint_supplier_name_raw").map_err(|e| map_sqlx_error("read raw_row.hint_supplier_name_raw", e))?,
            row.try_get("hint_date_raw").map_err(|e| map_sqlx_error("read raw_row.hint_date_raw", e))?,
        ))
    }
}

#[async_trait]
impl RawRowRepository for PgRawRowRepository {
    async fn insert_batch(&self, rows: &[RawRow]) -> Result<u64, PipelineError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id()).collect();
        let file_ids: Vec<Uuid> = rows.iter().map(|r| r.file_id()).collect();
        let row_numbers: Vec<i64> = rows.iter().map(|r| r.row_number()).collect();
        let fields: Vec<serde_json::Value> = rows
            .iter()
            .map(|r| serde_json::to_value(r.fields()))
            .collect::<Result<_, _>>()
            .map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        let hint_hs: Vec<Option<String>> = rows.iter().map(|r| r.hint_hs_code_raw().map(str::to_string)).collect();
        let hint_buyer: Vec<Option<String>> = rows.iter().map(|r| r.hint_buyer_name_raw().map(str::to_string)).collect();
        let hint_supplier: Vec<Option<String>> = rows.iter().map(|r| r.hint_supplier_name_raw().map(str::to_string)).collect();
        let hint_date: Vec<Option<String>> = rows.iter().map(|r| r.hint_date_raw().map(str::to_string)).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO raw_rows
                (id, file_id, row_number, fields, hint_hs_code_raw, hint_buyer_name_raw, hint_supplier_name_raw, hint_date_raw)
            SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::bigint[], $4::jsonb[], $5::text[], $6::text[], $7::text[], $8::text[])
            "#,
        )
        .bind(&ids)
        .bind(&file_ids)
        .bind(&row_numbers)
        .bind(&fields)
        .bind(&hint_hs)
        .bind(&hint_buyer)
        .bind(&hint_supplier)
        .bind(&hint_date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("batch insert raw_rows", e))?;
        Ok(result.rows_affected())
    }

    async fn count_for_file(&self, file_id: Uuid) -> Result<u64, PipelineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_rows WHERE file_id = $1")
            .bind(file_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count raw_rows for file", e))?;
        Ok(count as u64)
    }

    async fn delete_for_file(&self, file_id: Uuid) -> Result<u64, PipelineError> {
        let result = sqlx::query("DELETE FROM raw_rows WHERE file_id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete raw_rows for file", e))?;
        Ok(result.rows_affected())
    }

    async fn find_unstandardized_chunk(&self, file_id: Uuid, chunk_size: usize) -> Result<Vec<RawRow>, PipelineError> {
        let rows = sqlx::query(
            r#"
            SELECT r.* FROM raw_rows r
            LEFT JOIN standardized_rows s ON s.raw_row_id = r.id
            WHERE r.file_id = $1 AND s.id IS NULL
            ORDER BY r.row_number
            LIMIT $2
            "#,
        )
        .bind(file_id)
        .bind(chunk_size as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find unstandardized raw_rows", e))?;
        rows.iter().map(Self::row_to_raw_row).collect()
    }
}
