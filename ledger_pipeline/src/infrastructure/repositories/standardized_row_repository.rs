// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Standardized Row Repository

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::StandardizedRow;
use ledger_domain::repositories::{IdentityWriteback, StandardizedRowRepository};
use ledger_domain::value_objects::{CountryCode, HsCode6, Kilograms, PriceUsdPerKg, UsdAmount};
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgStandardizedRowRepository {
    pool: PgPool,
}

impl PgStandardizedRowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_standardized(row: &sqlx::postgres::PgRow) -> Result<StandardizedRow, PipelineError> {
        let hs_code_6: Option<String> = row.try_get("hs_code_6").map_err(|e| map_sqlx_error("read standardized_row.hs_code_6", e))?;
        let hs_code_6 = hs_code_6.and_then(|s| HsCode6::normalize(&s));
        let origin_country: Option<String> =
            row.try_get("origin_country").map_err(|e| map_sqlx_error("read standardized_row.origin_country", e))?;
        let destination_country: Option<String> =
            row.try_get("destination_country").map_err(|e| map_sqlx_error("read standardized_row.destination_country", e))?;

        let qty_kg: Option<f64> = row.try_get("qty_kg").map_err(|e| map_sqlx_error("read standardized_row.qty_kg", e))?;
        let qty_kg = qty_kg.map(Kilograms::new).transpose()?;
        let value_fob_usd: Option<f64> =
            row.try_get("value_fob_usd").map_err(|e| map_sqlx_error("read standardized_row.value_fob_usd", e))?;
        let value_fob_usd = value_fob_usd.map(UsdAmount::new).transpose()?;
        let value_cif_usd: Option<f64> =
            row.try_get("value_cif_usd").map_err(|e| map_sqlx_error("read standardized_row.value_cif_usd", e))?;
        let value_cif_usd = value_cif_usd.map(UsdAmount::new).transpose()?;
        let customs_value_usd: Option<f64> =
            row.try_get("customs_value_usd").map_err(|e| map_sqlx_error("read standardized_row.customs_value_usd", e))?;
        let customs_value_usd = customs_value_usd.map(UsdAmount::new).transpose()?;
        let price_usd_per_kg = match (customs_value_usd, qty_kg) {
            (Some(v), Some(q)) => PriceUsdPerKg::derive(v, q),
            _ => None,
        };

        Ok(StandardizedRow::from_parts(
            row.try_get("id").map_err(|e| map_sqlx_error("read standardized_row.id", e))?,
            row.try_get("raw_row_id").map_err(|e| map_sqlx_error("read standardized_row.raw_row_id", e))?,
            row.try_get("file_id").map_err(|e| map_sqlx_error("read standardized_row.file_id", e))?,
            row.try_get("buyer_name").map_err(|e| map_sqlx_error("read standardized_row.buyer_name", e))?,
            row.try_get("supplier_name").map_err(|e| map_sqlx_error("read standardized_row.supplier_name", e))?,
            row.try_get("buyer_uuid").map_err(|e| map_sqlx_error("read standardized_row.buyer_uuid", e))?,
            row.try_get("supplier_uuid").map_err(|e| map_sqlx_error("read standardized_row.supplier_uuid", e))?,
            hs_code_6,
            origin_country.map(|c| CountryCode::normalize(&c)),
            destination_country.map(|c| CountryCode::normalize(&c)),
            row.try_get("export_date").map_err(|e| map_sqlx_error("read standardized_row.export_date", e))?,
            row.try_get("import_date").map_err(|e| map_sqlx_error("read standardized_row.import_date", e))?,
            row.try_get("shipment_date").map_err(|e| map_sqlx_error("read standardized_row.shipment_date", e))?,
            row.try_get("year").map_err(|e| map_sqlx_error("read standardized_row.year", e))?,
            row.try_get::<Option<i32>, _>("month").map_err(|e| map_sqlx_error("read standardized_row.month", e))?.map(|m| m as u32),
            row.try_get("qty_original").map_err(|e| map_sqlx_error("read standardized_row.qty_original", e))?,
            row.try_get("qty_original_unit").map_err(|e| map_sqlx_error("read standardized_row.qty_original_unit", e))?,
            qty_kg,
            row.try_get("value_original").map_err(|e| map_sqlx_error("read standardized_row.value_original", e))?,
            row.try_get("value_original_currency").map_err(|e| map_sqlx_error("read standardized_row.value_original_currency", e))?,
            value_fob_usd,
            value_cif_usd,
            customs_value_usd,
            price_usd_per_kg,
            row.try_get("teu").map_err(|e| map_sqlx_error("read standardized_row.teu", e))?,
            row.try_get("vessel_name").map_err(|e| map_sqlx_error("read standardized_row.vessel_name", e))?,
            row.try_get("container_id").map_err(|e| map_sqlx_error("read standardized_row.container_id", e))?,
            row.try_get("port").map_err(|e| map_sqlx_error("read standardized_row.port", e))?,
            row.try_get("hidden_buyer_flag").map_err(|e| map_sqlx_error("read standardized_row.hidden_buyer_flag", e))?,
        ))
    }
}

#[async_trait]
impl StandardizedRowRepository for PgStandardizedRowRepository {
    async fn insert_batch(&self, rows: &[StandardizedRow]) -> Result<u64, PipelineError> {
        let mut inserted = 0u64;
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin standardized_row batch", e))?;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO standardized_rows
                    (id, raw_row_id, file_id, buyer_name, supplier_name, buyer_uuid, supplier_uuid, hs_code_6,
                     origin_country, destination_country, export_date, import_date, shipment_date, year, month,
                     qty_original, qty_original_unit, qty_kg, value_original, value_original_currency,
                     value_fob_usd, value_cif_usd, customs_value_usd, teu, vessel_name, container_id, port,
                     hidden_buyer_flag)
                VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23,$24,$25,$26,$27,$28)
                "#,
            )
            .bind(row.id())
            .bind(row.raw_row_id())
            .bind(row.file_id())
            .bind(row.buyer_name())
            .bind(row.supplier_name())
            .bind(row.buyer_uuid())
            .bind(row.supplier_uuid())
            .bind(row.hs_code_6().map(|c| c.as_str()))
            .bind(row.origin_country().map(|c| c.as_str()))
            .bind(row.destination_country().map(|c| c.as_str()))
            .bind(row.export_date())
            .bind(row.import_date())
            .bind(row.shipment_date())
            .bind(row.year())
            .bind(row.month().map(|m| m as i32))
            .bind(row.qty_original())
            .bind(row.qty_original_unit())
            .bind(row.qty_kg().map(|k| k.value()))
            .bind(row.value_original())
            .bind(row.value_original_currency())
            .bind(row.value_fob_usd().map(|v| v.value()))
            .bind(row.value_cif_usd().map(|v| v.value()))
            .bind(row.customs_value_usd().map(|v| v.value()))
            .bind(row.teu())
            .bind(row.vessel_name())
            .bind(row.container_id())
            .bind(row.port())
            .bind(row.hidden_buyer_flag())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert standardized_row", e))?;
            inserted += result.rows_affected();
        }
        tx.commit().await.map_err(|e| map_sqlx_error("commit standardized_row batch", e))?;
        Ok(inserted)
    }

    async fn exists_for_raw_row(&self, raw_row_id: Uuid) -> Result<bool, PipelineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM standardized_rows WHERE raw_row_id = $1")
            .bind(raw_row_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check standardized_row exists", e))?;
        Ok(count > 0)
    }

    async fn find_missing_identity(&self, limit: usize) -> Result<Vec<StandardizedRow>, PipelineError> {
        let rows = sqlx::query(
            "SELECT * FROM standardized_rows WHERE buyer_uuid IS NULL OR supplier_uuid IS NULL LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find standardized_rows missing identity", e))?;
        rows.iter().map(Self::row_to_standardized).collect()
    }

    async fn writeback_identities(&self, updates: &[IdentityWriteback]) -> Result<u64, PipelineError> {
        let mut updated = 0u64;
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin identity writeback", e))?;
        for update in updates {
            let result = sqlx::query(
                r#"
                UPDATE standardized_rows SET
                    buyer_uuid = COALESCE($2, buyer_uuid),
                    supplier_uuid = COALESCE($3, supplier_uuid),
                    hidden_buyer_flag = $4
                WHERE id = $1
                "#,
            )
            .bind(update.std_id)
            .bind(update.buyer_uuid)
            .bind(update.supplier_uuid)
            .bind(update.hidden_buyer_flag)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("writeback identity", e))?;
            updated += result.rows_affected();
        }
        tx.commit().await.map_err(|e| map_sqlx_error("commit identity writeback", e))?;
        Ok(updated)
    }

    async fn find_unpromoted(&self, limit: usize) -> Result<Vec<StandardizedRow>, PipelineError> {
        let rows = sqlx::query(
            r#"
            SELECT s.* FROM standardized_rows s
            LEFT JOIN ledger_facts f ON f.std_id = s.id
            WHERE f.transaction_id IS NULL
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find unpromoted standardized_rows", e))?;
        rows.iter().map(Self::row_to_standardized).collect()
    }
}
