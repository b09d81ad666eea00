// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Ledger Fact Repository
//!
//! Queries filter on `year` wherever possible so Postgres can prune
//! partitions (the table is range-partitioned on `year`, see migrations).

use super::map_sqlx_error;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledger_domain::entities::LedgerFact;
use ledger_domain::repositories::LedgerFactRepository;
use ledger_domain::value_objects::{CountryCode, Direction, HsCode6, Kilograms, PriceUsdPerKg, UsdAmount};
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgLedgerFactRepository {
    pool: PgPool,
}

impl PgLedgerFactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_fact(row: &sqlx::postgres::PgRow) -> Result<LedgerFact, PipelineError> {
        let direction: String = row.try_get("direction").map_err(|e| map_sqlx_error("read ledger_fact.direction", e))?;
        let reporting_country: String =
            row.try_get("reporting_country").map_err(|e| map_sqlx_error("read ledger_fact.reporting_country", e))?;
        let origin_country: String =
            row.try_get("origin_country").map_err(|e| map_sqlx_error("read ledger_fact.origin_country", e))?;
        let destination_country: String =
            row.try_get("destination_country").map_err(|e| map_sqlx_error("read ledger_fact.destination_country", e))?;
        let hs_code_6: String = row.try_get("hs_code_6").map_err(|e| map_sqlx_error("read ledger_fact.hs_code_6", e))?;
        let hs_code_6 = HsCode6::normalize(&hs_code_6)
            .ok_or_else(|| PipelineError::BugAssertionFailed(format!("persisted hs_code_6 '{hs_code_6}' failed to normalize")))?;

        let qty_kg: Option<f64> = row.try_get("qty_kg").map_err(|e| map_sqlx_error("read ledger_fact.qty_kg", e))?;
        let qty_kg = qty_kg.map(Kilograms::new).transpose()?;
        let customs_value_usd: Option<f64> =
            row.try_get("customs_value_usd").map_err(|e| map_sqlx_error("read ledger_fact.customs_value_usd", e))?;
        let customs_value_usd = customs_value_usd.map(UsdAmount::new).transpose()?;
        let price_usd_per_kg = match (customs_value_usd, qty_kg) {
            (Some(v), Some(q)) => PriceUsdPerKg::derive(v, q),
            _ => None,
        };

        Ok(LedgerFact::from_parts(
            row.try_get("transaction_id").map_err(|e| map_sqlx_error("read ledger_fact.transaction_id", e))?,
            row.try_get("year").map_err(|e| map_sqlx_error("read ledger_fact.year", e))?,
            row.try_get("std_id").map_err(|e| map_sqlx_error("read ledger_fact.std_id", e))?,
            direction.parse().map_err(|_| PipelineError::BugAssertionFailed(format!("bad direction '{direction}'")))?,
            CountryCode::normalize(&reporting_country),
            CountryCode::normalize(&origin_country),
            CountryCode::normalize(&destination_country),
            hs_code_6,
            row.try_get("shipment_date").map_err(|e| map_sqlx_error("read ledger_fact.shipment_date", e))?,
            row.try_get::<i32, _>("month").map_err(|e| map_sqlx_error("read ledger_fact.month", e))? as u32,
            qty_kg,
            customs_value_usd,
            price_usd_per_kg,
            row.try_get("vessel_name").map_err(|e| map_sqlx_error("read ledger_fact.vessel_name", e))?,
            row.try_get("container_id").map_err(|e| map_sqlx_error("read ledger_fact.container_id", e))?,
            row.try_get("supplier_uuid").map_err(|e| map_sqlx_error("read ledger_fact.supplier_uuid", e))?,
            row.try_get("buyer_uuid").map_err(|e| map_sqlx_error("read ledger_fact.buyer_uuid", e))?,
            row.try_get("hidden_buyer_flag").map_err(|e| map_sqlx_error("read ledger_fact.hidden_buyer_flag", e))?,
            row.try_get("mirror_matched_at").map_err(|e| map_sqlx_error("read ledger_fact.mirror_matched_at", e))?,
            row.try_get("created_at").map_err(|e| map_sqlx_error("read ledger_fact.created_at", e))?,
        ))
    }
}

#[async_trait]
impl LedgerFactRepository for PgLedgerFactRepository {
    async fn insert_if_not_exists(&self, fact: &LedgerFact) -> Result<bool, PipelineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO ledger_facts
                (transaction_id, year, std_id, direction, reporting_country, origin_country, destination_country,
                 hs_code_6, shipment_date, month, qty_kg, customs_value_usd, vessel_name, container_id,
                 supplier_uuid, buyer_uuid, hidden_buyer_flag, mirror_matched_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (std_id, year) DO NOTHING
            "#,
        )
        .bind(fact.transaction_id())
        .bind(fact.year())
        .bind(fact.std_id())
        .bind(fact.direction().as_str())
        .bind(fact.reporting_country().as_str())
        .bind(fact.origin_country().as_str())
        .bind(fact.destination_country().as_str())
        .bind(fact.hs_code_6().as_str())
        .bind(fact.shipment_date())
        .bind(fact.month() as i32)
        .bind(fact.qty_kg().map(|k| k.value()))
        .bind(fact.customs_value_usd().map(|v| v.value()))
        .bind(fact.vessel_name())
        .bind(fact.container_id())
        .bind(fact.supplier_uuid())
        .bind(fact.buyer_uuid())
        .bind(fact.hidden_buyer_flag())
        .bind(fact.mirror_matched_at())
        .bind(fact.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert ledger_fact", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_transaction(&self, transaction_id: Uuid, year: i32) -> Result<Option<LedgerFact>, PipelineError> {
        let row = sqlx::query("SELECT * FROM ledger_facts WHERE transaction_id = $1 AND year = $2")
            .bind(transaction_id)
            .bind(year)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find ledger_fact by transaction", e))?;
        row.as_ref().map(Self::row_to_fact).transpose()
    }

    async fn find_mirror_eligible(&self, destination_country: &CountryCode, limit: usize) -> Result<Vec<LedgerFact>, PipelineError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM ledger_facts
            WHERE direction = 'EXPORT' AND destination_country = $1
                AND hidden_buyer_flag AND buyer_uuid IS NULL AND mirror_matched_at IS NULL
            ORDER BY shipment_date
            LIMIT $2
            "#,
        )
        .bind(destination_country.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find mirror eligible ledger_facts", e))?;
        rows.iter().map(Self::row_to_fact).collect()
    }

    async fn find_mirror_candidates(
        &self,
        reporting_country: &CountryCode,
        origin_country: &CountryCode,
        hs_code_6: &str,
        date_window: (NaiveDate, NaiveDate),
    ) -> Result<Vec<LedgerFact>, PipelineError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM ledger_facts
            WHERE direction = 'IMPORT' AND reporting_country = $1 AND origin_country = $2
                AND hs_code_6 = $3 AND shipment_date BETWEEN $4 AND $5
            ORDER BY shipment_date
            "#,
        )
        .bind(reporting_country.as_str())
        .bind(origin_country.as_str())
        .bind(hs_code_6)
        .bind(date_window.0)
        .bind(date_window.1)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find mirror candidate ledger_facts", e))?;
        rows.iter().map(Self::row_to_fact).collect()
    }

    async fn apply_mirror_match(&self, transaction_id: Uuid, year: i32, buyer_uuid: Uuid) -> Result<(), PipelineError> {
        sqlx::query(
            "UPDATE ledger_facts SET buyer_uuid = $3, mirror_matched_at = now() WHERE transaction_id = $1 AND year = $2",
        )
        .bind(transaction_id)
        .bind(year)
        .bind(buyer_uuid)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("apply mirror match", e))?;
        Ok(())
    }

    async fn find_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<LedgerFact>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM ledger_facts WHERE created_at >= $1 ORDER BY created_at LIMIT $2")
            .bind(since)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find ledger_facts since", e))?;
        rows.iter().map(Self::row_to_fact).collect()
    }
}
