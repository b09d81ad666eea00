// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Analytics Repository
//!
//! S6's builders are single `INSERT ... SELECT ... ON CONFLICT DO UPDATE`
//! statements over `ledger_facts`, not row-at-a-time Rust aggregation
//! (spec.md §4.6: "recompute from scratch... for the set of entities
//! touched since the watermark"). S7's lookups join the tables those
//! builders maintain back against one shipment or buyer at a time.

use super::map_sqlx_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledger_domain::repositories::{AnalyticsRepository, BuyerRiskInput, ShipmentRiskInput};
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};

pub struct PgAnalyticsRepository {
    pool: PgPool,
}

impl PgAnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn refresh_buyer_profiles(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError> {
        // Persona thresholds per spec.md §4.6: Whale >= $1M, Mid >= $100K,
        // Value >= $10K, New <= 2 shipments, Small otherwise.
        let result = sqlx::query(
            r#"
            WITH touched AS (
                SELECT DISTINCT buyer_uuid, destination_country
                FROM ledger_facts
                WHERE buyer_uuid IS NOT NULL AND created_at >= $1
            ),
            agg AS (
                SELECT
                    f.buyer_uuid,
                    f.destination_country,
                    COUNT(*) AS shipments,
                    COALESCE(SUM(f.customs_value_usd), 0) AS total_value_usd,
                    COALESCE(SUM(f.qty_kg), 0) AS total_weight_kg,
                    COUNT(DISTINCT f.hs_code_6) AS unique_hs6_count,
                    (
                        SELECT COALESCE(jsonb_agg(hs6 ORDER BY cnt DESC), '[]'::jsonb)
                        FROM (
                            SELECT hs_code_6 AS hs6, COUNT(*) AS cnt
                            FROM ledger_facts f2
                            WHERE f2.buyer_uuid = f.buyer_uuid AND f2.destination_country = f.destination_country
                            GROUP BY hs_code_6 ORDER BY cnt DESC LIMIT 5
                        ) top
                    ) AS top_hs6,
                    (
                        SELECT COALESCE(jsonb_agg(supplier ORDER BY cnt DESC), '[]'::jsonb)
                        FROM (
                            SELECT supplier_uuid AS supplier, COUNT(*) AS cnt
                            FROM ledger_facts f3
                            WHERE f3.buyer_uuid = f.buyer_uuid AND f3.destination_country = f.destination_country
                                  AND f3.supplier_uuid IS NOT NULL
                            GROUP BY supplier_uuid ORDER BY cnt DESC LIMIT 5
                        ) top
                    ) AS top_suppliers
                FROM ledger_facts f
                JOIN touched t ON t.buyer_uuid = f.buyer_uuid AND t.destination_country = f.destination_country
                GROUP BY f.buyer_uuid, f.destination_country
            )
            INSERT INTO buyer_profiles
                (buyer_uuid, destination_country, shipments, total_value_usd, total_weight_kg,
                 unique_hs6_count, top_hs6, top_suppliers, persona, updated_at)
            SELECT
                buyer_uuid, destination_country, shipments, total_value_usd, total_weight_kg,
                unique_hs6_count, top_hs6, top_suppliers,
                CASE
                    WHEN total_value_usd >= 1000000 THEN 'WHALE'
                    WHEN total_value_usd >= 100000 THEN 'MID'
                    WHEN total_value_usd >= 10000 THEN 'VALUE'
                    WHEN shipments <= 2 THEN 'NEW'
                    ELSE 'SMALL'
                END,
                now()
            FROM agg
            ON CONFLICT (buyer_uuid, destination_country) DO UPDATE SET
                shipments = EXCLUDED.shipments,
                total_value_usd = EXCLUDED.total_value_usd,
                total_weight_kg = EXCLUDED.total_weight_kg,
                unique_hs6_count = EXCLUDED.unique_hs6_count,
                top_hs6 = EXCLUDED.top_hs6,
                top_suppliers = EXCLUDED.top_suppliers,
                persona = EXCLUDED.persona,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(lower_bound)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("refresh buyer_profiles", e))?;
        Ok(result.rows_affected())
    }

    async fn refresh_exporter_profiles(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError> {
        // Stability score: months-active half plus inverse-variance half,
        // each 0-50 (spec.md §4.6).
        let result = sqlx::query(
            r#"
            WITH touched AS (
                SELECT DISTINCT supplier_uuid, origin_country
                FROM ledger_facts
                WHERE supplier_uuid IS NOT NULL AND created_at >= $1
            ),
            monthly AS (
                SELECT f.supplier_uuid, f.origin_country, date_trunc('month', f.shipment_date) AS month, COUNT(*) AS cnt
                FROM ledger_facts f
                JOIN touched t ON t.supplier_uuid = f.supplier_uuid AND t.origin_country = f.origin_country
                WHERE f.shipment_date >= now() - interval '12 months'
                GROUP BY f.supplier_uuid, f.origin_country, date_trunc('month', f.shipment_date)
            ),
            stability AS (
                SELECT
                    supplier_uuid, origin_country,
                    COUNT(*) AS months_active,
                    COALESCE(STDDEV_POP(cnt), 0) AS monthly_std
                FROM monthly
                GROUP BY supplier_uuid, origin_country
            ),
            agg AS (
                SELECT
                    f.supplier_uuid,
                    f.origin_country,
                    COUNT(*) AS shipments,
                    COALESCE(SUM(f.customs_value_usd), 0) AS total_value_usd,
                    COALESCE(SUM(f.qty_kg), 0) AS total_weight_kg,
                    COUNT(DISTINCT f.hs_code_6) AS unique_hs6_count,
                    s.months_active,
                    s.monthly_std
                FROM ledger_facts f
                JOIN touched t ON t.supplier_uuid = f.supplier_uuid AND t.origin_country = f.origin_country
                JOIN stability s ON s.supplier_uuid = f.supplier_uuid AND s.origin_country = f.origin_country
                GROUP BY f.supplier_uuid, f.origin_country, s.months_active, s.monthly_std
            )
            INSERT INTO exporter_profiles
                (supplier_uuid, origin_country, shipments, total_value_usd, total_weight_kg,
                 unique_hs6_count, stability_score, updated_at)
            SELECT
                supplier_uuid, origin_country, shipments, total_value_usd, total_weight_kg, unique_hs6_count,
                LEAST(months_active::double precision / 12.0 * 50.0, 50.0)
                    + LEAST(50.0 / (1.0 + monthly_std), 50.0),
                now()
            FROM agg
            ON CONFLICT (supplier_uuid, origin_country) DO UPDATE SET
                shipments = EXCLUDED.shipments,
                total_value_usd = EXCLUDED.total_value_usd,
                total_weight_kg = EXCLUDED.total_weight_kg,
                unique_hs6_count = EXCLUDED.unique_hs6_count,
                stability_score = EXCLUDED.stability_score,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(lower_bound)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("refresh exporter_profiles", e))?;
        Ok(result.rows_affected())
    }

    async fn refresh_price_corridors(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError> {
        let result = sqlx::query(
            r#"
            WITH qualifying AS (
                SELECT *
                FROM ledger_facts
                WHERE price_usd_per_kg > 0 AND qty_kg > 0 AND created_at >= $1
            )
            INSERT INTO price_corridors
                (hs_code_6, destination_country, year, month, direction, reporting_country,
                 min_price, p25_price, median_price, p75_price, max_price, mean_price, stddev_price,
                 sample_size, updated_at)
            SELECT
                hs_code_6, destination_country, year, month, direction, reporting_country,
                MIN(price_usd_per_kg),
                percentile_cont(0.25) WITHIN GROUP (ORDER BY price_usd_per_kg),
                percentile_cont(0.5) WITHIN GROUP (ORDER BY price_usd_per_kg),
                percentile_cont(0.75) WITHIN GROUP (ORDER BY price_usd_per_kg),
                MAX(price_usd_per_kg),
                AVG(price_usd_per_kg),
                COALESCE(STDDEV_POP(price_usd_per_kg), 0),
                COUNT(*),
                now()
            FROM qualifying
            GROUP BY hs_code_6, destination_country, year, month, direction, reporting_country
            ON CONFLICT (hs_code_6, destination_country, year, month, direction, reporting_country) DO UPDATE SET
                min_price = EXCLUDED.min_price,
                p25_price = EXCLUDED.p25_price,
                median_price = EXCLUDED.median_price,
                p75_price = EXCLUDED.p75_price,
                max_price = EXCLUDED.max_price,
                mean_price = EXCLUDED.mean_price,
                stddev_price = EXCLUDED.stddev_price,
                sample_size = EXCLUDED.sample_size,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(lower_bound)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("refresh price_corridors", e))?;
        Ok(result.rows_affected())
    }

    async fn refresh_lane_stats(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError> {
        let result = sqlx::query(
            r#"
            WITH touched AS (
                SELECT DISTINCT origin_country, destination_country, hs_code_6
                FROM ledger_facts
                WHERE created_at >= $1
            ),
            agg AS (
                SELECT
                    f.origin_country, f.destination_country, f.hs_code_6,
                    COUNT(*) AS shipments,
                    COALESCE(SUM(f.customs_value_usd), 0) AS total_value_usd,
                    COALESCE(SUM(f.qty_kg), 0) AS total_weight_kg,
                    (
                        SELECT COALESCE(jsonb_agg(vessel ORDER BY cnt DESC), '[]'::jsonb)
                        FROM (
                            SELECT vessel_name AS vessel, COUNT(*) AS cnt
                            FROM ledger_facts f2
                            WHERE f2.origin_country = f.origin_country AND f2.destination_country = f.destination_country
                                  AND f2.hs_code_6 = f.hs_code_6 AND f2.vessel_name IS NOT NULL
                            GROUP BY vessel_name ORDER BY cnt DESC LIMIT 5
                        ) top
                    ) AS top_carriers
                FROM ledger_facts f
                JOIN touched t ON t.origin_country = f.origin_country
                    AND t.destination_country = f.destination_country AND t.hs_code_6 = f.hs_code_6
                GROUP BY f.origin_country, f.destination_country, f.hs_code_6
            )
            INSERT INTO lane_stats
                (origin_country, destination_country, hs_code_6, shipments, total_value_usd,
                 total_weight_kg, top_carriers, updated_at)
            SELECT origin_country, destination_country, hs_code_6, shipments, total_value_usd,
                   total_weight_kg, top_carriers, now()
            FROM agg
            ON CONFLICT (origin_country, destination_country, hs_code_6) DO UPDATE SET
                shipments = EXCLUDED.shipments,
                total_value_usd = EXCLUDED.total_value_usd,
                total_weight_kg = EXCLUDED.total_weight_kg,
                top_carriers = EXCLUDED.top_carriers,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(lower_bound)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("refresh lane_stats", e))?;
        Ok(result.rows_affected())
    }

    async fn find_shipment_risk_inputs(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<ShipmentRiskInput>, PipelineError> {
        let rows = sqlx::query(
            r#"
            SELECT
                f.transaction_id,
                f.price_usd_per_kg,
                c.median_price AS corridor_median,
                c.stddev_price AS corridor_std,
                COALESCE(l.shipments, 0) AS lane_shipment_count,
                COALESCE(g.hs6_global_count, 0) AS hs6_global_count
            FROM ledger_facts f
            LEFT JOIN price_corridors c
                ON c.hs_code_6 = f.hs_code_6 AND c.destination_country = f.destination_country
                AND c.year = f.year AND c.month = f.month AND c.direction = f.direction
                AND c.reporting_country = f.reporting_country
            LEFT JOIN lane_stats l
                ON l.origin_country = f.origin_country AND l.destination_country = f.destination_country
                AND l.hs_code_6 = f.hs_code_6
            LEFT JOIN (
                SELECT hs_code_6, COUNT(*) AS hs6_global_count FROM ledger_facts GROUP BY hs_code_6
            ) g ON g.hs_code_6 = f.hs_code_6
            WHERE f.shipment_date >= $1
            ORDER BY f.created_at
            LIMIT $2
            "#,
        )
        .bind(since.date_naive())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find shipment risk inputs", e))?;

        rows.iter()
            .map(|row| {
                Ok(ShipmentRiskInput {
                    transaction_id: row.try_get("transaction_id").map_err(|e| map_sqlx_error("read transaction_id", e))?,
                    price_usd_per_kg: row.try_get("price_usd_per_kg").map_err(|e| map_sqlx_error("read price_usd_per_kg", e))?,
                    corridor_median: row.try_get("corridor_median").map_err(|e| map_sqlx_error("read corridor_median", e))?,
                    corridor_std: row.try_get("corridor_std").map_err(|e| map_sqlx_error("read corridor_std", e))?,
                    lane_shipment_count: row
                        .try_get::<i64, _>("lane_shipment_count")
                        .map_err(|e| map_sqlx_error("read lane_shipment_count", e))? as u64,
                    hs6_global_count: row
                        .try_get::<i64, _>("hs6_global_count")
                        .map_err(|e| map_sqlx_error("read hs6_global_count", e))? as u64,
                })
            })
            .collect()
    }

    async fn find_buyer_risk_inputs(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<BuyerRiskInput>, PipelineError> {
        let rows = sqlx::query(
            r#"
            WITH monthly AS (
                SELECT buyer_uuid, date_trunc('month', shipment_date) AS month, COUNT(*) AS cnt
                FROM ledger_facts
                WHERE buyer_uuid IS NOT NULL
                GROUP BY buyer_uuid, date_trunc('month', shipment_date)
            ),
            stats AS (
                SELECT
                    buyer_uuid,
                    AVG(cnt) AS mean_cnt,
                    COALESCE(STDDEV_POP(cnt), 0) AS std_cnt
                FROM monthly
                GROUP BY buyer_uuid
            ),
            latest_two AS (
                SELECT buyer_uuid, month, cnt,
                       ROW_NUMBER() OVER (PARTITION BY buyer_uuid ORDER BY month DESC) AS rn
                FROM monthly
            )
            SELECT
                p.buyer_uuid,
                p.total_value_usd,
                FALSE AS has_website_signal,
                CASE WHEN s.std_cnt > 0 THEN (cur.cnt - s.mean_cnt) / s.std_cnt ELSE 0 END AS monthly_count_z_score,
                CASE WHEN prev.cnt > 0 THEN (cur.cnt - prev.cnt)::double precision / prev.cnt ELSE 0 END AS month_over_month_pct_change,
                (p.shipments > 20) AS is_high_volume,
                '{}'::text[] AS contact_email_domains
            FROM buyer_profiles p
            JOIN stats s ON s.buyer_uuid = p.buyer_uuid
            LEFT JOIN latest_two cur ON cur.buyer_uuid = p.buyer_uuid AND cur.rn = 1
            LEFT JOIN latest_two prev ON prev.buyer_uuid = p.buyer_uuid AND prev.rn = 2
            WHERE p.updated_at >= $1
            ORDER BY p.updated_at
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find buyer risk inputs", e))?;

        rows.iter()
            .map(|row| {
                Ok(BuyerRiskInput {
                    buyer_uuid: row.try_get("buyer_uuid").map_err(|e| map_sqlx_error("read buyer_uuid", e))?,
                    total_value_usd: row.try_get("total_value_usd").map_err(|e| map_sqlx_error("read total_value_usd", e))?,
                    has_website_signal: row.try_get("has_website_signal").map_err(|e| map_sqlx_error("read has_website_signal", e))?,
                    monthly_count_z_score: row
                        .try_get("monthly_count_z_score")
                        .map_err(|e| map_sqlx_error("read monthly_count_z_score", e))?,
                    month_over_month_pct_change: row
                        .try_get("month_over_month_pct_change")
                        .map_err(|e| map_sqlx_error("read month_over_month_pct_change", e))?,
                    is_high_volume: row.try_get("is_high_volume").map_err(|e| map_sqlx_error("read is_high_volume", e))?,
                    contact_email_domains: row
                        .try_get("contact_email_domains")
                        .map_err(|e| map_sqlx_error("read contact_email_domains", e))?,
                })
            })
            .collect()
    }

    async fn refresh_serving_summary(&self) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            INSERT INTO serving_summary (id, total_facts, total_buyers, total_suppliers, open_risk_opinions, refreshed_at)
            SELECT
                1,
                (SELECT COUNT(*) FROM ledger_facts),
                (SELECT COUNT(DISTINCT buyer_uuid) FROM ledger_facts WHERE buyer_uuid IS NOT NULL),
                (SELECT COUNT(DISTINCT supplier_uuid) FROM ledger_facts WHERE supplier_uuid IS NOT NULL),
                (SELECT COUNT(*) FROM risk_opinions WHERE level IN ('HIGH', 'CRITICAL')),
                now()
            ON CONFLICT (id) DO UPDATE SET
                total_facts = EXCLUDED.total_facts,
                total_buyers = EXCLUDED.total_buyers,
                total_suppliers = EXCLUDED.total_suppliers,
                open_risk_opinions = EXCLUDED.open_risk_opinions,
                refreshed_at = EXCLUDED.refreshed_at
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("refresh serving_summary", e))?;
        Ok(())
    }
}
