// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Risk Opinion Repository
//!
//! `upsert` lands on `(entity_type, entity_id, scope_key, engine_version)`;
//! the history-table archival of the row being replaced is a database
//! trigger (see migrations), invisible from here.

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::{RiskEntityType, RiskOpinion, RiskReason};
use ledger_domain::repositories::RiskOpinionRepository;
use ledger_domain::value_objects::{RiskLevel, ScopeKey};
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgRiskOpinionRepository {
    pool: PgPool,
}

impl PgRiskOpinionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_opinion(row: &sqlx::postgres::PgRow) -> Result<RiskOpinion, PipelineError> {
        let entity_type: String = row.try_get("entity_type").map_err(|e| map_sqlx_error("read risk_opinion.entity_type", e))?;
        let level: String = row.try_get("level").map_err(|e| map_sqlx_error("read risk_opinion.level", e))?;
        let reasons: serde_json::Value = row.try_get("reasons").map_err(|e| map_sqlx_error("read risk_opinion.reasons", e))?;
        let reasons: Vec<RiskReason> =
            serde_json::from_value(reasons).map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        let scope_key: String = row.try_get("scope_key").map_err(|e| map_sqlx_error("read risk_opinion.scope_key", e))?;

        Ok(RiskOpinion::from_parts(
            parse_entity_type(&entity_type)?,
            row.try_get("entity_id").map_err(|e| map_sqlx_error("read risk_opinion.entity_id", e))?,
            ScopeKey::from_raw(scope_key),
            row.try_get("engine_version").map_err(|e| map_sqlx_error("read risk_opinion.engine_version", e))?,
            row.try_get("score").map_err(|e| map_sqlx_error("read risk_opinion.score", e))?,
            parse_level(&level)?,
            row.try_get("main_reason_code").map_err(|e| map_sqlx_error("read risk_opinion.main_reason_code", e))?,
            reasons,
            row.try_get("confidence").map_err(|e| map_sqlx_error("read risk_opinion.confidence", e))?,
            row.try_get("computed_at").map_err(|e| map_sqlx_error("read risk_opinion.computed_at", e))?,
        ))
    }
}

fn entity_type_str(entity_type: RiskEntityType) -> &'static str {
    match entity_type {
        RiskEntityType::Shipment => "SHIPMENT",
        RiskEntityType::Buyer => "BUYER",
    }
}

fn parse_entity_type(s: &str) -> Result<RiskEntityType, PipelineError> {
    match s {
        "SHIPMENT" => Ok(RiskEntityType::Shipment),
        "BUYER" => Ok(RiskEntityType::Buyer),
        other => Err(PipelineError::BugAssertionFailed(format!("unknown risk entity_type '{other}'"))),
    }
}

fn level_str(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "LOW",
        RiskLevel::Medium => "MEDIUM",
        RiskLevel::High => "HIGH",
        RiskLevel::Critical => "CRITICAL",
    }
}

fn parse_level(s: &str) -> Result<RiskLevel, PipelineError> {
    match s {
        "LOW" => Ok(RiskLevel::Low),
        "MEDIUM" => Ok(RiskLevel::Medium),
        "HIGH" => Ok(RiskLevel::High),
        "CRITICAL" => Ok(RiskLevel::Critical),
        other => Err(PipelineError::BugAssertionFailed(format!("unknown risk level '{other}'"))),
    }
}

#[async_trait]
impl RiskOpinionRepository for PgRiskOpinionRepository {
    async fn upsert(&self, opinion: &RiskOpinion) -> Result<(), PipelineError> {
        let reasons = serde_json::to_value(opinion.reasons()).map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO risk_opinions
                (entity_type, entity_id, scope_key, engine_version, score, level, main_reason_code, reasons, confidence, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (entity_type, entity_id, scope_key, engine_version) DO UPDATE SET
                score = EXCLUDED.score,
                level = EXCLUDED.level,
                main_reason_code = EXCLUDED.main_reason_code,
                reasons = EXCLUDED.reasons,
                confidence = EXCLUDED.confidence,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(entity_type_str(opinion.entity_type()))
        .bind(opinion.entity_id())
        .bind(opinion.scope_key().as_str())
        .bind(opinion.engine_version())
        .bind(opinion.score())
        .bind(level_str(opinion.level()))
        .bind(opinion.main_reason_code())
        .bind(reasons)
        .bind(opinion.confidence())
        .bind(opinion.computed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert risk_opinion", e))?;
        Ok(())
    }

    async fn find_current(
        &self,
        entity_type: RiskEntityType,
        entity_id: Uuid,
        scope_key: &ScopeKey,
    ) -> Result<Option<RiskOpinion>, PipelineError> {
        let row = sqlx::query(
            "SELECT * FROM risk_opinions WHERE entity_type = $1 AND entity_id = $2 AND scope_key = $3 \
             ORDER BY computed_at DESC LIMIT 1",
        )
        .bind(entity_type_str(entity_type))
        .bind(entity_id)
        .bind(scope_key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find current risk_opinion", e))?;
        row.as_ref().map(Self::row_to_opinion).transpose()
    }
}
