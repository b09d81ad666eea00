// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Risk Opinion Entity
//!
//! One record per `(entity_type, entity_id, scope_key, engine_version)`
//! (spec.md §3, §4.7). Updates are upserts at the storage layer; a
//! database trigger archives the prior row to a history table before the
//! update lands, which is why [`RiskOpinion`] itself never needs to carry
//! its own "previous version" pointer — see invariant 8 (version
//! linearity), verified against the history table in integration tests.

use crate::value_objects::{RiskLevel, ScopeKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskEntityType {
    Shipment,
    Buyer,
}

/// A single rule's contribution, folded into `reasons` on the opinion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReason {
    pub code: String,
    pub score: f64,
    pub severity: String,
    pub context: Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskOpinion {
    entity_type: RiskEntityType,
    entity_id: Uuid,
    scope_key: ScopeKey,
    engine_version: String,
    score: f64,
    level: RiskLevel,
    main_reason_code: String,
    reasons: Vec<RiskReason>,
    confidence: f64,
    computed_at: DateTime<Utc>,
}

impl RiskOpinion {
    /// Folds a set of rule outputs into one opinion: the composite score
    /// is the maximum across rules (spec.md §4.7), and the main reason is
    /// whichever rule produced that maximum.
    pub fn from_reasons(
        entity_type: RiskEntityType,
        entity_id: Uuid,
        scope_key: ScopeKey,
        engine_version: impl Into<String>,
        reasons: Vec<RiskReason>,
        confidence: f64,
    ) -> Option<Self> {
        let top = reasons.iter().max_by(|a, b| a.score.total_cmp(&b.score))?;
        let score = top.score.min(100.0);
        Some(Self {
            entity_type,
            entity_id,
            scope_key,
            engine_version: engine_version.into(),
            score,
            level: RiskLevel::from_score(score),
            main_reason_code: top.code.clone(),
            reasons,
            confidence,
            computed_at: Utc::now(),
        })
    }

    /// Reconstructs an opinion from persisted columns (infrastructure only).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        entity_type: RiskEntityType,
        entity_id: Uuid,
        scope_key: ScopeKey,
        engine_version: String,
        score: f64,
        level: RiskLevel,
        main_reason_code: String,
        reasons: Vec<RiskReason>,
        confidence: f64,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            scope_key,
            engine_version,
            score,
            level,
            main_reason_code,
            reasons,
            confidence,
            computed_at,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn entity_type(&self) -> RiskEntityType {
        self.entity_type
    }
    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }
    pub fn scope_key(&self) -> &ScopeKey {
        &self.scope_key
    }
    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }
    pub fn score(&self) -> f64 {
        self.score
    }
    pub fn level(&self) -> RiskLevel {
        self.level
    }
    pub fn main_reason_code(&self) -> &str {
        &self.main_reason_code
    }
    pub fn reasons(&self) -> &[RiskReason] {
        &self.reasons
    }
    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composite_score_is_max_across_rules() {
        let reasons = vec![
            RiskReason { code: "WEIRD_LANE".into(), score: 45.0, severity: "MEDIUM".into(), context: json!({}) },
            RiskReason { code: "UNDER_INVOICE".into(), score: 92.0, severity: "CRITICAL".into(), context: json!({"z": -5.2}) },
        ];
        let opinion =
            RiskOpinion::from_reasons(RiskEntityType::Shipment, Uuid::new_v4(), ScopeKey::global(), "1.0.0", reasons, 0.9)
                .unwrap();
        assert_eq!(opinion.score(), 92.0);
        assert_eq!(opinion.main_reason_code(), "UNDER_INVOICE");
        assert_eq!(opinion.level(), RiskLevel::Critical);
    }

    #[test]
    fn no_reasons_yields_no_opinion() {
        assert!(RiskOpinion::from_reasons(RiskEntityType::Shipment, Uuid::new_v4(), ScopeKey::global(), "1.0.0", vec![], 1.0).is_none());
    }
}
