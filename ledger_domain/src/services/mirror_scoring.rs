// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mirror Match Scoring
//!
//! spec.md §4.5: given an export fact and a candidate import fact (both
//! already filtered by the SQL candidate query), score the pair on a
//! fixed 100-point rubric and decide whether the best candidate is
//! unambiguous enough to accept.

use chrono::NaiveDate;
use uuid::Uuid;

/// The subset of fact fields the scoring rubric reads. The candidate
/// query (infrastructure layer) is responsible for the filters in
/// spec.md §4.5; this type only scores pairs it is handed.
#[derive(Debug, Clone, Copy)]
pub struct MirrorCandidateFields<'a> {
    pub qty_kg: Option<f64>,
    pub shipment_date: NaiveDate,
    pub container_id: Option<&'a str>,
    pub vessel_name: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct MirrorScoreConfig {
    pub min_lag_days: i64,
    pub max_lag_days: i64,
    pub qty_tolerance: f64,
    pub min_score: f64,
    pub min_margin: f64,
}

impl Default for MirrorScoreConfig {
    fn default() -> Self {
        Self { min_lag_days: 15, max_lag_days: 45, qty_tolerance: 0.05, min_score: 70.0, min_margin: 5.0 }
    }
}

/// A scored candidate import, carrying just enough to let the decision
/// step identify the winner.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate {
    pub import_transaction_id: Uuid,
    pub score: f64,
}

/// Scores one export/import pair. HS6-exact and date-within-window are
/// preconditions of the candidate set reaching this function at all, so
/// both always contribute once called; quantity and string-equality
/// criteria are conditional.
pub fn score_candidate(
    export: &MirrorCandidateFields,
    candidate: &MirrorCandidateFields,
    import_transaction_id: Uuid,
    cfg: &MirrorScoreConfig,
) -> ScoredCandidate {
    let mut score = 40.0; // HS6 exact: guaranteed by the candidate query.

    let lag = (candidate.shipment_date - export.shipment_date).num_days();
    if lag >= cfg.min_lag_days && lag <= cfg.max_lag_days {
        score += 20.0;
    }

    if let (Some(export_qty), Some(candidate_qty)) = (export.qty_kg, candidate.qty_kg) {
        let lower = export_qty * (1.0 - cfg.qty_tolerance);
        let upper = export_qty * (1.0 + cfg.qty_tolerance);
        if candidate_qty >= lower && candidate_qty <= upper {
            score += 25.0;
        }
    } else {
        // spec.md §4.5: "otherwise quantity not required" — treat as satisfied.
        score += 25.0;
    }

    if let (Some(a), Some(b)) = (export.container_id, candidate.container_id) {
        if a == b {
            score += 10.0;
        }
    }

    if let (Some(a), Some(b)) = (export.vessel_name, candidate.vessel_name) {
        if a == b {
            score += 5.0;
        }
    }

    ScoredCandidate { import_transaction_id, score }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorDecision {
    Accept { winner: Uuid },
    NoCandidates,
    LowScore,
    Ambiguous,
}

/// spec.md §4.5 decision rule: accept the best candidate iff it clears
/// `min_score` AND beats the runner-up by more than `min_margin`.
pub fn decide(scored: &[ScoredCandidate], cfg: &MirrorScoreConfig) -> MirrorDecision {
    let mut sorted: Vec<&ScoredCandidate> = scored.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    match sorted.as_slice() {
        [] => MirrorDecision::NoCandidates,
        [only] => {
            if only.score >= cfg.min_score {
                MirrorDecision::Accept { winner: only.import_transaction_id }
            } else {
                MirrorDecision::LowScore
            }
        }
        [best, second, ..] => {
            if best.score < cfg.min_score {
                MirrorDecision::LowScore
            } else if (best.score - second.score) > cfg.min_margin {
                MirrorDecision::Accept { winner: best.import_transaction_id }
            } else {
                MirrorDecision::Ambiguous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(qty_kg: Option<f64>, date: (i32, u32, u32), container: Option<&'static str>, vessel: Option<&'static str>) -> MirrorCandidateFields<'static> {
        MirrorCandidateFields {
            qty_kg,
            shipment_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            container_id: container,
            vessel_name: vessel,
        }
    }

    #[test]
    fn scenario_b_hidden_buyer_mirror_match_scores_85() {
        let export = fields(Some(1000.0), (2025, 3, 1), None, None);
        let import = fields(Some(1020.0), (2025, 3, 25), None, None);
        let scored = score_candidate(&export, &import, Uuid::new_v4(), &MirrorScoreConfig::default());
        assert_eq!(scored.score, 85.0);
    }

    #[test]
    fn accepts_unambiguous_best() {
        let cfg = MirrorScoreConfig::default();
        let winner_id = Uuid::new_v4();
        let scored = vec![
            ScoredCandidate { import_transaction_id: winner_id, score: 85.0 },
            ScoredCandidate { import_transaction_id: Uuid::new_v4(), score: 60.0 },
        ];
        assert_eq!(decide(&scored, &cfg), MirrorDecision::Accept { winner: winner_id });
    }

    #[test]
    fn scenario_c_near_tie_is_ambiguous() {
        let cfg = MirrorScoreConfig::default();
        let scored = vec![
            ScoredCandidate { import_transaction_id: Uuid::new_v4(), score: 85.0 },
            ScoredCandidate { import_transaction_id: Uuid::new_v4(), score: 85.0 },
        ];
        assert_eq!(decide(&scored, &cfg), MirrorDecision::Ambiguous);
    }

    #[test]
    fn below_min_score_is_rejected() {
        let cfg = MirrorScoreConfig::default();
        let scored = vec![ScoredCandidate { import_transaction_id: Uuid::new_v4(), score: 65.0 }];
        assert_eq!(decide(&scored, &cfg), MirrorDecision::LowScore);
    }

    #[test]
    fn empty_candidate_set() {
        assert_eq!(decide(&[], &MirrorScoreConfig::default()), MirrorDecision::NoCandidates);
    }
}
