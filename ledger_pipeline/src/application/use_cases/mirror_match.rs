// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S5 — Mirror Matcher
//!
//! For export facts with a hidden buyer, finds the corresponding import
//! fact in the destination country, scores candidates on the spec.md
//! §4.5 rubric, and writes back the inferred `buyer_uuid` on an
//! unambiguous winner. Terminal per export: `matched` or `skipped`,
//! never revisited once `mirror_matched_at` is set.

use crate::application::commands::MirrorMatchCommand;
use crate::infrastructure::adapters::mapping_registry::MappingRegistry;
use crate::infrastructure::runtime::{StageOutcome, StageRunner};
use ledger_domain::entities::{LedgerFact, MirrorMatch, RunCounters};
use ledger_domain::repositories::{LedgerFactRepository, MirrorMatchRepository};
use ledger_domain::services::mirror_scoring::{decide, score_candidate, MirrorCandidateFields, MirrorDecision, MirrorScoreConfig};
use ledger_domain::PipelineError;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

const STAGE: &str = "mirror_match";

pub struct MirrorMatchUseCase {
    ledger_facts: Arc<dyn LedgerFactRepository>,
    mirror_matches: Arc<dyn MirrorMatchRepository>,
    mappings: Arc<MappingRegistry>,
    score_config: MirrorScoreConfig,
    stage_runner: Arc<StageRunner>,
}

impl MirrorMatchUseCase {
    pub fn new(
        ledger_facts: Arc<dyn LedgerFactRepository>,
        mirror_matches: Arc<dyn MirrorMatchRepository>,
        mappings: Arc<MappingRegistry>,
        stage_runner: Arc<StageRunner>,
    ) -> Self {
        Self { ledger_facts, mirror_matches, mappings, score_config: MirrorScoreConfig::default(), stage_runner }
    }

    pub async fn execute(
        &self,
        cmd: &MirrorMatchCommand,
        cancel: &CancellationToken,
    ) -> Result<ledger_domain::entities::PipelineRun, PipelineError> {
        let destinations = self.mappings.known_countries();
        let filters = json!({ "batch_size": cmd.batch_size, "destination_country_count": destinations.len() });

        self.stage_runner
            .run(STAGE, filters, cancel, || async {
                let mut counters = RunCounters::default();
                for destination in &destinations {
                    loop {
                        let eligible = self.ledger_facts.find_mirror_eligible(destination, cmd.batch_size).await?;
                        if eligible.is_empty() {
                            break;
                        }
                        for export in &eligible {
                            counters.merge(self.stage_runner.run_chunk(cancel, self.match_one(export)).await?);
                        }
                        if eligible.len() < cmd.batch_size {
                            break;
                        }
                    }
                }
                Ok(StageOutcome::new(counters))
            })
            .await
    }

    async fn match_one(&self, export: &LedgerFact) -> Result<RunCounters, PipelineError> {
        let window_start = export.shipment_date() + chrono::Duration::days(self.score_config.min_lag_days);
        let window_end = export.shipment_date() + chrono::Duration::days(self.score_config.max_lag_days);
        let candidates = self
            .ledger_facts
            .find_mirror_candidates(export.destination_country(), export.origin_country(), export.hs_code_6().as_str(), (window_start, window_end))
            .await?;

        if candidates.is_empty() {
            return Ok(RunCounters { processed: 1, skipped: 1, ..Default::default() });
        }

        let export_fields = candidate_fields(export);
        let scored: Vec<_> = candidates
            .iter()
            .map(|candidate| score_candidate(&export_fields, &candidate_fields(candidate), candidate.transaction_id(), &self.score_config))
            .collect();

        match decide(&scored, &self.score_config) {
            MirrorDecision::Accept { winner } => {
                let Some(winner_fact) = candidates.iter().find(|c| c.transaction_id() == winner) else {
                    return Ok(RunCounters { processed: 1, skipped: 1, ..Default::default() });
                };
                let Some(buyer_uuid) = winner_fact.buyer_uuid() else {
                    return Ok(RunCounters { processed: 1, skipped: 1, ..Default::default() });
                };
                let best_score = scored.iter().find(|s| s.import_transaction_id == winner).map(|s| s.score).unwrap_or(0.0);
                let breakdown = json!({
                    "export_transaction_id": export.transaction_id(),
                    "import_transaction_id": winner,
                    "score": best_score,
                    "candidate_count": candidates.len(),
                });
                let mirror_match = MirrorMatch::new(export.transaction_id(), winner, best_score, breakdown);
                if self.mirror_matches.insert_if_not_exists(&mirror_match).await? {
                    self.ledger_facts.apply_mirror_match(export.transaction_id(), export.year(), buyer_uuid).await?;
                    info!(export_id = %export.transaction_id(), import_id = %winner, score = best_score, "mirror match accepted");
                    Ok(RunCounters { processed: 1, created: 1, ..Default::default() })
                } else {
                    Ok(RunCounters { processed: 1, skipped: 1, ..Default::default() })
                }
            }
            MirrorDecision::NoCandidates | MirrorDecision::LowScore | MirrorDecision::Ambiguous => {
                Ok(RunCounters { processed: 1, skipped: 1, ..Default::default() })
            }
        }
    }
}

fn candidate_fields(fact: &LedgerFact) -> MirrorCandidateFields<'_> {
    MirrorCandidateFields {
        qty_kg: fact.qty_kg().map(|k| k.value()),
        shipment_date: fact.shipment_date(),
        container_id: fact.container_id(),
        vessel_name: fact.vessel_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::entities::PipelineRun;
    use ledger_domain::repositories::PipelineRunRepository;
    use ledger_domain::value_objects::{CountryCode, Direction, HsCode6, Kilograms, UsdAmount};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeFacts {
        eligible: Mutex<Vec<LedgerFact>>,
        served: Mutex<bool>,
        candidates: Mutex<Vec<LedgerFact>>,
        matched: Mutex<Vec<(Uuid, Uuid)>>,
    }

    #[async_trait::async_trait]
    impl LedgerFactRepository for FakeFacts {
        async fn insert_if_not_exists(&self, _fact: &LedgerFact) -> Result<bool, PipelineError> {
            Ok(true)
        }
        async fn find_by_transaction(&self, _id: Uuid, _year: i32) -> Result<Option<LedgerFact>, PipelineError> {
            Ok(None)
        }
        async fn find_mirror_eligible(&self, _destination_country: &CountryCode, _limit: usize) -> Result<Vec<LedgerFact>, PipelineError> {
            let mut served = self.served.lock().unwrap();
            if *served {
                return Ok(vec![]);
            }
            *served = true;
            Ok(self.eligible.lock().unwrap().clone())
        }
        async fn find_mirror_candidates(
            &self,
            _reporting_country: &CountryCode,
            _origin_country: &CountryCode,
            _hs_code_6: &str,
            _date_window: (chrono::NaiveDate, chrono::NaiveDate),
        ) -> Result<Vec<LedgerFact>, PipelineError> {
            Ok(self.candidates.lock().unwrap().clone())
        }
        async fn apply_mirror_match(&self, transaction_id: Uuid, _year: i32, buyer_uuid: Uuid) -> Result<(), PipelineError> {
            self.matched.lock().unwrap().push((transaction_id, buyer_uuid));
            Ok(())
        }
        async fn find_since(&self, _since: chrono::DateTime<chrono::Utc>, _limit: usize) -> Result<Vec<LedgerFact>, PipelineError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeMirrorMatches {
        inserted: Mutex<Vec<MirrorMatch>>,
    }

    #[async_trait::async_trait]
    impl MirrorMatchRepository for FakeMirrorMatches {
        async fn insert_if_not_exists(&self, mirror_match: &MirrorMatch) -> Result<bool, PipelineError> {
            let mut inserted = self.inserted.lock().unwrap();
            if inserted.iter().any(|m| m.export_transaction_id() == mirror_match.export_transaction_id()) {
                return Ok(false);
            }
            inserted.push(mirror_match.clone());
            Ok(true)
        }
        async fn find_by_export(&self, export_transaction_id: Uuid) -> Result<Option<MirrorMatch>, PipelineError> {
            Ok(self.inserted.lock().unwrap().iter().find(|m| m.export_transaction_id() == export_transaction_id).cloned())
        }
    }

    #[derive(Default)]
    struct FakeRuns;

    #[async_trait::async_trait]
    impl PipelineRunRepository for FakeRuns {
        async fn insert(&self, _run: &PipelineRun) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn update(&self, _run: &PipelineRun) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(None)
        }
        async fn find_running(&self, _stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(vec![])
        }
    }

    fn export_fact() -> LedgerFact {
        LedgerFact::promote(
            Uuid::new_v4(),
            Direction::Export,
            CountryCode::normalize("INDONESIA"),
            CountryCode::normalize("INDONESIA"),
            CountryCode::normalize("VIETNAM"),
            HsCode6::normalize("690721").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            2025,
            3,
            Some(Kilograms::new(1000.0).unwrap()),
            Some(UsdAmount::new(8470.0).unwrap()),
            None,
            None,
            None,
            None,
            None,
            true,
        )
    }

    fn import_candidate(buyer_uuid: Uuid) -> LedgerFact {
        LedgerFact::promote(
            Uuid::new_v4(),
            Direction::Import,
            CountryCode::normalize("VIETNAM"),
            CountryCode::normalize("INDONESIA"),
            CountryCode::normalize("VIETNAM"),
            HsCode6::normalize("690721").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 3, 25).unwrap(),
            2025,
            3,
            Some(Kilograms::new(1020.0).unwrap()),
            None,
            None,
            None,
            None,
            None,
            Some(buyer_uuid),
            false,
        )
    }

    fn mapping_registry_with_one_corridor() -> Arc<MappingRegistry> {
        use crate::infrastructure::adapters::mapping_registry::{MappingLifecycle, MappingSpec, ValueType};
        let mut specs = HashMap::new();
        specs.insert(
            "vietnam_import_full".to_string(),
            MappingSpec {
                lifecycle: MappingLifecycle::Live,
                column_mapping: HashMap::new(),
                weight_unit: "KG".to_string(),
                value_currency: "USD".to_string(),
                value_type: ValueType::Customs,
                defaults: HashMap::new(),
                date_formats: vec![],
                header_row_index: None,
            },
        );
        Arc::new(MappingRegistry::from_specs(specs))
    }

    #[tokio::test]
    async fn scenario_b_accepts_unambiguous_hidden_buyer_match() {
        let buyer_uuid = Uuid::new_v4();
        let import = import_candidate(buyer_uuid);
        let facts = Arc::new(FakeFacts::default());
        facts.eligible.lock().unwrap().push(export_fact());
        facts.candidates.lock().unwrap().push(import.clone());
        let mirror_matches = Arc::new(FakeMirrorMatches::default());
        let runs = Arc::new(FakeRuns);
        let use_case = MirrorMatchUseCase::new(
            facts.clone(),
            mirror_matches.clone(),
            mapping_registry_with_one_corridor(),
            Arc::new(StageRunner::new(runs)),
        );

        let run = use_case.execute(&MirrorMatchCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().created, 1);
        assert_eq!(facts.matched.lock().unwrap(), vec![(export_fact_id(&facts), buyer_uuid)]);
        assert_eq!(mirror_matches.inserted.lock().unwrap().len(), 1);
    }

    fn export_fact_id(facts: &FakeFacts) -> Uuid {
        facts.eligible.lock().unwrap()[0].transaction_id()
    }

    #[tokio::test]
    async fn ambiguous_candidates_are_skipped_without_writes() {
        let tied_a = import_candidate(Uuid::new_v4());
        let mut tied_b = import_candidate(Uuid::new_v4());
        // Same score inputs as tied_a: identical qty/date/container/vessel shape.
        tied_b = LedgerFact::promote(
            tied_b.std_id(),
            Direction::Import,
            CountryCode::normalize("VIETNAM"),
            CountryCode::normalize("INDONESIA"),
            CountryCode::normalize("VIETNAM"),
            HsCode6::normalize("690721").unwrap(),
            tied_a.shipment_date(),
            2025,
            3,
            tied_a.qty_kg(),
            None,
            None,
            None,
            None,
            None,
            tied_b.buyer_uuid(),
            false,
        );

        let facts = Arc::new(FakeFacts::default());
        facts.eligible.lock().unwrap().push(export_fact());
        facts.candidates.lock().unwrap().push(tied_a);
        facts.candidates.lock().unwrap().push(tied_b);
        let mirror_matches = Arc::new(FakeMirrorMatches::default());
        let runs = Arc::new(FakeRuns);
        let use_case = MirrorMatchUseCase::new(
            facts.clone(),
            mirror_matches.clone(),
            mapping_registry_with_one_corridor(),
            Arc::new(StageRunner::new(runs)),
        );

        let run = use_case.execute(&MirrorMatchCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().skipped, 1);
        assert!(mirror_matches.inserted.lock().unwrap().is_empty());
        assert!(facts.matched.lock().unwrap().is_empty());
    }
}
