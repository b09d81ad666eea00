// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S4 — Load Ledger
//!
//! Promotes [`StandardizedRow`]s that pass the validity gate into
//! append-only [`LedgerFact`]s (spec.md §4.4). Promotion is keyed on
//! `(std_id, year)`: re-running this stage over already-promoted rows is
//! a no-op via `insert_if_not_exists`.

use crate::application::commands::LoadLedgerCommand;
use crate::infrastructure::runtime::{StageOutcome, StageRunner};
use ledger_domain::entities::{FileRegistry, LedgerFact, RunCounters, StandardizedRow};
use ledger_domain::repositories::{FileRegistryRepository, LedgerFactRepository, StandardizedRowRepository};
use ledger_domain::PipelineError;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const STAGE: &str = "ledger";

pub struct LoadLedgerUseCase {
    standardized_rows: Arc<dyn StandardizedRowRepository>,
    ledger_facts: Arc<dyn LedgerFactRepository>,
    files: Arc<dyn FileRegistryRepository>,
    stage_runner: Arc<StageRunner>,
}

impl LoadLedgerUseCase {
    pub fn new(
        standardized_rows: Arc<dyn StandardizedRowRepository>,
        ledger_facts: Arc<dyn LedgerFactRepository>,
        files: Arc<dyn FileRegistryRepository>,
        stage_runner: Arc<StageRunner>,
    ) -> Self {
        Self { standardized_rows, ledger_facts, files, stage_runner }
    }

    pub async fn execute(
        &self,
        cmd: &LoadLedgerCommand,
        cancel: &CancellationToken,
    ) -> Result<ledger_domain::entities::PipelineRun, PipelineError> {
        let filters = json!({ "chunk_rows": cmd.chunk_rows });

        self.stage_runner
            .run(STAGE, filters, cancel, || async {
                let mut counters = RunCounters::default();
                loop {
                    let rows = self.standardized_rows.find_unpromoted(cmd.chunk_rows).await?;
                    if rows.is_empty() {
                        break;
                    }
                    let mut file_cache: HashMap<Uuid, FileRegistry> = HashMap::new();
                    for row in &rows {
                        let file = match file_cache.get(&row.file_id()) {
                            Some(file) => file.clone(),
                            None => {
                                let file = self
                                    .files
                                    .find_by_id(row.file_id())
                                    .await?
                                    .ok_or_else(|| PipelineError::internal_error(format!("no file registry row for {}", row.file_id())))?;
                                file_cache.insert(row.file_id(), file.clone());
                                file
                            }
                        };
                        counters.merge(self.stage_runner.run_chunk(cancel, self.promote_one(row, &file)).await?);
                    }
                }
                Ok(StageOutcome::new(counters))
            })
            .await
    }

    async fn promote_one(&self, row: &StandardizedRow, file: &FileRegistry) -> Result<RunCounters, PipelineError> {
        if !row.passes_ledger_validity_gate() {
            return Ok(RunCounters { processed: 1, skipped: 1, ..Default::default() });
        }

        // passes_ledger_validity_gate guarantees these are present.
        let fact = LedgerFact::promote(
            row.id(),
            file.direction(),
            file.reporting_country().clone(),
            row.origin_country().expect("validity gate checked").clone(),
            row.destination_country().expect("validity gate checked").clone(),
            *row.hs_code_6().expect("validity gate checked"),
            row.shipment_date().expect("validity gate checked"),
            row.year().expect("validity gate checked"),
            row.month().expect("validity gate checked"),
            row.qty_kg(),
            row.customs_value_usd(),
            row.price_usd_per_kg(),
            row.vessel_name().map(str::to_string),
            row.container_id().map(str::to_string),
            row.supplier_uuid(),
            row.buyer_uuid(),
            row.hidden_buyer_flag(),
        );

        if self.ledger_facts.insert_if_not_exists(&fact).await? {
            Ok(RunCounters { processed: 1, created: 1, ..Default::default() })
        } else {
            Ok(RunCounters { processed: 1, skipped: 1, ..Default::default() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::entities::{PipelineRun, StandardizedRowFields};
    use ledger_domain::repositories::PipelineRunRepository;
    use ledger_domain::value_objects::{CountryCode, HsCode6, Kilograms, UsdAmount};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStdRows {
        unpromoted: Mutex<Vec<StandardizedRow>>,
        served: Mutex<bool>,
    }

    #[async_trait::async_trait]
    impl StandardizedRowRepository for FakeStdRows {
        async fn insert_batch(&self, _rows: &[StandardizedRow]) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn exists_for_raw_row(&self, _raw_row_id: uuid::Uuid) -> Result<bool, PipelineError> {
            Ok(false)
        }
        async fn find_missing_identity(&self, _limit: usize) -> Result<Vec<StandardizedRow>, PipelineError> {
            Ok(vec![])
        }
        async fn writeback_identities(
            &self,
            _updates: &[ledger_domain::repositories::IdentityWriteback],
        ) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn find_unpromoted(&self, _limit: usize) -> Result<Vec<StandardizedRow>, PipelineError> {
            let mut served = self.served.lock().unwrap();
            if *served {
                return Ok(vec![]);
            }
            *served = true;
            Ok(self.unpromoted.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct FakeFacts {
        inserted: Mutex<Vec<LedgerFact>>,
    }

    #[async_trait::async_trait]
    impl LedgerFactRepository for FakeFacts {
        async fn insert_if_not_exists(&self, fact: &LedgerFact) -> Result<bool, PipelineError> {
            let mut inserted = self.inserted.lock().unwrap();
            if inserted.iter().any(|f| f.std_id() == fact.std_id() && f.year() == fact.year()) {
                return Ok(false);
            }
            inserted.push(fact.clone());
            Ok(true)
        }
        async fn find_by_transaction(&self, _id: uuid::Uuid, _year: i32) -> Result<Option<LedgerFact>, PipelineError> {
            Ok(None)
        }
        async fn find_mirror_eligible(
            &self,
            _destination_country: &CountryCode,
            _limit: usize,
        ) -> Result<Vec<LedgerFact>, PipelineError> {
            Ok(vec![])
        }
        async fn find_mirror_candidates(
            &self,
            _reporting_country: &CountryCode,
            _origin_country: &CountryCode,
            _hs_code_6: &str,
            _date_window: (chrono::NaiveDate, chrono::NaiveDate),
        ) -> Result<Vec<LedgerFact>, PipelineError> {
            Ok(vec![])
        }
        async fn apply_mirror_match(&self, _transaction_id: uuid::Uuid, _year: i32, _buyer_uuid: uuid::Uuid) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn find_since(&self, _since: chrono::DateTime<chrono::Utc>, _limit: usize) -> Result<Vec<LedgerFact>, PipelineError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeFiles {
        by_id: Mutex<HashMap<Uuid, FileRegistry>>,
    }

    #[async_trait::async_trait]
    impl FileRegistryRepository for FakeFiles {
        async fn find_by_fingerprint(&self, _fingerprint: &str) -> Result<Option<FileRegistry>, PipelineError> {
            Ok(None)
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRegistry>, PipelineError> {
            Ok(self.by_id.lock().unwrap().get(&id).cloned())
        }
        async fn insert(&self, file: &FileRegistry) -> Result<(), PipelineError> {
            self.by_id.lock().unwrap().insert(file.id(), file.clone());
            Ok(())
        }
        async fn save(&self, file: &FileRegistry) -> Result<(), PipelineError> {
            self.by_id.lock().unwrap().insert(file.id(), file.clone());
            Ok(())
        }
        async fn try_claim_stage(&self, _file_id: Uuid, _stage: &str) -> Result<bool, PipelineError> {
            Ok(true)
        }
        async fn complete_stage(&self, _file_id: Uuid, _stage: &str) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn abandon_stage(&self, _file_id: Uuid, _stage: &str) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn find_pending_for_stage(&self, _stage: &str, _limit: usize) -> Result<Vec<FileRegistry>, PipelineError> {
            Ok(vec![])
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
        async fn find_by_id(&self, _id: uuid::Uuid) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(None)
        }
        async fn find_running(&self, _stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(vec![])
        }
    }

    fn owning_file() -> FileRegistry {
        FileRegistry::new(
            "shipments.csv",
            "/data/INDONESIA/EXPORT/2025/03/shipments.csv",
            "abc123",
            CountryCode::normalize("INDONESIA"),
            ledger_domain::value_objects::Direction::Export,
            ledger_domain::value_objects::SourceFormat::Full,
        )
    }

    fn valid_row(file_id: Uuid) -> StandardizedRow {
        StandardizedRow::new(
            uuid::Uuid::new_v4(),
            file_id,
            StandardizedRowFields {
                hs_code_6: HsCode6::normalize("690721"),
                origin_country: Some(CountryCode::normalize("INDONESIA")),
                destination_country: Some(CountryCode::normalize("VIETNAM")),
                shipment_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 1),
                qty_kg: Some(Kilograms::new(1000.0).unwrap()),
                customs_value_usd: Some(UsdAmount::new(8470.0).unwrap()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn promotes_rows_passing_validity_gate() {
        let std_rows = Arc::new(FakeStdRows::default());
        let file = owning_file();
        let files = Arc::new(FakeFiles::default());
        files.by_id.lock().unwrap().insert(file.id(), file.clone());
        std_rows.unpromoted.lock().unwrap().push(valid_row(file.id()));
        let facts = Arc::new(FakeFacts::default());
        let runs = Arc::new(FakeRuns);
        let use_case = LoadLedgerUseCase::new(std_rows, facts.clone(), files, Arc::new(StageRunner::new(runs)));

        let run = use_case.execute(&LoadLedgerCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().created, 1);
        assert_eq!(facts.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rows_failing_validity_gate_are_skipped() {
        let std_rows = Arc::new(FakeStdRows::default());
        let file = owning_file();
        let files = Arc::new(FakeFiles::default());
        files.by_id.lock().unwrap().insert(file.id(), file.clone());
        let mut fields = StandardizedRowFields::default();
        fields.hs_code_6 = None;
        let incomplete = StandardizedRow::new(uuid::Uuid::new_v4(), file.id(), fields).unwrap();
        std_rows.unpromoted.lock().unwrap().push(incomplete);
        let facts = Arc::new(FakeFacts::default());
        let runs = Arc::new(FakeRuns);
        let use_case = LoadLedgerUseCase::new(std_rows, facts.clone(), files, Arc::new(StageRunner::new(runs)));

        let run = use_case.execute(&LoadLedgerCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().skipped, 1);
        assert!(facts.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fact_promotion_is_idempotent() {
        let std_rows = Arc::new(FakeStdRows::default());
        let file = owning_file();
        let files = Arc::new(FakeFiles::default());
        files.by_id.lock().unwrap().insert(file.id(), file.clone());
        let row = valid_row(file.id());
        std_rows.unpromoted.lock().unwrap().push(row.clone());
        let facts = Arc::new(FakeFacts::default());
        let runs = Arc::new(FakeRuns);
        let use_case = LoadLedgerUseCase::new(std_rows.clone(), facts.clone(), files, Arc::new(StageRunner::new(runs)));
        use_case.execute(&LoadLedgerCommand::default(), &CancellationToken::new()).await.unwrap();

        // Second run sees the same row again (e.g. a retried batch).
        *std_rows.served.lock().unwrap() = false;
        std_rows.unpromoted.lock().unwrap().push(row);
        let second = use_case.execute(&LoadLedgerCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(second.counters().skipped, 1);
        assert_eq!(facts.inserted.lock().unwrap().len(), 1);
    }
}
