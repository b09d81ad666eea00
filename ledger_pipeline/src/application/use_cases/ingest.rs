// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S1 — Ingest
//!
//! Walks the raw-data root, fingerprints every recognized file, and
//! writes it verbatim as [`RawRow`]s (spec.md §4.1). A file whose
//! fingerprint is already registered is a no-op (spec.md §8a); a
//! synthetic test file is registered as `TEST` and never parsed.

use crate::application::commands::IngestCommand;
use crate::application::ports::RowSource;
use crate::infrastructure::adapters::checksum;
use crate::infrastructure::adapters::directory_scan::{self, ScannedFile};
use crate::infrastructure::adapters::mapping_registry::MappingRegistry;
use crate::infrastructure::runtime::{StageOutcome, StageRunner, WorkerPool};
use futures::stream::{self, StreamExt};
use ledger_domain::entities::{FileRegistry, PipelineRun, RawRow, RunCounters};
use ledger_domain::repositories::{FileRegistryRepository, RawRowRepository};
use ledger_domain::value_objects::{CountryCode, Direction, SourceFormat};
use ledger_domain::PipelineError;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct IngestUseCase {
    files: Arc<dyn FileRegistryRepository>,
    raw_rows: Arc<dyn RawRowRepository>,
    mappings: Arc<MappingRegistry>,
    row_source: Arc<dyn RowSource>,
    stage_runner: Arc<StageRunner>,
    workers: WorkerPool,
}

impl IngestUseCase {
    pub fn new(
        files: Arc<dyn FileRegistryRepository>,
        raw_rows: Arc<dyn RawRowRepository>,
        mappings: Arc<MappingRegistry>,
        row_source: Arc<dyn RowSource>,
        stage_runner: Arc<StageRunner>,
        workers: WorkerPool,
    ) -> Self {
        Self { files, raw_rows, mappings, row_source, stage_runner, workers }
    }

    pub async fn execute(
        &self,
        raw_data_root: &Path,
        cmd: &IngestCommand,
        cancel: &CancellationToken,
    ) -> Result<PipelineRun, PipelineError> {
        let scanned = directory_scan::scan(raw_data_root)?;
        let filters = json!({ "raw_data_root": raw_data_root.display().to_string(), "file_count": scanned.len() });

        self.stage_runner
            .run("ingest", filters, cancel, || async {
                let counters = Mutex::new(RunCounters::default());
                stream::iter(&scanned)
                    .for_each_concurrent(self.workers.capacity(), |scanned_file| {
                        let counters = &counters;
                        async move {
                            let permit = match self.workers.acquire().await {
                                Ok(permit) => permit,
                                Err(err) => {
                                    warn!(path = %scanned_file.path.display(), error = %err, "failed to acquire worker slot");
                                    counters.lock().unwrap().failed += 1;
                                    return;
                                }
                            };
                            match self.ingest_one(scanned_file, cmd, cancel).await {
                                Ok(delta) => counters.lock().unwrap().merge(delta),
                                Err(err) => {
                                    warn!(path = %scanned_file.path.display(), error = %err, "file-level ingest failure");
                                    counters.lock().unwrap().failed += 1;
                                }
                            }
                            drop(permit);
                        }
                    })
                    .await;
                Ok(StageOutcome::new(counters.into_inner().unwrap()))
            })
            .await
    }

    /// Resolves the corridor's source format by probing the mapping
    /// registry in a fixed preference order, since the directory
    /// convention encodes country/direction/year/month but not format
    /// (spec.md §6: format is a property of the corridor's mapping, not
    /// the file path).
    fn resolve_format(&self, country: &CountryCode, direction: Direction) -> Result<SourceFormat, PipelineError> {
        for candidate in [SourceFormat::Full, SourceFormat::Short, SourceFormat::Other] {
            if self.mappings.get(country, direction, candidate).is_some() {
                return Ok(candidate);
            }
        }
        Err(PipelineError::config_missing(format!("{country}_{direction}_*")))
    }

    async fn ingest_one(
        &self,
        scanned: &ScannedFile,
        cmd: &IngestCommand,
        cancel: &CancellationToken,
    ) -> Result<RunCounters, PipelineError> {
        let fingerprint = checksum::fingerprint_file(&scanned.path).await?;
        if self.files.find_by_fingerprint(&fingerprint).await?.is_some() {
            return Ok(RunCounters { skipped: 1, ..Default::default() });
        }

        let name = scanned.path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown").to_string();
        let format = if scanned.is_synthetic {
            SourceFormat::Other
        } else {
            self.resolve_format(&scanned.country, scanned.direction)?
        };

        let mut file = FileRegistry::new(
            name,
            scanned.path.to_string_lossy().into_owned(),
            fingerprint,
            scanned.country.clone(),
            scanned.direction,
            format,
        );

        if scanned.is_synthetic {
            file.mark_test();
            self.files.insert(&file).await?;
            return Ok(RunCounters { skipped: 1, ..Default::default() });
        }

        let rows = match self.row_source.read_rows(&scanned.path).await {
            Ok(rows) => rows,
            Err(err) => {
                file.mark_failed();
                self.files.insert(&file).await?;
                return Err(err);
            }
        };

        self.files.insert(&file).await?;
        file.set_row_count(rows.len() as i64);

        let mut created = 0u64;
        for (chunk_index, chunk) in rows.chunks(cmd.chunk_size.rows().max(1)).enumerate() {
            let raw_rows: Vec<RawRow> = chunk
                .iter()
                .enumerate()
                .map(|(offset, fields)| RawRow::new(file.id(), (chunk_index * cmd.chunk_size.rows() + offset) as i64, fields.clone()))
                .collect();
            created += self.stage_runner.run_chunk(cancel, self.raw_rows.insert_batch(&raw_rows)).await?;
        }

        file.mark_ingested();
        self.files.save(&file).await?;

        Ok(RunCounters { processed: rows.len() as u64, created, ..Default::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::repositories::PipelineRunRepository;
    use ledger_domain::value_objects::{ChunkSize, FieldBag, FieldValue, WorkerCount};
    use std::collections::HashMap;

    struct FixedRows(Vec<FieldBag>);

    #[async_trait::async_trait]
    impl RowSource for FixedRows {
        async fn read_rows(&self, _path: &Path) -> Result<Vec<FieldBag>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct FakeFiles {
        by_fingerprint: Mutex<HashMap<String, FileRegistry>>,
    }

    #[async_trait::async_trait]
    impl FileRegistryRepository for FakeFiles {
        async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<FileRegistry>, PipelineError> {
            Ok(self.by_fingerprint.lock().unwrap().get(fingerprint).cloned())
        }
        async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<FileRegistry>, PipelineError> {
            Ok(self.by_fingerprint.lock().unwrap().values().find(|f| f.id() == id).cloned())
        }
        async fn insert(&self, file: &FileRegistry) -> Result<(), PipelineError> {
            self.by_fingerprint.lock().unwrap().insert(file.fingerprint().to_string(), file.clone());
            Ok(())
        }
        async fn save(&self, file: &FileRegistry) -> Result<(), PipelineError> {
            self.by_fingerprint.lock().unwrap().insert(file.fingerprint().to_string(), file.clone());
            Ok(())
        }
        async fn try_claim_stage(&self, _file_id: uuid::Uuid, _stage: &str) -> Result<bool, PipelineError> {
            Ok(true)
        }
        async fn complete_stage(&self, _file_id: uuid::Uuid, _stage: &str) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn abandon_stage(&self, _file_id: uuid::Uuid, _stage: &str) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn find_pending_for_stage(&self, _stage: &str, _limit: usize) -> Result<Vec<FileRegistry>, PipelineError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeRawRows {
        inserted: Mutex<Vec<RawRow>>,
    }

    #[async_trait::async_trait]
    impl RawRowRepository for FakeRawRows {
        async fn insert_batch(&self, rows: &[RawRow]) -> Result<u64, PipelineError> {
            self.inserted.lock().unwrap().extend_from_slice(rows);
            Ok(rows.len() as u64)
        }
        async fn count_for_file(&self, file_id: uuid::Uuid) -> Result<u64, PipelineError> {
            Ok(self.inserted.lock().unwrap().iter().filter(|r| r.file_id() == file_id).count() as u64)
        }
        async fn delete_for_file(&self, _file_id: uuid::Uuid) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn find_unstandardized_chunk(&self, _file_id: uuid::Uuid, _chunk_size: usize) -> Result<Vec<RawRow>, PipelineError> {
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

    fn mapping_registry_with_full() -> MappingRegistry {
        use crate::infrastructure::adapters::mapping_registry::{mapping_key, MappingLifecycle, MappingSpec, ValueType};
        let mut specs = HashMap::new();
        specs.insert(
            mapping_key(&CountryCode::normalize("KENYA"), Direction::Export, SourceFormat::Full),
            MappingSpec {
                lifecycle: MappingLifecycle::Live,
                column_mapping: HashMap::new(),
                weight_unit: "KG".to_string(),
                value_currency: "USD".to_string(),
                value_type: ValueType::Customs,
                defaults: HashMap::new(),
                date_formats: vec!["%Y-%m-%d".to_string()],
                header_row_index: None,
            },
        );
        MappingRegistry::from_specs(specs)
    }

    fn one_row() -> FieldBag {
        let mut bag = FieldBag::new();
        bag.insert("hs_code", FieldValue::Text("690721".to_string()));
        bag
    }

    #[tokio::test]
    async fn ingests_rows_and_marks_file_ingested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("KENYA").join("EXPORT").join("2025").join("06");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("shipments.csv"), "hs6\n690721\n").unwrap();

        let files = Arc::new(FakeFiles::default());
        let raw_rows = Arc::new(FakeRawRows::default());
        let runs = Arc::new(FakeRuns);
        let use_case = IngestUseCase::new(
            files.clone(),
            raw_rows.clone(),
            Arc::new(mapping_registry_with_full()),
            Arc::new(FixedRows(vec![one_row()])),
            Arc::new(StageRunner::new(runs)),
            WorkerPool::new(WorkerCount::new(4).unwrap()),
        );

        let cmd = IngestCommand { chunk_size: ChunkSize::new(1000).unwrap() };
        let run = use_case.execute(dir.path(), &cmd, &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().created, 1);
        assert_eq!(raw_rows.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reingesting_identical_content_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("KENYA").join("EXPORT").join("2025").join("06");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("shipments.csv"), "hs6\n690721\n").unwrap();

        let files = Arc::new(FakeFiles::default());
        let raw_rows = Arc::new(FakeRawRows::default());
        let runs = Arc::new(FakeRuns);
        let use_case = IngestUseCase::new(
            files.clone(),
            raw_rows.clone(),
            Arc::new(mapping_registry_with_full()),
            Arc::new(FixedRows(vec![one_row()])),
            Arc::new(StageRunner::new(runs)),
            WorkerPool::new(WorkerCount::new(4).unwrap()),
        );

        let cmd = IngestCommand { chunk_size: ChunkSize::new(1000).unwrap() };
        use_case.execute(dir.path(), &cmd, &CancellationToken::new()).await.unwrap();
        let second = use_case.execute(dir.path(), &cmd, &CancellationToken::new()).await.unwrap();
        assert_eq!(second.counters().skipped, 1);
        assert_eq!(second.counters().created, 0);
    }

    #[tokio::test]
    async fn synthetic_files_are_registered_test_and_not_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("KENYA").join("EXPORT").join("2025").join("06");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("ke_export_202506.csv"), "hs6\n690721\n").unwrap();

        let files = Arc::new(FakeFiles::default());
        let raw_rows = Arc::new(FakeRawRows::default());
        let runs = Arc::new(FakeRuns);
        let use_case = IngestUseCase::new(
            files.clone(),
            raw_rows.clone(),
            Arc::new(mapping_registry_with_full()),
            Arc::new(FixedRows(vec![one_row()])),
            Arc::new(StageRunner::new(runs)),
            WorkerPool::new(WorkerCount::new(4).unwrap()),
        );

        let cmd = IngestCommand { chunk_size: ChunkSize::new(1000).unwrap() };
        let run = use_case.execute(dir.path(), &cmd, &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().skipped, 1);
        assert!(raw_rows.inserted.lock().unwrap().is_empty());
    }
}
