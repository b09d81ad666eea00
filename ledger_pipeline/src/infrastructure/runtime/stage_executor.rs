//! # Stage Runner
//!
//! Every S1-S8 use case hands its chunk-processing closure to
//! [`StageRunner::run`] instead of managing its own `PipelineRun` bookkeeping,
//! retry loop, and timeout (spec.md §9: "consolidate ad-hoc retry loops into
//! one generic policy"). A run's outcome is always persisted, even on
//! cancellation or timeout, so the control-tower view (spec.md §4.8) never
//! shows a stage stuck `RUNNING` after the process that owned it died.

use ledger_domain::entities::{PipelineRun, RunCounters};
use ledger_domain::repositories::PipelineRunRepository;
use ledger_domain::services::retry::{is_retryable, RetryPolicy};
use ledger_domain::PipelineError;
use serde_json::Value as Json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Per-file timeout (spec.md §5): a single file's worth of chunk processing
/// must complete within this bound or the stage run is marked failed.
pub const FILE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Per-chunk timeout (spec.md §5): bounds any single bounded-size chunk of
/// work (a batch insert, a standardization pass over one `ChunkSize` worth
/// of rows) so one stuck chunk cannot wedge the whole file.
pub const CHUNK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// What a stage's unit of work reports back to the runner.
pub struct StageOutcome {
    pub counters: RunCounters,
}

impl StageOutcome {
    pub fn new(counters: RunCounters) -> Self {
        Self { counters }
    }
}

/// Wraps a stage's chunk-processing work in `PipelineRun` lifecycle
/// tracking, cancellation, retry, and timeout enforcement.
pub struct StageRunner {
    runs: Arc<dyn PipelineRunRepository>,
    retry_policy: RetryPolicy,
}

impl StageRunner {
    pub fn new(runs: Arc<dyn PipelineRunRepository>) -> Self {
        Self { runs, retry_policy: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Runs one chunk of `stage_name`'s work under `FILE_TIMEOUT`, retrying
    /// transient failures per `RetryPolicy` and honoring `cancel` between
    /// attempts. Persists a `PipelineRun` row regardless of outcome.
    pub async fn run<F, Fut>(
        &self,
        stage_name: &str,
        filters: Json,
        cancel: &CancellationToken,
        mut work: F,
    ) -> Result<PipelineRun, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<StageOutcome, PipelineError>>,
    {
        let mut run = PipelineRun::start(stage_name, filters);
        self.runs.insert(&run).await?;

        if cancel.is_cancelled() {
            run.finish_cancelled();
            self.runs.update(&run).await?;
            return Ok(run);
        }

        let mut attempt = 0u32;
        let outcome = loop {
            attempt += 1;
            let attempted = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    run.finish_cancelled();
                    self.runs.update(&run).await?;
                    return Ok(run);
                }
                result = tokio::time::timeout(FILE_TIMEOUT, work()) => result,
            };

            match attempted {
                Ok(Ok(outcome)) => break Ok(outcome),
                Ok(Err(err)) if is_retryable(&err) && !self.retry_policy.exhausted(attempt) => {
                    warn!(stage = stage_name, attempt, error = %err, "retrying transient stage failure");
                    tokio::time::sleep(self.retry_policy.delay_for(attempt)).await;
                    continue;
                }
                Ok(Err(err)) => break Err(err),
                Err(_) => break Err(PipelineError::TimeoutError(FILE_TIMEOUT)),
            }
        };

        match outcome {
            Ok(outcome) => {
                run.record(outcome.counters);
                run.finish_success();
                info!(stage = stage_name, run_id = %run.id(), counters = ?run.counters(), "stage run finished");
            }
            Err(err) => {
                run.finish_failed(err.to_string());
                warn!(stage = stage_name, run_id = %run.id(), error = %err, "stage run failed");
            }
        }

        self.runs.update(&run).await?;
        Ok(run)
    }

    /// Runs `work` under `CHUNK_TIMEOUT` without touching `PipelineRun`
    /// bookkeeping; used inside a stage's per-chunk loop where the outer
    /// `run()` call owns the file-level run record.
    pub async fn run_chunk<Fut, T>(&self, cancel: &CancellationToken, work: Fut) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::cancelled()),
            result = tokio::time::timeout(CHUNK_TIMEOUT, work) => {
                result.map_err(|_| PipelineError::TimeoutError(CHUNK_TIMEOUT))?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeRunRepository {
        saved: Mutex<Vec<PipelineRun>>,
    }

    #[async_trait]
    impl PipelineRunRepository for FakeRunRepository {
        async fn insert(&self, run: &PipelineRun) -> Result<(), PipelineError> {
            self.saved.lock().unwrap().push(run.clone());
            Ok(())
        }
        async fn update(&self, run: &PipelineRun) -> Result<(), PipelineError> {
            self.saved.lock().unwrap().push(run.clone());
            Ok(())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(None)
        }
        async fn find_running(&self, _stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn successful_run_records_counters_and_succeeds() {
        let repo = Arc::new(FakeRunRepository::default());
        let runner = StageRunner::new(repo.clone());
        let cancel = CancellationToken::new();

        let run = runner
            .run("standardize", serde_json::json!({}), &cancel, || async {
                Ok(StageOutcome::new(RunCounters { processed: 5, created: 5, ..Default::default() }))
            })
            .await
            .unwrap();

        assert_eq!(run.counters().processed, 5);
        assert!(run.status().is_terminal());
    }

    #[tokio::test]
    async fn cancellation_before_work_yields_partial() {
        let repo = Arc::new(FakeRunRepository::default());
        let runner = StageRunner::new(repo);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let run = runner
            .run("ingest", serde_json::json!({}), &cancel, || async {
                Ok(StageOutcome::new(RunCounters::default()))
            })
            .await
            .unwrap();

        assert_eq!(run.error_message(), Some("cancellation requested"));
    }

    #[tokio::test]
    async fn transient_failure_retries_then_succeeds() {
        let repo = Arc::new(FakeRunRepository::default());
        let runner = StageRunner::new(repo).with_retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            multiplier: 1.0,
        });
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let run = runner
            .run("resolve_identity", serde_json::json!({}), &cancel, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(PipelineError::TransientDbError("connection reset".into()))
                    } else {
                        Ok(StageOutcome::new(RunCounters { processed: 1, ..Default::default() }))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(run.counters().processed, 1);
    }
}
