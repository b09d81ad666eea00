// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S6 — Build Profiles
//!
//! Recomputes the buyer/exporter profile, price-corridor, and lane-stats
//! aggregates from scratch over every fact touched since the job's
//! watermark (spec.md §4.6). Each `refresh_*` call is itself one
//! idempotent SQL statement; this use case's job is bounding the window
//! and advancing the watermark only on success.

use crate::application::commands::BuildProfilesCommand;
use crate::infrastructure::runtime::{StageOutcome, StageRunner};
use ledger_domain::entities::{RunCounters, Watermark};
use ledger_domain::repositories::{AnalyticsRepository, WatermarkRepository};
use ledger_domain::value_objects::RunStatus;
use ledger_domain::PipelineError;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const STAGE: &str = "build_profiles";
const JOB_NAME: &str = "build_profiles";

pub struct BuildProfilesUseCase {
    analytics: Arc<dyn AnalyticsRepository>,
    watermarks: Arc<dyn WatermarkRepository>,
    stage_runner: Arc<StageRunner>,
}

impl BuildProfilesUseCase {
    pub fn new(analytics: Arc<dyn AnalyticsRepository>, watermarks: Arc<dyn WatermarkRepository>, stage_runner: Arc<StageRunner>) -> Self {
        Self { analytics, watermarks, stage_runner }
    }

    pub async fn execute(
        &self,
        cmd: &BuildProfilesCommand,
        cancel: &CancellationToken,
    ) -> Result<ledger_domain::entities::PipelineRun, PipelineError> {
        let watermark = self.watermarks.get(JOB_NAME).await?;
        let lower_bound = watermark.lower_bound(cmd.lookback_days);
        let filters = json!({ "lookback_days": cmd.lookback_days, "lower_bound": lower_bound });
        let run_started_at = chrono::Utc::now();

        let result = self
            .stage_runner
            .run(STAGE, filters, cancel, || async {
                let mut counters = RunCounters::default();
                let buyer = self.stage_runner.run_chunk(cancel, self.analytics.refresh_buyer_profiles(lower_bound)).await?;
                let exporter = self.stage_runner.run_chunk(cancel, self.analytics.refresh_exporter_profiles(lower_bound)).await?;
                let corridors = self.stage_runner.run_chunk(cancel, self.analytics.refresh_price_corridors(lower_bound)).await?;
                let lanes = self.stage_runner.run_chunk(cancel, self.analytics.refresh_lane_stats(lower_bound)).await?;
                counters.merge(RunCounters { processed: buyer + exporter + corridors + lanes, updated: buyer + exporter + corridors + lanes, ..Default::default() });
                Ok(StageOutcome::new(counters))
            })
            .await?;

        // spec.md §4.6: failures leave the watermark unchanged.
        if matches!(result.status(), RunStatus::Success) {
            let mut advanced = Watermark::new(JOB_NAME, watermark.consumed_through());
            advanced.advance(run_started_at);
            self.watermarks.advance(&advanced).await?;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::entities::PipelineRun;
    use ledger_domain::repositories::{BuyerRiskInput, PipelineRunRepository, ShipmentRiskInput};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAnalytics {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait::async_trait]
    impl AnalyticsRepository for FakeAnalytics {
        async fn refresh_buyer_profiles(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            self.calls.lock().unwrap().push("buyer");
            Ok(3)
        }
        async fn refresh_exporter_profiles(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            self.calls.lock().unwrap().push("exporter");
            Ok(2)
        }
        async fn refresh_price_corridors(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            self.calls.lock().unwrap().push("corridors");
            Ok(5)
        }
        async fn refresh_lane_stats(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            self.calls.lock().unwrap().push("lanes");
            Ok(1)
        }
        async fn find_shipment_risk_inputs(&self, _since: chrono::DateTime<chrono::Utc>, _limit: usize) -> Result<Vec<ShipmentRiskInput>, PipelineError> {
            Ok(vec![])
        }
        async fn find_buyer_risk_inputs(&self, _since: chrono::DateTime<chrono::Utc>, _limit: usize) -> Result<Vec<BuyerRiskInput>, PipelineError> {
            Ok(vec![])
        }
        async fn refresh_serving_summary(&self) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeWatermarks {
        stored: Mutex<Option<Watermark>>,
    }

    #[async_trait::async_trait]
    impl WatermarkRepository for FakeWatermarks {
        async fn get(&self, job_name: &'static str) -> Result<Watermark, PipelineError> {
            Ok(self.stored.lock().unwrap().clone().unwrap_or(Watermark::new(job_name, None)))
        }
        async fn advance(&self, watermark: &Watermark) -> Result<(), PipelineError> {
            *self.stored.lock().unwrap() = Some(*watermark);
            Ok(())
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

    #[tokio::test]
    async fn refreshes_all_four_grains_and_advances_watermark() {
        let analytics = Arc::new(FakeAnalytics::default());
        let watermarks = Arc::new(FakeWatermarks::default());
        let runs = Arc::new(FakeRuns);
        let use_case = BuildProfilesUseCase::new(analytics.clone(), watermarks.clone(), Arc::new(StageRunner::new(runs)));

        let run = use_case.execute(&BuildProfilesCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().updated, 11);
        assert_eq!(analytics.calls.lock().unwrap().len(), 4);
        assert!(watermarks.stored.lock().unwrap().unwrap().consumed_through().is_some());
    }

    #[tokio::test]
    async fn never_consumed_watermark_bounds_from_epoch() {
        let analytics = Arc::new(FakeAnalytics::default());
        let watermarks = Arc::new(FakeWatermarks::default());
        let runs = Arc::new(FakeRuns);
        let use_case = BuildProfilesUseCase::new(analytics, watermarks.clone(), Arc::new(StageRunner::new(runs)));

        use_case.execute(&BuildProfilesCommand { lookback_days: 7 }, &CancellationToken::new()).await.unwrap();
        // Watermark was None going in, so the run still succeeds and advances forward.
        assert!(watermarks.stored.lock().unwrap().unwrap().consumed_through().unwrap() <= chrono::Utc::now());
    }
}
