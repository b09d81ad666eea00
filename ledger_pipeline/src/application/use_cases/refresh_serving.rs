// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S8 — Refresh Serving
//!
//! Rebuilds the materialized serving summary the (out-of-scope)
//! external API reads from (spec.md §2, §4.8). The cheapest stage in the
//! chain: one aggregate recompute, no per-row work of its own to count.

use crate::application::commands::RefreshServingCommand;
use crate::infrastructure::runtime::{StageOutcome, StageRunner};
use ledger_domain::entities::RunCounters;
use ledger_domain::repositories::AnalyticsRepository;
use ledger_domain::PipelineError;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const STAGE: &str = "refresh_serving";

pub struct RefreshServingUseCase {
    analytics: Arc<dyn AnalyticsRepository>,
    stage_runner: Arc<StageRunner>,
}

impl RefreshServingUseCase {
    pub fn new(analytics: Arc<dyn AnalyticsRepository>, stage_runner: Arc<StageRunner>) -> Self {
        Self { analytics, stage_runner }
    }

    pub async fn execute(
        &self,
        _cmd: &RefreshServingCommand,
        cancel: &CancellationToken,
    ) -> Result<ledger_domain::entities::PipelineRun, PipelineError> {
        self.stage_runner
            .run(STAGE, json!({}), cancel, || async {
                self.stage_runner.run_chunk(cancel, self.analytics.refresh_serving_summary()).await?;
                Ok(StageOutcome::new(RunCounters { processed: 1, updated: 1, ..Default::default() }))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::entities::PipelineRun;
    use ledger_domain::repositories::{BuyerRiskInput, PipelineRunRepository, ShipmentRiskInput};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeAnalytics {
        refreshed: Mutex<u32>,
    }

    #[async_trait::async_trait]
    impl AnalyticsRepository for FakeAnalytics {
        async fn refresh_buyer_profiles(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn refresh_exporter_profiles(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn refresh_price_corridors(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn refresh_lane_stats(&self, _lower_bound: chrono::DateTime<chrono::Utc>) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn find_shipment_risk_inputs(&self, _since: chrono::DateTime<chrono::Utc>, _limit: usize) -> Result<Vec<ShipmentRiskInput>, PipelineError> {
            Ok(vec![])
        }
        async fn find_buyer_risk_inputs(&self, _since: chrono::DateTime<chrono::Utc>, _limit: usize) -> Result<Vec<BuyerRiskInput>, PipelineError> {
            Ok(vec![])
        }
        async fn refresh_serving_summary(&self) -> Result<(), PipelineError> {
            *self.refreshed.lock().unwrap() += 1;
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
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(None)
        }
        async fn find_running(&self, _stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn refreshes_serving_summary_exactly_once() {
        let analytics = Arc::new(FakeAnalytics::default());
        let runs = Arc::new(FakeRuns);
        let use_case = RefreshServingUseCase::new(analytics.clone(), Arc::new(StageRunner::new(runs)));

        let run = use_case.execute(&RefreshServingCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().updated, 1);
        assert_eq!(*analytics.refreshed.lock().unwrap(), 1);
    }
}
