// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S7 — Risk Score
//!
//! Applies the pure rule set in [`ledger_domain::services::risk_rules`]
//! to pre-aggregated shipment and buyer inputs, folds whichever rules
//! fired into a composite [`RiskOpinion`] via
//! [`RiskOpinion::from_reasons`], and upserts (spec.md §4.7). A shipment
//! or buyer with no rule firing has no current opinion and is left
//! alone rather than upserted with a synthetic zero score.

use crate::application::commands::RiskScoreCommand;
use crate::infrastructure::runtime::{StageOutcome, StageRunner};
use ledger_domain::entities::{RiskEntityType, RiskOpinion, RunCounters, Watermark};
use ledger_domain::repositories::{AnalyticsRepository, BuyerRiskInput, RiskOpinionRepository, ShipmentRiskInput, WatermarkRepository};
use ledger_domain::services::risk_rules::{free_email, ghost_entity, over_invoice, under_invoice, volume_spike, weird_lane};
use ledger_domain::value_objects::{RunStatus, ScopeKey};
use ledger_domain::PipelineError;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const STAGE: &str = "risk_score";
const JOB_NAME: &str = "risk_score";

pub struct RiskScoreUseCase {
    analytics: Arc<dyn AnalyticsRepository>,
    risk_opinions: Arc<dyn RiskOpinionRepository>,
    watermarks: Arc<dyn WatermarkRepository>,
    stage_runner: Arc<StageRunner>,
}

impl RiskScoreUseCase {
    pub fn new(
        analytics: Arc<dyn AnalyticsRepository>,
        risk_opinions: Arc<dyn RiskOpinionRepository>,
        watermarks: Arc<dyn WatermarkRepository>,
        stage_runner: Arc<StageRunner>,
    ) -> Self {
        Self { analytics, risk_opinions, watermarks, stage_runner }
    }

    pub async fn execute(
        &self,
        cmd: &RiskScoreCommand,
        cancel: &CancellationToken,
    ) -> Result<ledger_domain::entities::PipelineRun, PipelineError> {
        let watermark = self.watermarks.get(JOB_NAME).await?;
        let lower_bound = watermark.lower_bound(cmd.lookback_days);
        let filters = json!({ "lookback_days": cmd.lookback_days, "engine_version": cmd.engine_version, "batch_size": cmd.batch_size });
        let run_started_at = chrono::Utc::now();

        let result = self
            .stage_runner
            .run(STAGE, filters, cancel, || async {
                let mut counters = RunCounters::default();

                let shipments = self
                    .stage_runner
                    .run_chunk(cancel, self.analytics.find_shipment_risk_inputs(lower_bound, cmd.batch_size))
                    .await?;
                for input in &shipments {
                    counters.processed += 1;
                    if let Some(opinion) = shipment_opinion(input, &cmd.engine_version) {
                        self.stage_runner.run_chunk(cancel, self.risk_opinions.upsert(&opinion)).await?;
                        counters.updated += 1;
                    } else {
                        counters.skipped += 1;
                    }
                }

                let buyers = self
                    .stage_runner
                    .run_chunk(cancel, self.analytics.find_buyer_risk_inputs(lower_bound, cmd.batch_size))
                    .await?;
                for input in &buyers {
                    counters.processed += 1;
                    if let Some(opinion) = buyer_opinion(input, &cmd.engine_version) {
                        self.stage_runner.run_chunk(cancel, self.risk_opinions.upsert(&opinion)).await?;
                        counters.updated += 1;
                    } else {
                        counters.skipped += 1;
                    }
                }

                Ok(StageOutcome::new(counters))
            })
            .await?;

        if matches!(result.status(), RunStatus::Success) {
            let mut advanced = Watermark::new(JOB_NAME, watermark.consumed_through());
            advanced.advance(run_started_at);
            self.watermarks.advance(&advanced).await?;
        }

        Ok(result)
    }
}

fn shipment_opinion(input: &ShipmentRiskInput, engine_version: &str) -> Option<RiskOpinion> {
    let mut reasons = Vec::new();
    if let (Some(price), Some(median), Some(std)) = (input.price_usd_per_kg, input.corridor_median, input.corridor_std) {
        reasons.extend(under_invoice(price, median, std));
        reasons.extend(over_invoice(price, median, std));
    }
    reasons.extend(weird_lane(input.lane_shipment_count, input.hs6_global_count));

    RiskOpinion::from_reasons(RiskEntityType::Shipment, input.transaction_id, ScopeKey::global(), engine_version, reasons, 1.0)
}

fn buyer_opinion(input: &BuyerRiskInput, engine_version: &str) -> Option<RiskOpinion> {
    let mut reasons = Vec::new();
    reasons.extend(ghost_entity(input.total_value_usd, input.has_website_signal));
    reasons.extend(volume_spike(input.monthly_count_z_score, input.month_over_month_pct_change));
    reasons.extend(free_email(input.is_high_volume, &input.contact_email_domains));

    RiskOpinion::from_reasons(RiskEntityType::Buyer, input.buyer_uuid, ScopeKey::global(), engine_version, reasons, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::entities::PipelineRun;
    use ledger_domain::repositories::PipelineRunRepository;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeAnalytics {
        shipments: Mutex<Vec<ShipmentRiskInput>>,
        buyers: Mutex<Vec<BuyerRiskInput>>,
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
            Ok(self.shipments.lock().unwrap().clone())
        }
        async fn find_buyer_risk_inputs(&self, _since: chrono::DateTime<chrono::Utc>, _limit: usize) -> Result<Vec<BuyerRiskInput>, PipelineError> {
            Ok(self.buyers.lock().unwrap().clone())
        }
        async fn refresh_serving_summary(&self) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRiskOpinions {
        upserted: Mutex<Vec<RiskOpinion>>,
    }

    #[async_trait::async_trait]
    impl RiskOpinionRepository for FakeRiskOpinions {
        async fn upsert(&self, opinion: &RiskOpinion) -> Result<(), PipelineError> {
            self.upserted.lock().unwrap().push(opinion.clone());
            Ok(())
        }
        async fn find_current(&self, _entity_type: RiskEntityType, _entity_id: Uuid, _scope_key: &ScopeKey) -> Result<Option<RiskOpinion>, PipelineError> {
            Ok(None)
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
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(None)
        }
        async fn find_running(&self, _stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn scenario_e_under_invoice_shipment_scores_critical() {
        let analytics = Arc::new(FakeAnalytics::default());
        analytics.shipments.lock().unwrap().push(ShipmentRiskInput {
            transaction_id: Uuid::new_v4(),
            price_usd_per_kg: Some(0.57),
            corridor_median: Some(7.0),
            corridor_std: Some(1.5),
            lane_shipment_count: 200,
            hs6_global_count: 500,
        });
        let risk_opinions = Arc::new(FakeRiskOpinions::default());
        let watermarks = Arc::new(FakeWatermarks::default());
        let runs = Arc::new(FakeRuns);
        let use_case = RiskScoreUseCase::new(analytics, risk_opinions.clone(), watermarks, Arc::new(StageRunner::new(runs)));

        let run = use_case.execute(&RiskScoreCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().updated, 1);
        let opinions = risk_opinions.upserted.lock().unwrap();
        assert_eq!(opinions.len(), 1);
        assert_eq!(opinions[0].main_reason_code(), "UNDER_INVOICE");
    }

    #[tokio::test]
    async fn shipment_with_no_firing_rule_is_skipped_not_upserted() {
        let analytics = Arc::new(FakeAnalytics::default());
        analytics.shipments.lock().unwrap().push(ShipmentRiskInput {
            transaction_id: Uuid::new_v4(),
            price_usd_per_kg: Some(7.0),
            corridor_median: Some(7.0),
            corridor_std: Some(1.5),
            lane_shipment_count: 200,
            hs6_global_count: 500,
        });
        let risk_opinions = Arc::new(FakeRiskOpinions::default());
        let watermarks = Arc::new(FakeWatermarks::default());
        let runs = Arc::new(FakeRuns);
        let use_case = RiskScoreUseCase::new(analytics, risk_opinions.clone(), watermarks, Arc::new(StageRunner::new(runs)));

        let run = use_case.execute(&RiskScoreCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().skipped, 1);
        assert!(risk_opinions.upserted.lock().unwrap().is_empty());
    }
}
