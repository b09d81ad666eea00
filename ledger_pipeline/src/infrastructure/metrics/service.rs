// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! One counter per stage's unit of work: files ingested, rows
//! standardized, identities resolved, facts loaded, mirror matches
//! accepted/rejected, risk opinions written. Thread-safe, low overhead,
//! registered under the `ledger_pipeline` namespace.

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

use ledger_domain::PipelineError;

#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    pub files_ingested_total: IntCounterVec,
    pub rows_standardized_total: IntCounter,
    pub identities_resolved_total: IntCounter,
    pub facts_loaded_total: IntCounter,
    pub mirror_matches_accepted_total: IntCounter,
    pub mirror_matches_rejected_total: IntCounter,
    pub risk_opinions_written_total: IntCounter,
    pub stage_errors_total: IntCounterVec,
}

impl MetricsService {
    pub fn new() -> Result<Self, PipelineError> {
        let registry = Registry::new();

        let files_ingested_total = IntCounterVec::new(
            Opts::new("files_ingested_total", "Files ingested by S1, labeled by outcome").namespace("ledger_pipeline"),
            &["status"],
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating files_ingested_total: {e}")))?;

        let rows_standardized_total = IntCounter::with_opts(
            Opts::new("rows_standardized_total", "Rows written by S2").namespace("ledger_pipeline"),
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating rows_standardized_total: {e}")))?;

        let identities_resolved_total = IntCounter::with_opts(
            Opts::new("identities_resolved_total", "Rows assigned a buyer/supplier uuid by S3")
                .namespace("ledger_pipeline"),
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating identities_resolved_total: {e}")))?;

        let facts_loaded_total = IntCounter::with_opts(
            Opts::new("facts_loaded_total", "Ledger facts inserted by S4").namespace("ledger_pipeline"),
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating facts_loaded_total: {e}")))?;

        let mirror_matches_accepted_total = IntCounter::with_opts(
            Opts::new("mirror_matches_accepted_total", "Mirror matches accepted by S5").namespace("ledger_pipeline"),
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating mirror_matches_accepted_total: {e}")))?;

        let mirror_matches_rejected_total = IntCounter::with_opts(
            Opts::new(
                "mirror_matches_rejected_total",
                "Export rows with no accepted mirror match (no candidates, low score, or ambiguous)",
            )
            .namespace("ledger_pipeline"),
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating mirror_matches_rejected_total: {e}")))?;

        let risk_opinions_written_total = IntCounter::with_opts(
            Opts::new("risk_opinions_written_total", "Risk opinions upserted by S7").namespace("ledger_pipeline"),
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating risk_opinions_written_total: {e}")))?;

        let stage_errors_total = IntCounterVec::new(
            Opts::new("stage_errors_total", "Errors encountered, labeled by stage").namespace("ledger_pipeline"),
            &["stage"],
        )
        .map_err(|e| PipelineError::metrics_error(format!("creating stage_errors_total: {e}")))?;

        registry
            .register(Box::new(files_ingested_total.clone()))
            .and_then(|_| registry.register(Box::new(rows_standardized_total.clone())))
            .and_then(|_| registry.register(Box::new(identities_resolved_total.clone())))
            .and_then(|_| registry.register(Box::new(facts_loaded_total.clone())))
            .and_then(|_| registry.register(Box::new(mirror_matches_accepted_total.clone())))
            .and_then(|_| registry.register(Box::new(mirror_matches_rejected_total.clone())))
            .and_then(|_| registry.register(Box::new(risk_opinions_written_total.clone())))
            .and_then(|_| registry.register(Box::new(stage_errors_total.clone())))
            .map_err(|e| PipelineError::metrics_error(format!("registering metrics: {e}")))?;

        Ok(Self {
            registry: Arc::new(registry),
            files_ingested_total,
            rows_standardized_total,
            identities_resolved_total,
            facts_loaded_total,
            mirror_matches_accepted_total,
            mirror_matches_rejected_total,
            risk_opinions_written_total,
            stage_errors_total,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn record_stage_error(&self, stage: &str) {
        self.stage_errors_total.with_label_values(&[stage]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::proto::MetricFamily;

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
        families.iter().find(|f| f.name() == name).expect("metric registered")
    }

    #[test]
    fn counters_are_registered_and_incrementable() {
        let service = MetricsService::new().unwrap();
        service.files_ingested_total.with_label_values(&["INGESTED"]).inc();
        service.rows_standardized_total.inc_by(5);
        service.record_stage_error("mirror_match");

        let families = service.registry().gather();
        assert_eq!(family(&families, "ledger_pipeline_rows_standardized_total").get_metric()[0].get_counter().get_value() as u64, 5);
        assert_eq!(
            family(&families, "ledger_pipeline_stage_errors_total").get_metric()[0]
                .get_counter()
                .get_value() as u64,
            1
        );
    }
}
