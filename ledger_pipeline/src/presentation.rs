// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Presentation Layer
//!
//! Translates a finished [`PipelineRun`] into the summary `ledger_bootstrap`
//! prints to the operator, independent of whether the CLI renders it as a
//! human-readable line or as JSON for scripting.

use ledger_domain::entities::PipelineRun;
use ledger_domain::value_objects::RunStatus;
use serde::Serialize;

/// Flattened view of a [`PipelineRun`], ready for `serde_json` or a table
/// renderer. Exists so `ledger_bootstrap` never depends on the domain
/// entity's internal field layout.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub stage: String,
    pub status: String,
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
    pub error_message: Option<String>,
}

impl From<&PipelineRun> for RunSummary {
    fn from(run: &PipelineRun) -> Self {
        let counters = run.counters();
        Self {
            run_id: run.id().to_string(),
            stage: run.stage_name().to_string(),
            status: status_label(run.status()).to_string(),
            processed: counters.processed,
            created: counters.created,
            updated: counters.updated,
            skipped: counters.skipped,
            failed: counters.failed,
            error_message: run.error_message().map(str::to_string),
        }
    }
}

impl RunSummary {
    /// One line for a human terminal: `standardize: SUCCESS (processed=120, created=80, ...)`.
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{}: {} (processed={}, created={}, updated={}, skipped={}, failed={})",
            self.stage, self.status, self.processed, self.created, self.updated, self.skipped, self.failed
        );
        if let Some(err) = &self.error_message {
            line.push_str(&format!(" — {err}"));
        }
        line
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "RUNNING",
        RunStatus::Success => "SUCCESS",
        RunStatus::Failed => "FAILED",
        RunStatus::Partial => "PARTIAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_reports_terminal_status_and_counters() {
        let mut run = PipelineRun::start("standardize", json!({}));
        run.record(ledger_domain::entities::RunCounters { processed: 10, created: 9, failed: 1, ..Default::default() });
        run.finish_success();

        let summary = RunSummary::from(&run);
        assert_eq!(summary.status, "PARTIAL");
        assert_eq!(summary.processed, 10);
        assert!(summary.to_line().contains("standardize: PARTIAL"));
    }
}
