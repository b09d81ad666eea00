// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Run Entity
//!
//! One record per stage invocation (spec.md §3, §4.8). This is the single
//! contract the (out-of-scope) external API consumes to render a control
//! tower view, and the only mechanism by which an operator can tell
//! whether a given stage invocation succeeded.

use crate::value_objects::RunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

/// Row/entity counters accumulated across a stage run. Every stage
/// increments exactly these four buckets; "processed" is the total rows
/// looked at and is always >= created + updated + skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl RunCounters {
    pub fn merge(&mut self, other: RunCounters) {
        self.processed += other.processed;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    id: Uuid,
    stage_name: String,
    filters: Json,
    counters: RunCounters,
    status: RunStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
}

impl PipelineRun {
    pub fn start(stage_name: impl Into<String>, filters: Json) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage_name: stage_name.into(),
            filters,
            counters: RunCounters::default(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }

    /// Reconstructs a run from persisted columns (infrastructure only).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        stage_name: String,
        filters: Json,
        counters: RunCounters,
        status: RunStatus,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        error_message: Option<String>,
    ) -> Self {
        Self { id, stage_name, filters, counters, status, started_at, completed_at, error_message }
    }

    pub fn filters(&self) -> &Json {
        &self.filters
    }
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }
    pub fn counters(&self) -> RunCounters {
        self.counters
    }
    pub fn status(&self) -> RunStatus {
        self.status
    }
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn record(&mut self, counters: RunCounters) {
        self.counters.merge(counters);
    }

    /// Finalizes the run. `Partial` is chosen automatically when
    /// `counters.failed > 0` but the caller still reports success overall
    /// (spec.md §4.8: "PARTIAL if row-level failures occurred but the
    /// stage completed").
    pub fn finish_success(&mut self) {
        self.status = if self.counters.failed > 0 { RunStatus::Partial } else { RunStatus::Success };
        self.completed_at = Some(Utc::now());
    }

    pub fn finish_failed(&mut self, error_message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error_message = Some(error_message.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn finish_cancelled(&mut self) {
        self.status = RunStatus::Partial;
        self.error_message = Some("cancellation requested".to_string());
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_with_no_failures_is_success() {
        let mut run = PipelineRun::start("standardize", json!({}));
        run.record(RunCounters { processed: 10, created: 10, ..Default::default() });
        run.finish_success();
        assert_eq!(run.status(), RunStatus::Success);
    }

    #[test]
    fn success_with_row_failures_degrades_to_partial() {
        let mut run = PipelineRun::start("standardize", json!({}));
        run.record(RunCounters { processed: 10, created: 8, failed: 2, ..Default::default() });
        run.finish_success();
        assert_eq!(run.status(), RunStatus::Partial);
    }

    #[test]
    fn cancellation_yields_partial() {
        let mut run = PipelineRun::start("ingest", json!({}));
        run.finish_cancelled();
        assert_eq!(run.status(), RunStatus::Partial);
    }
}
