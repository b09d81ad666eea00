// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Registry Entity
//!
//! One record per physical input file (spec.md §3). The registry row is
//! the coordination primitive for the whole pipeline: S1 creates it, every
//! later stage claims the file by writing its own `<stage>_started_at`
//! under a transaction that also checks `<stage>_completed_at IS NULL`
//! (spec.md §5) — a lightweight lease that needs no advisory lock.

use crate::value_objects::{CountryCode, Direction, FileStatus, SourceFormat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-stage lifecycle timestamps, keyed by stage name (`standardization`,
/// `identity`, `ledger`, `mirror`, ...). Modeled as a map rather than one
/// field pair per stage so new stages don't require a schema migration of
/// this struct's shape (the underlying table still has one column pair per
/// stage; this map is the in-memory projection of those columns).
pub type StageLifecycle = std::collections::BTreeMap<String, StageTimestamps>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimestamps {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRegistry {
    id: Uuid,
    name: String,
    path: String,
    /// Cryptographic content fingerprint; unique. Re-ingesting identical
    /// content is a no-op keyed on this field (spec.md §3, §4.1, §8a).
    fingerprint: String,
    reporting_country: CountryCode,
    direction: Direction,
    source_format: SourceFormat,
    row_count: i64,
    status: FileStatus,
    stages: StageLifecycle,
    created_at: DateTime<Utc>,
}

impl FileRegistry {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        fingerprint: impl Into<String>,
        reporting_country: CountryCode,
        direction: Direction,
        source_format: SourceFormat,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            fingerprint: fingerprint.into(),
            reporting_country,
            direction,
            source_format,
            row_count: 0,
            status: FileStatus::Pending,
            stages: StageLifecycle::new(),
            created_at: Utc::now(),
        }
    }

    /// Reconstructs a registry row from persisted columns. Used only by
    /// infrastructure repository implementations; application code always
    /// goes through [`FileRegistry::new`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        name: String,
        path: String,
        fingerprint: String,
        reporting_country: CountryCode,
        direction: Direction,
        source_format: SourceFormat,
        row_count: i64,
        status: FileStatus,
        stages: StageLifecycle,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            path,
            fingerprint,
            reporting_country,
            direction,
            source_format,
            row_count,
            status,
            stages,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn reporting_country(&self) -> &CountryCode {
        &self.reporting_country
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn source_format(&self) -> SourceFormat {
        self.source_format
    }

    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn set_row_count(&mut self, count: i64) {
        self.row_count = count;
    }

    pub fn mark_ingested(&mut self) {
        self.status = FileStatus::Ingested;
    }

    pub fn mark_failed(&mut self) {
        self.status = FileStatus::Failed;
    }

    pub fn mark_duplicate(&mut self) {
        self.status = FileStatus::Duplicate;
    }

    pub fn mark_test(&mut self) {
        self.status = FileStatus::Test;
    }

    /// Attempts to claim `stage` for processing. Succeeds (returns `true`)
    /// only if the stage has never completed for this file — the
    /// lightweight lease from spec.md §5. Callers persist the claim via a
    /// conditional `UPDATE ... WHERE completed_at IS NULL`; this method is
    /// the in-memory mirror of that check.
    pub fn try_start_stage(&mut self, stage: &str) -> bool {
        let entry = self.stages.entry(stage.to_string()).or_default();
        if entry.completed_at.is_some() {
            return false;
        }
        entry.started_at = Some(Utc::now());
        true
    }

    pub fn complete_stage(&mut self, stage: &str) {
        let entry = self.stages.entry(stage.to_string()).or_default();
        entry.completed_at = Some(Utc::now());
    }

    /// Clears the in-flight marker without setting completion — used on
    /// cancellation so the next run resumes the file (spec.md §5).
    pub fn abandon_stage(&mut self, stage: &str) {
        if let Some(entry) = self.stages.get_mut(stage) {
            entry.started_at = None;
        }
    }

    pub fn stage_timestamps(&self, stage: &str) -> StageTimestamps {
        self.stages.get(stage).copied().unwrap_or_default()
    }

    pub fn stage_completed(&self, stage: &str) -> bool {
        self.stages.get(stage).is_some_and(|t| t.completed_at.is_some())
    }

    pub fn stages(&self) -> &StageLifecycle {
        &self.stages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileRegistry {
        FileRegistry::new(
            "ke_export_202506.csv",
            "/data/KENYA/EXPORT/2025/06/ke_export_202506.csv",
            "abc123",
            CountryCode::normalize("KENYA"),
            Direction::Export,
            SourceFormat::Full,
        )
    }

    #[test]
    fn claims_stage_once() {
        let mut file = sample();
        assert!(file.try_start_stage("standardization"));
        file.complete_stage("standardization");
        assert!(!file.try_start_stage("standardization"));
    }

    #[test]
    fn abandoning_allows_retry_but_not_completion() {
        let mut file = sample();
        assert!(file.try_start_stage("ledger"));
        file.abandon_stage("ledger");
        assert!(file.try_start_stage("ledger"));
        assert!(!file.stage_completed("ledger"));
    }

    #[test]
    fn new_file_defaults_to_pending() {
        assert_eq!(sample().status(), FileStatus::Pending);
    }
}
