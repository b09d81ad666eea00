// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Runner
//!
//! Drives the whole S1→S4 linear chain, then fans S5-S8 out to run
//! concurrently against S4's output (spec.md §1: "Data flow is linear
//! (S1→S2→S3→S4) with S5-S8 fanning out from S4 and all writing only to
//! their own tables"). Grounded in the teacher's CLI `process` command,
//! which chains several stages behind one operator-facing entry point;
//! there the chaining is sequential end to end, here S5-S8's independent
//! write targets let them run as concurrent tasks instead.

use crate::application::commands::{
    BuildProfilesCommand, IngestCommand, LoadLedgerCommand, MirrorMatchCommand, RefreshServingCommand, ResolveIdentityCommand,
    RiskScoreCommand, StandardizeCommand,
};
use crate::application::use_cases::{
    BuildProfilesUseCase, IngestUseCase, LoadLedgerUseCase, MirrorMatchUseCase, RefreshServingUseCase, ResolveIdentityUseCase,
    RiskScoreUseCase, StandardizeUseCase,
};
use ledger_domain::entities::PipelineRun;
use ledger_domain::PipelineError;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Every use case `run_pipeline` needs, injected once at the composition
/// root (spec.md §6: the binary wires concrete adapters behind these
/// trait objects).
pub struct PipelineUseCases {
    pub ingest: Arc<IngestUseCase>,
    pub standardize: Arc<StandardizeUseCase>,
    pub resolve_identity: Arc<ResolveIdentityUseCase>,
    pub load_ledger: Arc<LoadLedgerUseCase>,
    pub mirror_match: Arc<MirrorMatchUseCase>,
    pub build_profiles: Arc<BuildProfilesUseCase>,
    pub risk_score: Arc<RiskScoreUseCase>,
    pub refresh_serving: Arc<RefreshServingUseCase>,
}

/// Per-stage commands for one full-pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineCommands {
    pub ingest: IngestCommand,
    pub standardize: StandardizeCommand,
    pub resolve_identity: ResolveIdentityCommand,
    pub load_ledger: LoadLedgerCommand,
    pub mirror_match: MirrorMatchCommand,
    pub build_profiles: BuildProfilesCommand,
    pub risk_score: RiskScoreCommand,
    pub refresh_serving: RefreshServingCommand,
}

/// The `PipelineRun` record each stage produced, for the operator-facing
/// summary (spec.md §4.8 control-tower view).
pub struct PipelineRunReport {
    pub ingest: PipelineRun,
    pub standardize: PipelineRun,
    pub resolve_identity: PipelineRun,
    pub load_ledger: PipelineRun,
    pub mirror_match: PipelineRun,
    pub build_profiles: PipelineRun,
    pub risk_score: PipelineRun,
    pub refresh_serving: PipelineRun,
}

/// Runs S1→S4 in order, then S5-S8 concurrently. A linear-chain stage
/// that returns anything other than a clean success still lets the chain
/// continue to the next stage — each `PipelineRun`'s own status already
/// carries the failure, and later stages are idempotent re-runs whether
/// or not their predecessor fully drained its backlog this time.
pub async fn run_pipeline(
    raw_data_root: &Path,
    use_cases: &PipelineUseCases,
    cmds: &PipelineCommands,
    cancel: &CancellationToken,
) -> Result<PipelineRunReport, PipelineError> {
    let ingest = use_cases.ingest.execute(raw_data_root, &cmds.ingest, cancel).await?;
    let standardize = use_cases.standardize.execute(&cmds.standardize, cancel).await?;
    let resolve_identity = use_cases.resolve_identity.execute(&cmds.resolve_identity, cancel).await?;
    let load_ledger = use_cases.load_ledger.execute(&cmds.load_ledger, cancel).await?;

    let (mirror_match, build_profiles, risk_score, refresh_serving) = tokio::try_join!(
        use_cases.mirror_match.execute(&cmds.mirror_match, cancel),
        use_cases.build_profiles.execute(&cmds.build_profiles, cancel),
        use_cases.risk_score.execute(&cmds.risk_score, cancel),
        use_cases.refresh_serving.execute(&cmds.refresh_serving, cancel),
    )?;

    Ok(PipelineRunReport { ingest, standardize, resolve_identity, load_ledger, mirror_match, build_profiles, risk_score, refresh_serving })
}
