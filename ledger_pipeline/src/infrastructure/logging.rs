// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging
//!
//! Leveled, structured logging for human operators (spec.md §6:
//! "standard logging (leveled, with structured fields `stage`, `run_id`,
//! `file_id`, `rows`)"). `pipeline_runs` is the sole structured-output
//! surface for machine consumption; this module is console/file output
//! for people, built on `tracing` + `tracing-subscriber`.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber. Call once from the bootstrap
/// binary's `main`. Honors `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .try_init()
        .ok();
}

/// Emits the per-stage structured log line every use case logs at
/// completion: `stage`, `run_id`, `file_id` (optional), and `rows`.
#[macro_export]
macro_rules! log_stage_outcome {
    ($stage:expr, $run_id:expr, $file_id:expr, $rows:expr) => {
        tracing::info!(
            stage = $stage,
            run_id = %$run_id,
            file_id = ?$file_id,
            rows = $rows,
            "stage outcome"
        );
    };
}
