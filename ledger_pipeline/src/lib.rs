// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ledger Pipeline
//!
//! Application, infrastructure, and presentation layers for the trade-data
//! ETL pipeline. `ledger_domain` defines the entities, value objects, and
//! repository contracts; this crate wires Postgres repositories, the
//! directory-scan/mapping-registry/checksum adapters, the worker pool and
//! stage runner, and the use cases for S1-S8 against them.
//!
//! ## Layout
//!
//! - [`application`]: per-stage use cases (`ingest`, `standardize`,
//!   `resolve_identity`, `load_ledger`, `mirror_match`, `build_profiles`,
//!   `risk_score`, `refresh_serving`) and the `run_pipeline` orchestrator
//!   that sequences them.
//! - [`infrastructure`]: Postgres repository implementations, filesystem
//!   adapters, worker pool, stage runner, config, and the logging/metrics
//!   stack.
//! - [`presentation`]: typed run summaries consumed by `ledger_bootstrap`'s
//!   CLI.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use ledger_domain::PipelineError;
