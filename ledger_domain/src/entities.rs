// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Entities
//!
//! The ten entities of spec.md §3, each with identity and a lifecycle
//! defined by which stage is allowed to mutate it.

pub mod file_registry;
pub mod ledger_fact;
pub mod mirror_match;
pub mod organization;
pub mod pipeline_run;
pub mod raw_row;
pub mod risk_opinion;
pub mod standardized_row;
pub mod watermark;

pub use file_registry::{FileRegistry, StageLifecycle, StageTimestamps};
pub use ledger_fact::LedgerFact;
pub use mirror_match::MirrorMatch;
pub use organization::Organization;
pub use pipeline_run::{PipelineRun, RunCounters};
pub use raw_row::RawRow;
pub use risk_opinion::{RiskEntityType, RiskOpinion, RiskReason};
pub use standardized_row::{StandardizedRow, StandardizedRowFields};
pub use watermark::Watermark;
