// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Repositories
//!
//! One `async_trait` per entity that needs persistence. The domain
//! defines the contract; `ledger_pipeline::infrastructure::repositories`
//! supplies the sqlx/Postgres implementation. Keeping the trait here
//! (rather than in infrastructure) lets application-layer use cases
//! depend only on the domain crate.

pub mod analytics_repository;
pub mod file_registry_repository;
pub mod ledger_fact_repository;
pub mod mirror_match_repository;
pub mod organization_repository;
pub mod pipeline_run_repository;
pub mod raw_row_repository;
pub mod risk_opinion_repository;
pub mod standardized_row_repository;
pub mod watermark_repository;

pub use analytics_repository::{AnalyticsRepository, BuyerRiskInput, ShipmentRiskInput};
pub use file_registry_repository::FileRegistryRepository;
pub use ledger_fact_repository::LedgerFactRepository;
pub use mirror_match_repository::MirrorMatchRepository;
pub use organization_repository::OrganizationRepository;
pub use pipeline_run_repository::PipelineRunRepository;
pub use raw_row_repository::RawRowRepository;
pub use risk_opinion_repository::RiskOpinionRepository;
pub use standardized_row_repository::{IdentityWriteback, StandardizedRowRepository};
pub use watermark_repository::WatermarkRepository;
