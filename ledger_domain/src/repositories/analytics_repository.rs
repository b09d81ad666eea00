// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Analytics Repository
//!
//! S6's buyer/exporter profiles, price corridors, and lane stats
//! (spec.md §4.6) are not part of the entity list in spec.md §3, and S7's
//! rules in [`crate::services::risk_rules`] only ever consume
//! pre-aggregated primitives, not whole rows. Both builders and the risk
//! engine's inputs are therefore expressed here as direct aggregate
//! queries rather than as additional domain entities — the aggregation
//! itself (percentiles, z-scores, persona labels) is something a
//! relational engine does better than a row-at-a-time Rust loop, and
//! spec.md §4.6 already describes every builder as "recompute from
//! scratch" over its grain.

use crate::PipelineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Everything [`crate::services::risk_rules::under_invoice`],
/// [`over_invoice`](crate::services::risk_rules::over_invoice), and
/// [`weird_lane`](crate::services::risk_rules::weird_lane) need for one
/// shipment, pre-joined against its price-corridor and lane-stats rows
/// (spec.md §4.7).
#[derive(Debug, Clone, Copy)]
pub struct ShipmentRiskInput {
    pub transaction_id: Uuid,
    pub price_usd_per_kg: Option<f64>,
    pub corridor_median: Option<f64>,
    pub corridor_std: Option<f64>,
    pub lane_shipment_count: u64,
    pub hs6_global_count: u64,
}

/// Everything [`ghost_entity`](crate::services::risk_rules::ghost_entity),
/// [`volume_spike`](crate::services::risk_rules::volume_spike), and
/// [`free_email`](crate::services::risk_rules::free_email) need for one
/// buyer, pre-aggregated from its profile and observed contact domains
/// (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct BuyerRiskInput {
    pub buyer_uuid: Uuid,
    pub total_value_usd: f64,
    pub has_website_signal: bool,
    pub monthly_count_z_score: f64,
    pub month_over_month_pct_change: f64,
    pub is_high_volume: bool,
    pub contact_email_domains: Vec<String>,
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Recomputes `(buyer_uuid, destination_country)` profiles touched
    /// since `lower_bound`, upserting on the grain's unique key (spec.md
    /// §4.6). Returns the number of grains refreshed.
    async fn refresh_buyer_profiles(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError>;

    /// Symmetric counterpart over `(supplier_uuid, origin_country)`.
    async fn refresh_exporter_profiles(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError>;

    /// Recomputes `(hs_code_6, destination_country, year, month,
    /// direction, reporting_country)` price statistics over qualifying
    /// rows (spec.md §4.6).
    async fn refresh_price_corridors(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError>;

    /// Recomputes `(origin_country, destination_country, hs_code_6)` lane
    /// totals.
    async fn refresh_lane_stats(&self, lower_bound: DateTime<Utc>) -> Result<u64, PipelineError>;

    /// Facts with `shipment_date >= watermark - 7 days` (spec.md §4.7
    /// incremental boundary), pre-joined against their corridor and lane
    /// rows.
    async fn find_shipment_risk_inputs(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<ShipmentRiskInput>, PipelineError>;

    /// Buyers whose profile changed since `since`, pre-aggregated for the
    /// buyer-scope rules.
    async fn find_buyer_risk_inputs(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<BuyerRiskInput>, PipelineError>;

    /// Rebuilds the materialized serving summary S8 maintains for the
    /// (out-of-scope) external API (spec.md §2, §4.8).
    async fn refresh_serving_summary(&self) -> Result<(), PipelineError>;
}
