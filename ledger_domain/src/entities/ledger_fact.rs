// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ledger Fact Entity
//!
//! One record per [`StandardizedRow`](crate::entities::StandardizedRow)
//! that passed the S4 validity gate (spec.md §3, §4.4). Facts are
//! **append-only**: no column changes after insertion except `buyer_uuid`
//! and `mirror_matched_at`, both written exactly once by S5. The composite
//! key `(transaction_id, year)` is what the database partitions on.

use crate::value_objects::{CountryCode, Direction, HsCode6, Kilograms, PriceUsdPerKg, UsdAmount};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerFact {
    transaction_id: Uuid,
    year: i32,
    std_id: Uuid,
    direction: Direction,
    reporting_country: CountryCode,
    origin_country: CountryCode,
    destination_country: CountryCode,
    hs_code_6: HsCode6,
    shipment_date: NaiveDate,
    month: u32,
    qty_kg: Option<Kilograms>,
    customs_value_usd: Option<UsdAmount>,
    price_usd_per_kg: Option<PriceUsdPerKg>,
    vessel_name: Option<String>,
    container_id: Option<String>,
    supplier_uuid: Option<Uuid>,
    buyer_uuid: Option<Uuid>,
    hidden_buyer_flag: bool,
    mirror_matched_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl LedgerFact {
    /// Promotes a standardized row that has already passed
    /// [`StandardizedRow::passes_ledger_validity_gate`](crate::entities::StandardizedRow::passes_ledger_validity_gate).
    /// Callers must check the gate first; this constructor trusts its
    /// `Option` unwraps on the gated fields.
    #[allow(clippy::too_many_arguments)]
    pub fn promote(
        std_id: Uuid,
        direction: Direction,
        reporting_country: CountryCode,
        origin_country: CountryCode,
        destination_country: CountryCode,
        hs_code_6: HsCode6,
        shipment_date: NaiveDate,
        year: i32,
        month: u32,
        qty_kg: Option<Kilograms>,
        customs_value_usd: Option<UsdAmount>,
        price_usd_per_kg: Option<PriceUsdPerKg>,
        vessel_name: Option<String>,
        container_id: Option<String>,
        supplier_uuid: Option<Uuid>,
        buyer_uuid: Option<Uuid>,
        hidden_buyer_flag: bool,
    ) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            year,
            std_id,
            direction,
            reporting_country,
            origin_country,
            destination_country,
            hs_code_6,
            shipment_date,
            month,
            qty_kg,
            customs_value_usd,
            price_usd_per_kg,
            vessel_name,
            container_id,
            supplier_uuid,
            buyer_uuid,
            hidden_buyer_flag,
            mirror_matched_at: None,
            created_at: Utc::now(),
        }
    }

    /// Reconstructs a fact from persisted columns (infrastructure only).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        transaction_id: Uuid,
        year: i32,
        std_id: Uuid,
        direction: Direction,
        reporting_country: CountryCode,
        origin_country: CountryCode,
        destination_country: CountryCode,
        hs_code_6: HsCode6,
        shipment_date: NaiveDate,
        month: u32,
        qty_kg: Option<Kilograms>,
        customs_value_usd: Option<UsdAmount>,
        price_usd_per_kg: Option<PriceUsdPerKg>,
        vessel_name: Option<String>,
        container_id: Option<String>,
        supplier_uuid: Option<Uuid>,
        buyer_uuid: Option<Uuid>,
        hidden_buyer_flag: bool,
        mirror_matched_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id,
            year,
            std_id,
            direction,
            reporting_country,
            origin_country,
            destination_country,
            hs_code_6,
            shipment_date,
            month,
            qty_kg,
            customs_value_usd,
            price_usd_per_kg,
            vessel_name,
            container_id,
            supplier_uuid,
            buyer_uuid,
            hidden_buyer_flag,
            mirror_matched_at,
            created_at,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }
    pub fn year(&self) -> i32 {
        self.year
    }
    pub fn std_id(&self) -> Uuid {
        self.std_id
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
    pub fn reporting_country(&self) -> &CountryCode {
        &self.reporting_country
    }
    pub fn origin_country(&self) -> &CountryCode {
        &self.origin_country
    }
    pub fn destination_country(&self) -> &CountryCode {
        &self.destination_country
    }
    pub fn hs_code_6(&self) -> &HsCode6 {
        &self.hs_code_6
    }
    pub fn shipment_date(&self) -> NaiveDate {
        self.shipment_date
    }
    pub fn month(&self) -> u32 {
        self.month
    }
    pub fn qty_kg(&self) -> Option<Kilograms> {
        self.qty_kg
    }
    pub fn customs_value_usd(&self) -> Option<UsdAmount> {
        self.customs_value_usd
    }
    pub fn price_usd_per_kg(&self) -> Option<PriceUsdPerKg> {
        self.price_usd_per_kg
    }
    pub fn vessel_name(&self) -> Option<&str> {
        self.vessel_name.as_deref()
    }
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }
    pub fn supplier_uuid(&self) -> Option<Uuid> {
        self.supplier_uuid
    }
    pub fn buyer_uuid(&self) -> Option<Uuid> {
        self.buyer_uuid
    }
    pub fn hidden_buyer_flag(&self) -> bool {
        self.hidden_buyer_flag
    }
    pub fn mirror_matched_at(&self) -> Option<DateTime<Utc>> {
        self.mirror_matched_at
    }

    /// Eligible for S5 mirror matching iff export, hidden, and not yet
    /// matched (spec.md §4.5; Open Question resolved to EXPORT-only).
    pub fn is_mirror_eligible(&self) -> bool {
        self.direction == Direction::Export
            && self.hidden_buyer_flag
            && self.buyer_uuid.is_none()
            && self.mirror_matched_at.is_none()
    }

    /// The only mutation ever applied to a fact row (spec.md §3 invariant).
    /// Never touches `supplier_uuid` (spec.md §4.5).
    pub fn apply_mirror_match(&mut self, buyer_uuid: Uuid) {
        self.buyer_uuid = Some(buyer_uuid);
        self.mirror_matched_at = Some(Utc::now());
    }

    /// A fingerprint over every column except the two mirror-mutable
    /// fields, for the fact-immutability property test (spec.md §8
    /// invariant 2).
    pub fn immutable_fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}",
            self.transaction_id,
            self.year,
            self.std_id,
            self.direction,
            self.reporting_country,
            self.origin_country,
            self.destination_country,
            self.hs_code_6,
            self.shipment_date,
            self.month,
            self.qty_kg.map(|k| k.value()),
            self.customs_value_usd.map(|v| v.value()),
            self.vessel_name,
            self.container_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LedgerFact {
        LedgerFact::promote(
            Uuid::new_v4(),
            Direction::Export,
            CountryCode::normalize("INDONESIA"),
            CountryCode::normalize("INDONESIA"),
            CountryCode::normalize("VIETNAM"),
            HsCode6::normalize("690721").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            2025,
            3,
            Some(Kilograms::new(1000.0).unwrap()),
            Some(UsdAmount::new(8470.0).unwrap()),
            PriceUsdPerKg::derive(UsdAmount::new(8470.0).unwrap(), Kilograms::new(1000.0).unwrap()),
            None,
            None,
            None,
            None,
            true,
        )
    }

    #[test]
    fn mirror_match_only_touches_buyer_and_timestamp() {
        let mut fact = sample();
        let before = fact.immutable_fingerprint();
        fact.apply_mirror_match(Uuid::new_v4());
        let after = fact.immutable_fingerprint();
        assert_eq!(before, after);
        assert!(fact.buyer_uuid().is_some());
        assert!(fact.mirror_matched_at().is_some());
    }

    #[test]
    fn mirror_eligible_only_for_hidden_unmatched_exports() {
        let fact = sample();
        assert!(fact.is_mirror_eligible());
        let mut matched = sample();
        matched.apply_mirror_match(Uuid::new_v4());
        assert!(!matched.is_mirror_eligible());
    }
}
