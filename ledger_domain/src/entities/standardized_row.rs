// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Standardized Row Entity
//!
//! One record per [`RawRow`](crate::entities::RawRow) that passed S2
//! mapping (spec.md §3). Every column here is canonical: HS code is a
//! validated 6-digit code, dates are real dates, weight is in kilograms,
//! value is in USD where a rate was available. Only `buyer_uuid`,
//! `supplier_uuid`, and `hidden_buyer_flag` are mutated after insertion,
//! and only by S3.

use crate::value_objects::{CountryCode, HsCode6, Kilograms, PriceUsdPerKg, UsdAmount};
use crate::PipelineError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedRow {
    id: Uuid,
    raw_row_id: Uuid,
    file_id: Uuid,
    buyer_name: Option<String>,
    supplier_name: Option<String>,
    buyer_uuid: Option<Uuid>,
    supplier_uuid: Option<Uuid>,
    hs_code_6: Option<HsCode6>,
    origin_country: Option<CountryCode>,
    destination_country: Option<CountryCode>,
    export_date: Option<NaiveDate>,
    import_date: Option<NaiveDate>,
    shipment_date: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u32>,
    qty_original: Option<f64>,
    qty_original_unit: Option<String>,
    qty_kg: Option<Kilograms>,
    value_original: Option<f64>,
    value_original_currency: Option<String>,
    value_fob_usd: Option<UsdAmount>,
    value_cif_usd: Option<UsdAmount>,
    customs_value_usd: Option<UsdAmount>,
    price_usd_per_kg: Option<PriceUsdPerKg>,
    teu: Option<f64>,
    vessel_name: Option<String>,
    container_id: Option<String>,
    port: Option<String>,
    hidden_buyer_flag: bool,
}

/// Input parameters accepted by S2's construction path. Grouped into one
/// struct because the field count alone would make a positional
/// constructor unreadable at call sites.
#[derive(Debug, Clone, Default)]
pub struct StandardizedRowFields {
    pub buyer_name: Option<String>,
    pub supplier_name: Option<String>,
    pub hs_code_6: Option<HsCode6>,
    pub origin_country: Option<CountryCode>,
    pub destination_country: Option<CountryCode>,
    pub export_date: Option<NaiveDate>,
    pub import_date: Option<NaiveDate>,
    pub shipment_date: Option<NaiveDate>,
    pub qty_original: Option<f64>,
    pub qty_original_unit: Option<String>,
    pub qty_kg: Option<Kilograms>,
    pub value_original: Option<f64>,
    pub value_original_currency: Option<String>,
    pub value_fob_usd: Option<UsdAmount>,
    pub value_cif_usd: Option<UsdAmount>,
    pub customs_value_usd: Option<UsdAmount>,
    pub teu: Option<f64>,
    pub vessel_name: Option<String>,
    pub container_id: Option<String>,
    pub port: Option<String>,
}

impl StandardizedRow {
    pub fn new(raw_row_id: Uuid, file_id: Uuid, fields: StandardizedRowFields) -> Result<Self, PipelineError> {
        // shipment_date = first non-null of shipment_date, export_date, import_date (spec.md §4.2)
        let shipment_date =
            fields.shipment_date.or(fields.export_date).or(fields.import_date);
        let (year, month) = match shipment_date {
            Some(d) => (Some(d.format("%Y").to_string().parse().unwrap()), Some(d.format("%m").to_string().parse().unwrap())),
            None => (None, None),
        };
        if let Some(y) = year {
            if !(2000..=2100).contains(&y) {
                return Err(PipelineError::BugAssertionFailed(format!("year {y} outside [2000,2100]")));
            }
        }

        let price_usd_per_kg = match (fields.customs_value_usd, fields.qty_kg) {
            (Some(v), Some(q)) => PriceUsdPerKg::derive(v, q),
            _ => None,
        };

        let hidden_buyer_flag = crate::services::hidden_buyer::is_hidden(fields.buyer_name.as_deref());

        Ok(Self {
            id: Uuid::new_v4(),
            raw_row_id,
            file_id,
            buyer_name: fields.buyer_name,
            supplier_name: fields.supplier_name,
            buyer_uuid: None,
            supplier_uuid: None,
            hs_code_6: fields.hs_code_6,
            origin_country: fields.origin_country,
            destination_country: fields.destination_country,
            export_date: fields.export_date,
            import_date: fields.import_date,
            shipment_date,
            year,
            month,
            qty_original: fields.qty_original,
            qty_original_unit: fields.qty_original_unit,
            qty_kg: fields.qty_kg,
            value_original: fields.value_original,
            value_original_currency: fields.value_original_currency,
            value_fob_usd: fields.value_fob_usd,
            value_cif_usd: fields.value_cif_usd,
            customs_value_usd: fields.customs_value_usd,
            price_usd_per_kg,
            teu: fields.teu,
            vessel_name: fields.vessel_name,
            container_id: fields.container_id,
            port: fields.port,
            hidden_buyer_flag,
        })
    }

    /// Reconstructs a row from persisted columns (infrastructure only).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        raw_row_id: Uuid,
        file_id: Uuid,
        buyer_name: Option<String>,
        supplier_name: Option<String>,
        buyer_uuid: Option<Uuid>,
        supplier_uuid: Option<Uuid>,
        hs_code_6: Option<HsCode6>,
        origin_country: Option<CountryCode>,
        destination_country: Option<CountryCode>,
        export_date: Option<NaiveDate>,
        import_date: Option<NaiveDate>,
        shipment_date: Option<NaiveDate>,
        year: Option<i32>,
        month: Option<u32>,
        qty_original: Option<f64>,
        qty_original_unit: Option<String>,
        qty_kg: Option<Kilograms>,
        value_original: Option<f64>,
        value_original_currency: Option<String>,
        value_fob_usd: Option<UsdAmount>,
        value_cif_usd: Option<UsdAmount>,
        customs_value_usd: Option<UsdAmount>,
        price_usd_per_kg: Option<PriceUsdPerKg>,
        teu: Option<f64>,
        vessel_name: Option<String>,
        container_id: Option<String>,
        port: Option<String>,
        hidden_buyer_flag: bool,
    ) -> Self {
        Self {
            id,
            raw_row_id,
            file_id,
            buyer_name,
            supplier_name,
            buyer_uuid,
            supplier_uuid,
            hs_code_6,
            origin_country,
            destination_country,
            export_date,
            import_date,
            shipment_date,
            year,
            month,
            qty_original,
            qty_original_unit,
            qty_kg,
            value_original,
            value_original_currency,
            value_fob_usd,
            value_cif_usd,
            customs_value_usd,
            price_usd_per_kg,
            teu,
            vessel_name,
            container_id,
            port,
            hidden_buyer_flag,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn raw_row_id(&self) -> Uuid {
        self.raw_row_id
    }
    pub fn file_id(&self) -> Uuid {
        self.file_id
    }
    pub fn buyer_name(&self) -> Option<&str> {
        self.buyer_name.as_deref()
    }
    pub fn supplier_name(&self) -> Option<&str> {
        self.supplier_name.as_deref()
    }
    pub fn buyer_uuid(&self) -> Option<Uuid> {
        self.buyer_uuid
    }
    pub fn supplier_uuid(&self) -> Option<Uuid> {
        self.supplier_uuid
    }
    pub fn hs_code_6(&self) -> Option<&HsCode6> {
        self.hs_code_6.as_ref()
    }
    pub fn origin_country(&self) -> Option<&CountryCode> {
        self.origin_country.as_ref()
    }
    pub fn destination_country(&self) -> Option<&CountryCode> {
        self.destination_country.as_ref()
    }
    pub fn export_date(&self) -> Option<NaiveDate> {
        self.export_date
    }
    pub fn import_date(&self) -> Option<NaiveDate> {
        self.import_date
    }
    pub fn shipment_date(&self) -> Option<NaiveDate> {
        self.shipment_date
    }
    pub fn year(&self) -> Option<i32> {
        self.year
    }
    pub fn month(&self) -> Option<u32> {
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
    pub fn teu(&self) -> Option<f64> {
        self.teu
    }
    pub fn vessel_name(&self) -> Option<&str> {
        self.vessel_name.as_deref()
    }
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }
    pub fn qty_original(&self) -> Option<f64> {
        self.qty_original
    }
    pub fn qty_original_unit(&self) -> Option<&str> {
        self.qty_original_unit.as_deref()
    }
    pub fn value_original(&self) -> Option<f64> {
        self.value_original
    }
    pub fn value_original_currency(&self) -> Option<&str> {
        self.value_original_currency.as_deref()
    }
    pub fn value_fob_usd(&self) -> Option<UsdAmount> {
        self.value_fob_usd
    }
    pub fn value_cif_usd(&self) -> Option<UsdAmount> {
        self.value_cif_usd
    }
    pub fn hidden_buyer_flag(&self) -> bool {
        self.hidden_buyer_flag
    }

    /// Mutated only by S3 (spec.md §3 lifecycle invariant).
    pub fn set_buyer_uuid(&mut self, id: Uuid) {
        self.buyer_uuid = Some(id);
    }

    pub fn set_supplier_uuid(&mut self, id: Uuid) {
        self.supplier_uuid = Some(id);
    }

    pub fn refresh_hidden_buyer_flag(&mut self) {
        self.hidden_buyer_flag = crate::services::hidden_buyer::is_hidden(self.buyer_name.as_deref());
    }

    /// The validity gate S4 applies before promoting to [`LedgerFact`](crate::entities::LedgerFact)
    /// (spec.md §4.4).
    pub fn passes_ledger_validity_gate(&self) -> bool {
        self.shipment_date.is_some()
            && self.origin_country.is_some()
            && self.destination_country.is_some()
            && self.hs_code_6.is_some()
            && self.year.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_fields() -> StandardizedRowFields {
        StandardizedRowFields {
            hs_code_6: HsCode6::normalize("690721"),
            origin_country: Some(CountryCode::normalize("INDONESIA")),
            destination_country: Some(CountryCode::normalize("VIETNAM")),
            shipment_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            qty_kg: Some(Kilograms::new(1000.0).unwrap()),
            customs_value_usd: Some(UsdAmount::new(8470.0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn derives_year_month_and_price() {
        let row = StandardizedRow::new(Uuid::new_v4(), Uuid::new_v4(), base_fields()).unwrap();
        assert_eq!(row.year(), Some(2025));
        assert_eq!(row.month(), Some(3));
        assert!((row.price_usd_per_kg().unwrap().value() - 8.47).abs() < 1e-9);
    }

    #[test]
    fn rejects_year_outside_bounds() {
        let mut fields = base_fields();
        fields.shipment_date = NaiveDate::from_ymd_opt(1899, 1, 1);
        let err = StandardizedRow::new(Uuid::new_v4(), Uuid::new_v4(), fields).unwrap_err();
        assert!(matches!(err, PipelineError::BugAssertionFailed(_)));
    }

    #[test]
    fn passes_validity_gate_when_critical_fields_present() {
        let row = StandardizedRow::new(Uuid::new_v4(), Uuid::new_v4(), base_fields()).unwrap();
        assert!(row.passes_ledger_validity_gate());
    }

    #[test]
    fn fails_validity_gate_without_hs_code() {
        let mut fields = base_fields();
        fields.hs_code_6 = None;
        let row = StandardizedRow::new(Uuid::new_v4(), Uuid::new_v4(), fields).unwrap();
        assert!(!row.passes_ledger_validity_gate());
    }

    #[test]
    fn hidden_buyer_flag_set_for_blank_name() {
        let mut fields = base_fields();
        fields.buyer_name = Some("TO THE ORDER".to_string());
        let row = StandardizedRow::new(Uuid::new_v4(), Uuid::new_v4(), fields).unwrap();
        assert!(row.hidden_buyer_flag());
    }
}
