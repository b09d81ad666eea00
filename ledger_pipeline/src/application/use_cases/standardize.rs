// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S2 — Standardize
//!
//! Maps each file's [`RawRow`]s into [`StandardizedRow`]s through the
//! corridor's [`MappingSpec`] (spec.md §4.2): dates parsed per the
//! configured `strftime` list, weight converted to kilograms, value
//! converted to USD where a rate is on file. Column lookups fall back to
//! the raw field name itself when the mapping has no explicit entry, so a
//! corridor whose source already uses canonical column names needs no
//! mapping for that field.
//!
//! The per-row mapping is the only CPU-bound work in this pipeline, so each
//! chunk is mapped on the rayon pool rather than the tokio executor.

use crate::application::commands::StandardizeCommand;
use crate::infrastructure::adapters::mapping_registry::{MappingRegistry, MappingSpec, ValueType};
use crate::infrastructure::config::rayon_config::RayonPoolManager;
use crate::infrastructure::runtime::{StageOutcome, StageRunner};
use ledger_domain::entities::{RunCounters, StandardizedRow, StandardizedRowFields};
use ledger_domain::repositories::{FileRegistryRepository, RawRowRepository, StandardizedRowRepository};
use ledger_domain::services::currency::{convert_to_usd, FxRateLookup};
use ledger_domain::services::date_parse::parse_date;
use ledger_domain::services::units::convert_to_kg;
use ledger_domain::value_objects::{FieldBag, FieldValue, HsCode6, Kilograms, UsdAmount};
use ledger_domain::PipelineError;
use rayon::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const STAGE: &str = "standardization";

pub struct StandardizeUseCase {
    files: Arc<dyn FileRegistryRepository>,
    raw_rows: Arc<dyn RawRowRepository>,
    standardized_rows: Arc<dyn StandardizedRowRepository>,
    mappings: Arc<MappingRegistry>,
    fx_rates: Arc<dyn FxRateLookup>,
    stage_runner: Arc<StageRunner>,
    transforms: Arc<RayonPoolManager>,
}

impl StandardizeUseCase {
    pub fn new(
        files: Arc<dyn FileRegistryRepository>,
        raw_rows: Arc<dyn RawRowRepository>,
        standardized_rows: Arc<dyn StandardizedRowRepository>,
        mappings: Arc<MappingRegistry>,
        fx_rates: Arc<dyn FxRateLookup>,
        stage_runner: Arc<StageRunner>,
        transforms: Arc<RayonPoolManager>,
    ) -> Self {
        Self { files, raw_rows, standardized_rows, mappings, fx_rates, stage_runner, transforms }
    }

    pub async fn execute(
        &self,
        cmd: &StandardizeCommand,
        cancel: &CancellationToken,
    ) -> Result<ledger_domain::entities::PipelineRun, PipelineError> {
        let pending = self.files.find_pending_for_stage(STAGE, usize::MAX).await?;
        let filters = json!({ "file_count": pending.len() });

        self.stage_runner
            .run(STAGE, filters, cancel, || async {
                let mut counters = RunCounters::default();
                for mut file in pending.clone() {
                    if !file.try_start_stage(STAGE) {
                        continue;
                    }
                    let spec = match self.mappings.get(file.reporting_country(), file.direction(), file.source_format()) {
                        Some(spec) => spec.clone(),
                        None => {
                            warn!(file_id = %file.id(), "no mapping spec for file's corridor; abandoning standardization");
                            file.abandon_stage(STAGE);
                            self.files.save(&file).await?;
                            counters.failed += 1;
                            continue;
                        }
                    };

                    loop {
                        let raw_chunk = self.raw_rows.find_unstandardized_chunk(file.id(), cmd.chunk_size.rows()).await?;
                        if raw_chunk.is_empty() {
                            break;
                        }
                        let fx_rates = self.fx_rates.as_ref();
                        let mapped: Vec<Result<StandardizedRow, PipelineError>> = self
                            .transforms
                            .pool()
                            .install(|| raw_chunk.par_iter().map(|raw| map_row(raw.id(), raw.file_id(), raw.fields(), &spec, fx_rates)).collect());

                        let mut standardized = Vec::with_capacity(raw_chunk.len());
                        let mut failed_in_chunk = 0u64;
                        for (raw, result) in raw_chunk.iter().zip(mapped) {
                            match result {
                                Ok(row) => standardized.push(row),
                                Err(err) => {
                                    warn!(raw_row_id = %raw.id(), error = %err, "row failed standardization mapping");
                                    failed_in_chunk += 1;
                                }
                            }
                        }
                        let created = self
                            .stage_runner
                            .run_chunk(cancel, self.standardized_rows.insert_batch(&standardized))
                            .await?;
                        counters.merge(RunCounters {
                            processed: raw_chunk.len() as u64,
                            created,
                            failed: failed_in_chunk,
                            ..Default::default()
                        });
                    }

                    file.complete_stage(STAGE);
                    self.files.save(&file).await?;
                }
                Ok(StageOutcome::new(counters))
            })
            .await
    }
}

fn field_str<'a>(bag: &'a FieldBag, spec: &'a MappingSpec, canonical: &str) -> Option<String> {
    let source_column = spec.column_mapping.get(canonical).map(String::as_str).unwrap_or(canonical);
    match bag.get(source_column) {
        Some(value) if !value.is_blank() => Some(value.to_string()),
        _ => spec.defaults.get(canonical).cloned(),
    }
}

fn field_number(bag: &FieldBag, spec: &MappingSpec, canonical: &str) -> Option<f64> {
    let source_column = spec.column_mapping.get(canonical).map(String::as_str).unwrap_or(canonical);
    match bag.get(source_column) {
        Some(FieldValue::Number(n)) => Some(*n),
        Some(FieldValue::Text(s)) => s.trim().parse::<f64>().ok(),
        _ => spec.defaults.get(canonical).and_then(|d| d.parse::<f64>().ok()),
    }
}

fn map_row(
    raw_row_id: uuid::Uuid,
    file_id: uuid::Uuid,
    bag: &FieldBag,
    spec: &MappingSpec,
    rates: &dyn FxRateLookup,
) -> Result<StandardizedRow, PipelineError> {
    let hs_code_6 = field_str(bag, spec, "hs_code").and_then(|s| HsCode6::normalize(&s));
    let origin_country = field_str(bag, spec, "origin_country").map(|s| ledger_domain::value_objects::CountryCode::normalize(&s));
    let destination_country =
        field_str(bag, spec, "destination_country").map(|s| ledger_domain::value_objects::CountryCode::normalize(&s));

    let export_date = field_str(bag, spec, "export_date").and_then(|s| parse_date(&s, &spec.date_formats));
    let import_date = field_str(bag, spec, "import_date").and_then(|s| parse_date(&s, &spec.date_formats));
    let shipment_date = field_str(bag, spec, "shipment_date").and_then(|s| parse_date(&s, &spec.date_formats));

    let qty_original = field_number(bag, spec, "qty");
    let qty_original_unit = field_str(bag, spec, "qty_unit").unwrap_or_else(|| spec.weight_unit.clone());
    let qty_kg = qty_original
        .and_then(|q| convert_to_kg(q, &qty_original_unit))
        .and_then(|c| Kilograms::new(c.qty_kg).ok());

    let value_original = field_number(bag, spec, "value");
    let value_original_currency = field_str(bag, spec, "value_currency").unwrap_or_else(|| spec.value_currency.clone());

    let as_of = shipment_date.or(export_date).or(import_date);
    let value_usd = match (value_original, as_of) {
        (Some(v), Some(date)) => convert_to_usd(v, &value_original_currency, date, rates).and_then(|v| UsdAmount::new(v).ok()),
        _ => None,
    };

    let (value_fob_usd, value_cif_usd, customs_value_usd) = match spec.value_type {
        ValueType::Fob => (value_usd, None, value_usd),
        ValueType::Cif => (None, value_usd, value_usd),
        ValueType::Customs => (None, None, value_usd),
    };

    let fields = StandardizedRowFields {
        buyer_name: field_str(bag, spec, "buyer_name"),
        supplier_name: field_str(bag, spec, "supplier_name"),
        hs_code_6,
        origin_country,
        destination_country,
        export_date,
        import_date,
        shipment_date,
        qty_original,
        qty_original_unit: Some(qty_original_unit),
        qty_kg,
        value_original,
        value_original_currency: Some(value_original_currency),
        value_fob_usd,
        value_cif_usd,
        customs_value_usd,
        teu: field_number(bag, spec, "teu"),
        vessel_name: field_str(bag, spec, "vessel_name"),
        container_id: field_str(bag, spec, "container_id"),
        port: field_str(bag, spec, "port"),
    };

    StandardizedRow::new(raw_row_id, file_id, fields).map_err(|err| {
        warn!(%raw_row_id, error = %err, "standardized row rejected by domain invariant");
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct FixedRate;
    impl FxRateLookup for FixedRate {
        fn usd_rate(&self, _currency_code: &str, _as_of_date: NaiveDate) -> Option<f64> {
            Some(1.0)
        }
    }

    fn spec() -> MappingSpec {
        MappingSpec {
            lifecycle: crate::infrastructure::adapters::mapping_registry::MappingLifecycle::Live,
            column_mapping: {
                let mut m = HashMap::new();
                m.insert("buyer_name".to_string(), "consignee_name".to_string());
                m
            },
            weight_unit: "KG".to_string(),
            value_currency: "USD".to_string(),
            value_type: ValueType::Customs,
            defaults: HashMap::new(),
            date_formats: vec!["%Y-%m-%d".to_string()],
            header_row_index: None,
        }
    }

    fn sample_bag() -> FieldBag {
        let mut bag = FieldBag::new();
        bag.insert("hs_code", FieldValue::Text("690721".into()));
        bag.insert("origin_country", FieldValue::Text("INDONESIA".into()));
        bag.insert("destination_country", FieldValue::Text("VIETNAM".into()));
        bag.insert("shipment_date", FieldValue::Text("2025-03-01".into()));
        bag.insert("qty", FieldValue::Number(1000.0));
        bag.insert("value", FieldValue::Number(8470.0));
        bag.insert("consignee_name", FieldValue::Text("ACME LTD".into()));
        bag
    }

    #[test]
    fn maps_via_column_mapping_and_derives_price() {
        let row = map_row(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), &sample_bag(), &spec(), &FixedRate).unwrap();
        assert_eq!(row.buyer_name(), Some("ACME LTD"));
        assert_eq!(row.hs_code_6().unwrap().as_str(), "690721");
        assert!((row.price_usd_per_kg().unwrap().value() - 8.47).abs() < 1e-9);
        assert!(row.passes_ledger_validity_gate());
    }

    #[test]
    fn unparseable_date_yields_null_rather_than_error() {
        let mut bag = sample_bag();
        bag.insert("shipment_date", FieldValue::Text("not-a-date".into()));
        let row = map_row(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), &bag, &spec(), &FixedRate).unwrap();
        assert!(row.shipment_date().is_none());
        assert!(!row.passes_ledger_validity_gate());
    }

    #[test]
    fn missing_fx_rate_leaves_value_null() {
        struct NoRates;
        impl FxRateLookup for NoRates {
            fn usd_rate(&self, _c: &str, _d: NaiveDate) -> Option<f64> {
                None
            }
        }
        let mut bag = sample_bag();
        bag.insert("value_currency", FieldValue::Text("KES".into()));
        let mut s = spec();
        s.value_currency = "KES".to_string();
        let row = map_row(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), &bag, &s, &NoRates).unwrap();
        assert!(row.customs_value_usd().is_none());
    }
}
