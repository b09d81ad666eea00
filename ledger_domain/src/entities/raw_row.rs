// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Raw Row Entity
//!
//! One record per input row, written verbatim by S1 and never mutated
//! afterwards (spec.md §3). The full original field set lives in a
//! [`FieldBag`]; a handful of fields are eagerly extracted as "hints" so
//! later stages (and operators debugging a file) don't need to re-parse
//! the bag just to see what HS code or buyer name a row carried.

use crate::value_objects::FieldBag;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    id: Uuid,
    file_id: Uuid,
    row_number: i64,
    fields: FieldBag,
    hint_hs_code_raw: Option<String>,
    hint_buyer_name_raw: Option<String>,
    hint_supplier_name_raw: Option<String>,
    hint_date_raw: Option<String>,
}

impl RawRow {
    pub fn new(file_id: Uuid, row_number: i64, fields: FieldBag) -> Self {
        let hint_hs_code_raw = fields.get_any(&["hs_code", "hs_code_raw", "tariff_code"]).map(|v| v.to_string());
        let hint_buyer_name_raw =
            fields.get_any(&["buyer_name", "consignee_name", "importer_name"]).map(|v| v.to_string());
        let hint_supplier_name_raw =
            fields.get_any(&["supplier_name", "shipper_name", "exporter_name"]).map(|v| v.to_string());
        let hint_date_raw =
            fields.get_any(&["shipment_date", "export_date", "import_date"]).map(|v| v.to_string());

        Self {
            id: Uuid::new_v4(),
            file_id,
            row_number,
            fields,
            hint_hs_code_raw,
            hint_buyer_name_raw,
            hint_supplier_name_raw,
            hint_date_raw,
        }
    }

    /// Reconstructs a row from persisted columns (infrastructure only).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        file_id: Uuid,
        row_number: i64,
        fields: FieldBag,
        hint_hs_code_raw: Option<String>,
        hint_buyer_name_raw: Option<String>,
        hint_supplier_name_raw: Option<String>,
        hint_date_raw: Option<String>,
    ) -> Self {
        Self {
            id,
            file_id,
            row_number,
            fields,
            hint_hs_code_raw,
            hint_buyer_name_raw,
            hint_supplier_name_raw,
            hint_date_raw,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_id(&self) -> Uuid {
        self.file_id
    }

    pub fn row_number(&self) -> i64 {
        self.row_number
    }

    pub fn fields(&self) -> &FieldBag {
        &self.fields
    }

    pub fn hint_hs_code_raw(&self) -> Option<&str> {
        self.hint_hs_code_raw.as_deref()
    }

    pub fn hint_buyer_name_raw(&self) -> Option<&str> {
        self.hint_buyer_name_raw.as_deref()
    }

    pub fn hint_supplier_name_raw(&self) -> Option<&str> {
        self.hint_supplier_name_raw.as_deref()
    }

    pub fn hint_date_raw(&self) -> Option<&str> {
        self.hint_date_raw.as_deref()
    }
}
