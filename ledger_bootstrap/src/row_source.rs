// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CSV Row Source
//!
//! The composition-root implementation of `ledger_pipeline`'s `RowSource`
//! port. File-format sniffing and Excel parsing stay out of scope; this
//! adapter handles the common case - a comma-separated file with a header
//! row - and reports anything else as unsupported rather than guessing.

use async_trait::async_trait;
use ledger_pipeline::application::ports::RowSource;
use ledger_pipeline::PipelineError;
use std::path::Path;
use ledger_domain::value_objects::{FieldBag, FieldValue};

/// Reads `.csv` files field-by-field, quoting-aware, into `FieldBag`s keyed
/// by the header row. Every value lands as `FieldValue::Text` - standardize
/// (S2) does its own numeric/date coercion via `FieldBag::number`/mapping
/// `strftime` lists, so there's no need to guess types here.
pub struct CsvRowSource;

impl CsvRowSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvRowSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RowSource for CsvRowSource {
    async fn read_rows(&self, path: &Path) -> Result<Vec<FieldBag>, PipelineError> {
        let is_csv = path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("csv")).unwrap_or(false);
        if !is_csv {
            return Err(PipelineError::io_error(format!("{}: only .csv sources are supported", path.display())));
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::io_error(format!("reading {}: {e}", path.display())))?;

        let mut lines = split_records(&contents).into_iter();
        let header = match lines.next() {
            Some(h) => h,
            None => return Ok(Vec::new()),
        };

        let mut rows = Vec::new();
        for record in lines {
            if record.len() == 1 && record[0].trim().is_empty() {
                continue;
            }
            let mut bag = FieldBag::new();
            for (column, value) in header.iter().zip(record.iter()) {
                bag.insert(column.clone(), FieldValue::Text(value.clone()));
            }
            rows.push(bag);
        }
        Ok(rows)
    }
}

/// Splits `contents` into records of unescaped fields, honoring double-quote
/// wrapping and the `""` escaped-quote convention (RFC 4180), without
/// pulling in a dedicated CSV crate for this one boundary adapter.
fn split_records(contents: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    records
}
