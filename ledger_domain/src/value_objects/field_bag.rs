// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Field Bag Value Object
//!
//! Replaces the dynamic dict-style field access of the source system (§9
//! DESIGN NOTES: "Dynamic field access on raw rows") with an explicit
//! semi-structured value type: a mapping from column name to a small closed
//! sum of primitive kinds, plus a typed accessor that records lookup
//! failures instead of panicking.
//!
//! A [`FieldBag`] is what [`RawRow`](crate::entities::RawRow) stores for an
//! entire source record, and what mapping configs (`MappingSpec`) describe
//! extraction from, declaratively.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single field value as read from a heterogeneous source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Date(chrono::NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<chrono::NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Null) || matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, ""),
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{d}"),
        }
    }
}

/// Records why a typed accessor could not produce a value, instead of a
/// silent `None` that would be indistinguishable from "field absent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAccessError {
    Missing(String),
    WrongType { field: String, expected: &'static str },
}

impl fmt::Display for FieldAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "field '{name}' not present in bag"),
            Self::WrongType { field, expected } => {
                write!(f, "field '{field}' did not hold a {expected}")
            }
        }
    }
}

/// An ordered, string-keyed bag of [`FieldValue`]s — one per source row.
///
/// `BTreeMap` keeps serialized output deterministic, which matters for
/// provenance fingerprints and for reproducible test fixtures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldBag {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldBag {
    pub fn new() -> Self {
        Self { fields: BTreeMap::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Looks up `key`, falling back through `aliases` in order — mapping
    /// configs may name more than one source column for a canonical field.
    pub fn get_any(&self, candidates: &[&str]) -> Option<&FieldValue> {
        candidates.iter().find_map(|c| self.fields.get(*c))
    }

    pub fn text(&self, key: &str) -> Result<&str, FieldAccessError> {
        let value = self.fields.get(key).ok_or_else(|| FieldAccessError::Missing(key.to_string()))?;
        value.as_text().ok_or_else(|| FieldAccessError::WrongType { field: key.to_string(), expected: "text" })
    }

    pub fn number(&self, key: &str) -> Result<f64, FieldAccessError> {
        let value = self.fields.get(key).ok_or_else(|| FieldAccessError::Missing(key.to_string()))?;
        value.as_number().ok_or_else(|| FieldAccessError::WrongType { field: key.to_string(), expected: "number" })
    }
}

impl FromIterator<(String, FieldValue)> for FieldBag {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_reports_missing_not_panic() {
        let bag = FieldBag::new();
        assert_eq!(bag.text("buyer_name"), Err(FieldAccessError::Missing("buyer_name".into())));
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut bag = FieldBag::new();
        bag.insert("qty", FieldValue::Text("not-a-number-xyz".into()));
        assert!(matches!(bag.number("qty"), Err(FieldAccessError::WrongType { .. })));
    }

    #[test]
    fn numeric_text_coerces() {
        let mut bag = FieldBag::new();
        bag.insert("qty", FieldValue::Text("  1234.5 ".into()));
        assert_eq!(bag.number("qty").unwrap(), 1234.5);
    }

    #[test]
    fn get_any_falls_back_through_aliases() {
        let mut bag = FieldBag::new();
        bag.insert("consignee_name", FieldValue::Text("ACME".into()));
        let found = bag.get_any(&["buyer_name", "consignee_name"]);
        assert_eq!(found.unwrap().as_text(), Some("ACME"));
    }

    #[test]
    fn blank_text_is_blank() {
        assert!(FieldValue::Text("   ".into()).is_blank());
        assert!(FieldValue::Null.is_blank());
        assert!(!FieldValue::Text("x".into()).is_blank());
    }
}
