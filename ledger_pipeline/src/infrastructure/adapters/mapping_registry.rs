// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Config-driven polymorphism by `(country, direction, source_format)`
//! (spec.md §4.2, §6, §9): one `MappingSpec` per corridor, keyed by a
//! lowercase `<country>_<direction>_<format>` string, loaded from TOML on
//! disk rather than branching per-country in code.

use ledger_domain::value_objects::{CountryCode, Direction, SourceFormat};
use ledger_domain::PipelineError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MappingLifecycle {
    Draft,
    Verified,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    Fob,
    Cif,
    Customs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingSpec {
    pub lifecycle: MappingLifecycle,
    pub column_mapping: HashMap<String, String>,
    pub weight_unit: String,
    pub value_currency: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub defaults: HashMap<String, String>,
    pub date_formats: Vec<String>,
    #[serde(default)]
    pub header_row_index: Option<usize>,
}

/// `<country>_<direction>_<format>`, all lowercase, per spec.md §6.
pub fn mapping_key(country: &CountryCode, direction: Direction, format: SourceFormat) -> String {
    format!(
        "{}_{}_{}",
        country.as_str().to_lowercase(),
        direction.as_str().to_lowercase(),
        format.as_str().to_lowercase()
    )
}

/// Mapping configs are read-only to the pipeline (spec.md §6): loaded once
/// from a directory of `<key>.toml` files and held in memory for the
/// lifetime of a run.
pub struct MappingRegistry {
    specs: HashMap<String, MappingSpec>,
}

impl MappingRegistry {
    pub fn load_from_dir(dir: &Path) -> Result<Self, PipelineError> {
        let mut specs = HashMap::new();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| PipelineError::configuration_error(format!("reading mapping dir {}: {e}", dir.display())))?;

        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::configuration_error(format!("reading mapping entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| PipelineError::configuration_error(format!("non-UTF8 mapping filename: {}", path.display())))?
                .to_string();
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| PipelineError::configuration_error(format!("reading {}: {e}", path.display())))?;
            let spec: MappingSpec = toml::from_str(&raw)
                .map_err(|e| PipelineError::configuration_error(format!("parsing {}: {e}", path.display())))?;
            specs.insert(key, spec);
        }
        Ok(Self { specs })
    }

    pub fn get(&self, country: &CountryCode, direction: Direction, format: SourceFormat) -> Option<&MappingSpec> {
        self.specs.get(&mapping_key(country, direction, format))
    }

    /// Distinct countries with at least one corridor configured, derived
    /// from the `<country>_<direction>_<format>` keys. Used by S5 to
    /// enumerate the destination countries to scan for mirror-eligible
    /// exports, since the registry is the only place that knows the full
    /// set of onboarded countries.
    pub fn known_countries(&self) -> Vec<CountryCode> {
        let mut countries: Vec<CountryCode> = self
            .specs
            .keys()
            .filter_map(|key| {
                let mut parts = key.rsplitn(3, '_');
                let _format = parts.next()?;
                let _direction = parts.next()?;
                let country = parts.next()?;
                Some(CountryCode::normalize(&country.to_uppercase()))
            })
            .collect();
        countries.sort();
        countries.dedup();
        countries
    }

    #[cfg(test)]
    pub fn from_specs(specs: HashMap<String, MappingSpec>) -> Self {
        Self { specs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_key_is_lowercase_and_ordered() {
        let key = mapping_key(&CountryCode::normalize("KENYA"), Direction::Export, SourceFormat::Full);
        assert_eq!(key, "kenya_export_full");
    }

    #[test]
    fn get_misses_unknown_corridor() {
        let registry = MappingRegistry::from_specs(HashMap::new());
        assert!(registry
            .get(&CountryCode::normalize("KENYA"), Direction::Export, SourceFormat::Full)
            .is_none());
    }
}
