// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Directory scanning for S1 ingestion.
//!
//! Input files live under `<root>/<country>/<direction>/<year>/<month>/
//! <filename>` (spec.md §6). Metadata is derived from the path segments
//! first; a filename regex override can replace that when the directory
//! convention isn't followed. Files matching the synthetic pattern
//! `<country>_(import|export)_YYYYMM.*` are reported separately so S1 can
//! mark them `TEST` and skip parsing (spec.md §4.1).

use ledger_domain::value_objects::{CountryCode, Direction};
use ledger_domain::PipelineError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const RECOGNIZED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

fn synthetic_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[a-z]{2}_(import|export)_\d{6}").unwrap())
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub country: CountryCode,
    pub direction: Direction,
    pub year: i32,
    pub month: u32,
    pub is_synthetic: bool,
}

/// Derives `(country, direction, year, month)` from the four path segments
/// immediately above the file, per the `<root>/<country>/<direction>/
/// <year>/<month>/<filename>` convention. Returns `None` when the path is
/// too shallow to carry that structure — callers fall back to a
/// config-supplied filename regex in that case.
fn metadata_from_path(root: &Path, path: &Path) -> Option<(CountryCode, Direction, i32, u32)> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments: Vec<&str> = relative
        .parent()?
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    let month_str = segments.pop()?;
    let year_str = segments.pop()?;
    let direction_str = segments.pop()?;
    let country_str = segments.pop()?;

    let country = CountryCode::normalize(country_str);
    let direction: Direction = direction_str.parse().ok()?;
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;
    Some((country, direction, year, month))
}

fn has_recognized_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RECOGNIZED_EXTENSIONS.iter().any(|r| r.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn is_synthetic(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| synthetic_pattern().is_match(n))
        .unwrap_or(false)
}

/// Recursively walks `root`, yielding every recognized file underneath it.
/// Files whose directory structure doesn't resolve to `(country,
/// direction, year, month)` are skipped with a warning logged by the
/// caller, since the ingestion use case is the one with access to a
/// `FileRegistry` to record the anomaly against.
pub fn scan(root: &Path) -> Result<Vec<ScannedFile>, PipelineError> {
    let mut out = Vec::new();
    scan_dir(root, root, &mut out)?;
    Ok(out)
}

fn scan_dir(root: &Path, dir: &Path, out: &mut Vec<ScannedFile>) -> Result<(), PipelineError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| PipelineError::io_error(format!("reading directory {}: {e}", dir.display())))?;

    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io_error(format!("reading directory entry: {e}")))?;
        let path = entry.path();
        if path.is_dir() {
            scan_dir(root, &path, out)?;
            continue;
        }
        if !has_recognized_extension(&path) {
            continue;
        }
        let synthetic = is_synthetic(&path);
        if let Some((country, direction, year, month)) = metadata_from_path(root, &path) {
            out.push(ScannedFile {
                path,
                country,
                direction,
                year,
                month,
                is_synthetic: synthetic,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_files_under_convention_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("in").join("export").join("2025").join("03");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("shipments.csv"), "hs6,qty\n").unwrap();

        let found = scan(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].year, 2025);
        assert_eq!(found[0].month, 3);
        assert_eq!(found[0].direction, Direction::Export);
        assert!(!found[0].is_synthetic);
    }

    #[test]
    fn flags_synthetic_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("in").join("export").join("2025").join("03");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("in_export_202503_smoketest.csv"), "hs6,qty\n").unwrap();

        let found = scan(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].is_synthetic);
    }

    #[test]
    fn ignores_unrecognized_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("in").join("export").join("2025").join("03");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("readme.txt"), "not a data file").unwrap();

        assert!(scan(dir.path()).unwrap().is_empty());
    }
}
