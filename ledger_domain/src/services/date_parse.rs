// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configurable Date Parsing
//!
//! spec.md §4.2: mapping configs carry an ordered list of `strftime`
//! patterns, tried left to right; the first that parses wins. A small set
//! of format-inference fallbacks runs if every configured pattern fails.

use chrono::NaiveDate;

const INFERENCE_FALLBACKS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y%m%d", "%d-%b-%Y"];

/// Tries `configured_formats` first, in order, then the closed fallback
/// set. Returns `None` only if nothing matches.
pub fn parse_date(raw: &str, configured_formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    configured_formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| INFERENCE_FALLBACKS.iter().find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_format_wins_over_fallback() {
        let formats = vec!["%d.%m.%Y".to_string()];
        let d = parse_date("14.02.2026", &formats).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
    }

    #[test]
    fn falls_back_to_inference_set() {
        let d = parse_date("2026-02-14", &[]).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
    }

    #[test]
    fn unparseable_yields_none() {
        assert!(parse_date("not-a-date", &[]).is_none());
    }

    #[test]
    fn blank_yields_none() {
        assert!(parse_date("   ", &[]).is_none());
    }
}
