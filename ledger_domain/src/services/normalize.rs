// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Organization Name Normalization
//!
//! spec.md §4.3 step 2: uppercase, strip diacritics, replace punctuation
//! with space, collapse whitespace, then iteratively strip company-suffix
//! tokens from a closed set (longest match first) until none remain.

use std::sync::OnceLock;

/// Ordered longest-first so `"PRIVATE LIMITED"` strips before `"LIMITED"`
/// alone would otherwise leave a dangling `"PRIVATE"`.
const SUFFIX_TOKENS: &[&str] = &[
    "PRIVATE LIMITED",
    "PVT LTD",
    "LIMITED",
    "PRIVATE",
    "LLC",
    "INC",
    "CORP",
    "PLC",
    "PVT",
    "GMBH",
    "SAS",
    "FZE",
    "PJSC",
    "SRL",
    "LTD",
    "CO",
    "SA",
    "BV",
    "AG",
    "NV",
    "KG",
    "SL",
];

fn suffix_tokens_sorted() -> &'static Vec<&'static str> {
    static SORTED: OnceLock<Vec<&'static str>> = OnceLock::new();
    SORTED.get_or_init(|| {
        let mut v = SUFFIX_TOKENS.to_vec();
        v.sort_by_key(|s| std::cmp::Reverse(s.len()));
        v
    })
}

/// Strips a closed set of Latin diacritics without pulling in a full
/// Unicode-normalization dependency; names outside this set pass through
/// with their combining marks intact, which only weakens (never breaks)
/// the downstream fuzzy match.
fn strip_diacritics(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
            'È' | 'É' | 'Ê' | 'Ë' => 'E',
            'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
            'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
            'Ý' => 'Y',
            'Ñ' => 'N',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// Idempotent: `normalize(normalize(x)) == normalize(x)` (spec.md §8).
pub fn normalize_org_name(raw: &str) -> String {
    let upper = strip_diacritics(raw).to_uppercase();
    let punctuation_replaced: String =
        upper.chars().map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' }).collect();
    let collapsed = punctuation_replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut current = collapsed.clone();
    loop {
        let mut stripped_this_round = None;
        for suffix in suffix_tokens_sorted() {
            if let Some(rest) = current.strip_suffix(suffix) {
                let rest = rest.trim_end();
                if !rest.is_empty() {
                    stripped_this_round = Some(rest.to_string());
                    break;
                }
            }
        }
        match stripped_this_round {
            Some(next) => current = next,
            None => break,
        }
    }

    if current.is_empty() {
        collapsed
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_suffix() {
        assert_eq!(normalize_org_name("Acme Limited"), "ACME");
    }

    #[test]
    fn strips_longest_match_first() {
        assert_eq!(normalize_org_name("Acme Pvt Ltd"), "ACME");
    }

    #[test]
    fn handles_diacritics_and_punctuation() {
        assert_eq!(normalize_org_name("Café-Müller, S.A."), "CAFE MULLER");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_org_name("Global Trading Co., Ltd.");
        let twice = normalize_org_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn does_not_strip_down_to_empty() {
        assert_eq!(normalize_org_name("Ltd"), "LTD");
    }
}
