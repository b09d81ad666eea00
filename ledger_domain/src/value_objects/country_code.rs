// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Country Code Value Object
//!
//! A validated, uppercase, alias-normalized country tag. Unknown values
//! pass through unchanged (spec: "Unknown values pass through unchanged"),
//! so this type never rejects input — it only canonicalizes known aliases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountryCode(String);

fn alias_table() -> &'static std::collections::HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<std::collections::HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            ("U.S.A.", "USA"),
            ("USA", "USA"),
            ("US", "USA"),
            ("UNITED STATES", "USA"),
            ("UNITED STATES OF AMERICA", "USA"),
            ("UNITED ARAB EMIRATES", "UAE"),
            ("U.A.E.", "UAE"),
            ("UAE", "UAE"),
            ("UNITED KINGDOM", "UK"),
            ("U.K.", "UK"),
            ("GREAT BRITAIN", "UK"),
            ("PEOPLE'S REPUBLIC OF CHINA", "CHINA"),
            ("P.R. CHINA", "CHINA"),
            ("PRC", "CHINA"),
            ("REPUBLIC OF KOREA", "SOUTH KOREA"),
            ("KOREA, REPUBLIC OF", "SOUTH KOREA"),
        ]
        .into_iter()
        .collect()
    })
}

impl CountryCode {
    /// Uppercases and applies the alias table; never fails.
    pub fn normalize(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        let canonical = alias_table().get(upper.as_str()).copied().unwrap_or(upper.as_str());
        Self(canonical.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_known_alias() {
        assert_eq!(CountryCode::normalize("U.S.A.").as_str(), "USA");
        assert_eq!(CountryCode::normalize("united arab emirates").as_str(), "UAE");
    }

    #[test]
    fn passes_through_unknown_uppercased() {
        assert_eq!(CountryCode::normalize("kenya").as_str(), "KENYA");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = CountryCode::normalize("U.S.A.");
        let twice = CountryCode::normalize(once.as_str());
        assert_eq!(once, twice);
    }
}
