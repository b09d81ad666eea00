// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # HS Code Value Object
//!
//! A 6-digit Harmonized System product classification code. Construction
//! implements the normalization rule from spec.md §4.2: strip non-digits,
//! left-pad to at least 6 digits, take the first 6. Invalid input (no
//! digits at all) normalizes to `None` rather than erroring — an
//! unparsable HS code is a `NULL` column, not a stage failure.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HsCode6([u8; 6]);

impl HsCode6 {
    /// Normalizes a raw HS code string per spec.md §4.2. Idempotent:
    /// `normalize(normalize(x).to_string()) == normalize(x)`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        let padded = format!("{digits:0>6}");
        let six = &padded[..6];
        let mut bytes = [0u8; 6];
        for (i, c) in six.bytes().enumerate() {
            bytes[i] = c;
        }
        Some(Self(bytes))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("HS code bytes are always ASCII digits")
    }
}

impl fmt::Display for HsCode6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_punctuation_and_pads() {
        assert_eq!(HsCode6::normalize("6907.21").unwrap().as_str(), "690721");
        assert_eq!(HsCode6::normalize("271").unwrap().as_str(), "000271");
    }

    #[test]
    fn truncates_to_first_six() {
        assert_eq!(HsCode6::normalize("12345678").unwrap().as_str(), "123456");
    }

    #[test]
    fn no_digits_is_none() {
        assert!(HsCode6::normalize("N/A").is_none());
        assert!(HsCode6::normalize("").is_none());
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in "[0-9A-Za-z.\\- ]{0,12}") {
            if let Some(first) = HsCode6::normalize(&raw) {
                let second = HsCode6::normalize(first.as_str());
                prop_assert_eq!(second, Some(first));
            }
        }
    }
}
