// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Hidden Buyer Detection
//!
//! spec.md §4 DESIGN NOTES: a buyer name is "hidden" when it is null/blank
//! or matches one of a closed set of consignment placeholders, case
//! insensitively, as a substring.

const PATTERNS: &[&str] = &["TO THE ORDER", "TO ORDER", "BANK", "L/C", "LETTER OF CREDIT"];

pub fn is_hidden(buyer_name: Option<&str>) -> bool {
    match buyer_name.map(str::trim) {
        None => true,
        Some("") => true,
        Some(name) => {
            let upper = name.to_uppercase();
            PATTERNS.iter().any(|p| upper.contains(p))
        }
    }
}
