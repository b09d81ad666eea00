// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # FX Rate Lookup
//!
//! spec.md §9 Open Questions: no FX-rate table is part of this
//! specification; a lookup is an external port the infrastructure layer
//! supplies. When no rate is available, conversion is a no-op yielding
//! `None` rather than a guessed value.

/// Implemented by infrastructure (e.g. a rates table or a cached external
/// feed). Pure domain code only ever sees this trait.
pub trait FxRateLookup: Send + Sync {
    /// Rate to multiply a `currency_code` amount by to obtain USD, as of
    /// `as_of_date` (a `NaiveDate` serialized by the caller). `None` when
    /// no rate is on file for that currency/date.
    fn usd_rate(&self, currency_code: &str, as_of_date: chrono::NaiveDate) -> Option<f64>;
}

/// Leaves USD fields NULL rather than guessing, per spec.md §4.2.
pub fn convert_to_usd(amount: f64, currency_code: &str, as_of: chrono::NaiveDate, rates: &dyn FxRateLookup) -> Option<f64> {
    if currency_code.eq_ignore_ascii_case("USD") {
        return Some(amount);
    }
    rates.usd_rate(currency_code, as_of).map(|rate| amount * rate)
}
