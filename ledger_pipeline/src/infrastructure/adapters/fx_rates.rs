// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # FX Rate Cache
//!
//! [`ledger_domain::services::currency::FxRateLookup`] is a synchronous
//! trait so the pure `convert_to_usd` helper stays free of an async
//! runtime dependency; querying Postgres per row would defeat that. This
//! adapter loads the whole `fx_rates` table once per pipeline run and
//! answers lookups from memory, falling back to the most recent prior
//! rate on file for a currency when no exact-date row exists.

use chrono::NaiveDate;
use ledger_domain::services::currency::FxRateLookup;
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;

use super::super::repositories::map_sqlx_error;

/// In-memory snapshot of `fx_rates`, keyed by currency then by date so a
/// lookup for a date with no exact row can fall back to the latest rate
/// on file at or before that date.
pub struct PgFxRateLookup {
    rates_by_currency: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl PgFxRateLookup {
    /// Loads every row from `fx_rates` into memory. Call once at the start
    /// of a pipeline run; rates are immutable for the run's duration.
    pub async fn load(pool: &PgPool) -> Result<Self, PipelineError> {
        let rows = sqlx::query("SELECT currency_code, as_of_date, usd_rate FROM fx_rates")
            .fetch_all(pool)
            .await
            .map_err(|e| map_sqlx_error("load fx_rates", e))?;

        let mut rates_by_currency: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for row in &rows {
            let currency: String = row.try_get("currency_code").map_err(|e| map_sqlx_error("read fx_rates.currency_code", e))?;
            let as_of: NaiveDate = row.try_get("as_of_date").map_err(|e| map_sqlx_error("read fx_rates.as_of_date", e))?;
            let rate: f64 = row.try_get("usd_rate").map_err(|e| map_sqlx_error("read fx_rates.usd_rate", e))?;
            rates_by_currency.entry(currency.to_uppercase()).or_default().insert(as_of, rate);
        }
        Ok(Self { rates_by_currency })
    }
}

impl FxRateLookup for PgFxRateLookup {
    fn usd_rate(&self, currency_code: &str, as_of_date: NaiveDate) -> Option<f64> {
        let by_date = self.rates_by_currency.get(&currency_code.to_uppercase())?;
        by_date.range(..=as_of_date).next_back().map(|(_, rate)| *rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(rows: &[(&str, &str, f64)]) -> PgFxRateLookup {
        let mut rates_by_currency: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for (currency, date, rate) in rows {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
            rates_by_currency.entry(currency.to_uppercase()).or_default().insert(date, *rate);
        }
        PgFxRateLookup { rates_by_currency }
    }

    #[test]
    fn falls_back_to_most_recent_prior_rate() {
        let cache = lookup(&[("KES", "2025-01-01", 0.0078), ("KES", "2025-03-01", 0.0079)]);
        let d = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        assert_eq!(cache.usd_rate("KES", d), Some(0.0078));
    }

    #[test]
    fn missing_currency_yields_none() {
        let cache = lookup(&[("KES", "2025-01-01", 0.0078)]);
        let d = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        assert_eq!(cache.usd_rate("VND", d), None);
    }

    #[test]
    fn date_before_any_rate_yields_none() {
        let cache = lookup(&[("KES", "2025-03-01", 0.0079)]);
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(cache.usd_rate("KES", d), None);
    }
}
