// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Watermark Entity
//!
//! One record per incremental-analytics job (spec.md §3). S6/S7 read the
//! watermark to bound incremental work, subtracting a lookback window to
//! tolerate late-arriving facts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    job_name: &'static str,
    consumed_through: Option<DateTime<Utc>>,
}

impl Watermark {
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

    pub fn new(job_name: &'static str, consumed_through: Option<DateTime<Utc>>) -> Self {
        Self { job_name, consumed_through }
    }

    pub fn job_name(&self) -> &'static str {
        self.job_name
    }

    pub fn consumed_through(&self) -> Option<DateTime<Utc>> {
        self.consumed_through
    }

    /// The lower bound for this job's next incremental scan: the
    /// watermark minus the lookback window, or "the beginning of time" if
    /// no watermark has ever been recorded.
    pub fn lower_bound(&self, lookback_days: i64) -> DateTime<Utc> {
        match self.consumed_through {
            Some(t) => t - Duration::days(lookback_days),
            None => DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn advance(&mut self, new_high_water_mark: DateTime<Utc>) {
        self.consumed_through = Some(match self.consumed_through {
            Some(existing) if existing >= new_high_water_mark => existing,
            _ => new_high_water_mark,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_bound_subtracts_lookback() {
        let now = Utc::now();
        let wm = Watermark::new("buyer_profile", Some(now));
        let bound = wm.lower_bound(7);
        assert_eq!((now - bound).num_days(), 7);
    }

    #[test]
    fn never_seen_watermark_bounds_from_epoch_start() {
        let wm = Watermark::new("buyer_profile", None);
        assert_eq!(wm.lower_bound(7), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn advance_never_moves_backwards() {
        let mut wm = Watermark::new("lane_stats", Some(Utc::now()));
        let earlier = wm.consumed_through().unwrap() - Duration::days(1);
        wm.advance(earlier);
        assert!(wm.consumed_through().unwrap() > earlier);
    }
}
