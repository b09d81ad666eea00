// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Identifies the aggregation context of a [`RiskOpinion`](crate::entities::RiskOpinion),
//! e.g. `GLOBAL` or `LANE:CN->KE`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey(String);

impl ScopeKey {
    pub fn global() -> Self {
        Self("GLOBAL".to_string())
    }

    pub fn lane(origin: &str, destination: &str) -> Self {
        Self(format!("LANE:{origin}->{destination}"))
    }

    pub fn entity(kind: &str, id: &str) -> Self {
        Self(format!("{kind}:{id}"))
    }

    /// Rehydrates an already-formatted key as persisted (infrastructure only).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
