// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Organization Entity
//!
//! One record per `(normalized_name, country)` (spec.md §3). Organizations
//! are never unified across countries — the same legal entity operating
//! in two countries is two `Organization` rows, by design (spec.md §1
//! Non-goals).

use crate::value_objects::{CountryCode, OrgRole, OrgType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    id: Uuid,
    normalized_name: String,
    country: CountryCode,
    org_type: OrgType,
    raw_name_variants: Vec<String>,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    transaction_count: i64,
}

impl Organization {
    pub fn new(normalized_name: impl Into<String>, country: CountryCode, role: OrgRole, raw_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            normalized_name: normalized_name.into(),
            country,
            org_type: role.into(),
            raw_name_variants: vec![raw_name.to_string()],
            first_seen: now,
            last_seen: now,
            transaction_count: 0,
        }
    }

    /// Reconstructs an organization from persisted columns (infrastructure only).
    pub fn from_parts(
        id: Uuid,
        normalized_name: String,
        country: CountryCode,
        org_type: OrgType,
        raw_name_variants: Vec<String>,
        first_seen: DateTime<Utc>,
        last_seen: DateTime<Utc>,
        transaction_count: i64,
    ) -> Self {
        Self {
            id,
            normalized_name,
            country,
            org_type,
            raw_name_variants,
            first_seen,
            last_seen,
            transaction_count,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn country(&self) -> &CountryCode {
        &self.country
    }

    pub fn org_type(&self) -> OrgType {
        self.org_type
    }

    pub fn raw_name_variants(&self) -> &[String] {
        &self.raw_name_variants
    }

    pub fn transaction_count(&self) -> i64 {
        self.transaction_count
    }

    /// Records that this organization was observed again, as `role`, under
    /// `raw_name`. Applies the one-way type-promotion rule (spec.md §4.3
    /// step 6) and appends a raw-name variant if new.
    pub fn observe(&mut self, role: OrgRole, raw_name: &str) {
        self.org_type = self.org_type.merge(role);
        if !self.raw_name_variants.iter().any(|v| v == raw_name) {
            self.raw_name_variants.push(raw_name.to_string());
        }
        self.last_seen = Utc::now();
        self.transaction_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotes_to_mixed_on_opposite_role() {
        let mut org = Organization::new("ACME", CountryCode::normalize("KE"), OrgRole::Buyer, "ACME");
        assert_eq!(org.org_type(), OrgType::Buyer);
        org.observe(OrgRole::Supplier, "ACME LIMITED");
        assert_eq!(org.org_type(), OrgType::Mixed);
        assert!(org.raw_name_variants().iter().any(|v| v == "ACME LIMITED"));
    }

    #[test]
    fn does_not_duplicate_raw_name_variants() {
        let mut org = Organization::new("ACME", CountryCode::normalize("KE"), OrgRole::Buyer, "ACME");
        org.observe(OrgRole::Buyer, "ACME");
        assert_eq!(org.raw_name_variants().len(), 1);
    }
}
