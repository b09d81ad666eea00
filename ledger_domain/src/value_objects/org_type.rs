// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Organization role. Transitions are one-way: a `Buyer` seen as a
//! `Supplier` (or vice versa) becomes `Mixed` and never reverts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrgType {
    Buyer,
    Supplier,
    Mixed,
}

impl OrgType {
    /// Applies the one-way promotion rule. `role` is the side the
    /// organization was just observed acting as.
    pub fn merge(self, role: OrgRole) -> Self {
        match (self, role) {
            (Self::Mixed, _) => Self::Mixed,
            (Self::Buyer, OrgRole::Supplier) => Self::Mixed,
            (Self::Supplier, OrgRole::Buyer) => Self::Mixed,
            (existing, _) => existing,
        }
    }
}

/// The role an organization was observed in on a single standardized row,
/// as distinct from its accumulated [`OrgType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    Buyer,
    Supplier,
}

impl From<OrgRole> for OrgType {
    fn from(role: OrgRole) -> Self {
        match role {
            OrgRole::Buyer => OrgType::Buyer,
            OrgRole::Supplier => OrgType::Supplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotes_on_opposite_role() {
        assert_eq!(OrgType::Buyer.merge(OrgRole::Supplier), OrgType::Mixed);
        assert_eq!(OrgType::Supplier.merge(OrgRole::Buyer), OrgType::Mixed);
    }

    #[test]
    fn never_demotes_from_mixed() {
        assert_eq!(OrgType::Mixed.merge(OrgRole::Buyer), OrgType::Mixed);
        assert_eq!(OrgType::Mixed.merge(OrgRole::Supplier), OrgType::Mixed);
    }

    #[test]
    fn same_role_is_stable() {
        assert_eq!(OrgType::Buyer.merge(OrgRole::Buyer), OrgType::Buyer);
    }
}
