// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Monetary Value Objects
//!
//! `UsdAmount` and `Kilograms` are non-negative `f64` newtypes used for the
//! standardized row's derived columns. `PriceUsdPerKg` additionally
//! enforces non-negativity and is only ever constructed from a positive
//! value/weight pair (spec.md §3: `price_usd_per_kg >= 0` when present).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct UsdAmount(f64);

impl UsdAmount {
    pub fn new(value: f64) -> Result<Self, crate::PipelineError> {
        if !value.is_finite() || value < 0.0 {
            return Err(crate::PipelineError::validation_error(format!("USD amount must be >= 0, got {value}")));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Kilograms(f64);

impl Kilograms {
    pub fn new(value: f64) -> Result<Self, crate::PipelineError> {
        if !value.is_finite() || value < 0.0 {
            return Err(crate::PipelineError::validation_error(format!("kilograms must be >= 0, got {value}")));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PriceUsdPerKg(f64);

impl PriceUsdPerKg {
    /// Computes `customs_value_usd / qty_kg`, per spec.md §4.2, only when
    /// both operands are strictly positive. Returns `None` otherwise —
    /// this is how the derived column becomes `NULL`.
    pub fn derive(value_usd: UsdAmount, qty_kg: Kilograms) -> Option<Self> {
        if value_usd.value() > 0.0 && qty_kg.value() > 0.0 {
            Some(Self(value_usd.value() / qty_kg.value()))
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative() {
        assert!(UsdAmount::new(-1.0).is_err());
        assert!(Kilograms::new(-0.1).is_err());
    }

    #[test]
    fn price_requires_both_positive() {
        let value = UsdAmount::new(847.0).unwrap();
        let zero_weight = Kilograms::new(0.0).unwrap();
        assert!(PriceUsdPerKg::derive(value, zero_weight).is_none());

        let weight = Kilograms::new(100.0).unwrap();
        let zero_value = UsdAmount::new(0.0).unwrap();
        assert!(PriceUsdPerKg::derive(zero_value, weight).is_none());

        assert_eq!(PriceUsdPerKg::derive(value, weight).unwrap().value(), 8.47);
    }
}
