// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Weight Unit Conversion
//!
//! spec.md §4.2: convert a raw quantity to kilograms using a closed unit
//! table. Units with no fixed mass factor (piece counts) yield `None`;
//! litres convert 1:1 with a caller-visible warning since density is
//! unknown.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    pub qty_kg: f64,
    pub warning: Option<&'static str>,
}

/// Returns `None` for unrecognized or non-mass units (`PCS`, `NMB`, `DZN`).
pub fn convert_to_kg(raw_qty: f64, unit: &str) -> Option<UnitConversion> {
    let factor = match unit.to_uppercase().as_str() {
        "KG" | "KGM" => 1.0,
        "MT" | "TNE" => 1000.0,
        "LBS" => 0.4536,
        "G" | "GRM" => 0.001,
        "LTR" => return Some(UnitConversion { qty_kg: raw_qty, warning: Some("litres treated as kg 1:1; density unknown") }),
        "PCS" | "NMB" | "DZN" => return None,
        _ => return None,
    };
    Some(UnitConversion { qty_kg: raw_qty * factor, warning: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_ton_converts_to_1000_kg() {
        let c = convert_to_kg(2.0, "MT").unwrap();
        assert_eq!(c.qty_kg, 2000.0);
        assert!(c.warning.is_none());
    }

    #[test]
    fn pieces_have_no_mass_conversion() {
        assert!(convert_to_kg(100.0, "PCS").is_none());
    }

    #[test]
    fn litres_warn_but_convert() {
        let c = convert_to_kg(10.0, "LTR").unwrap();
        assert_eq!(c.qty_kg, 10.0);
        assert!(c.warning.is_some());
    }

    #[test]
    fn round_trips_within_tolerance() {
        for (unit, factor) in [("KG", 1.0), ("MT", 1000.0), ("LBS", 0.4536), ("G", 0.001)] {
            let converted = convert_to_kg(1.0, unit).unwrap().qty_kg;
            assert!((converted - factor).abs() < 1e-9, "unit {unit} converted to {converted}, expected {factor}");
        }
    }
}
