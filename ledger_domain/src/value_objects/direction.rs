// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shipment direction: every file, row, and fact is tagged `EXPORT` or
//! `IMPORT` relative to its reporting country.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Export,
    Import,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Export => "EXPORT",
            Self::Import => "IMPORT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Direction {
    type Err = crate::PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EXPORT" => Ok(Self::Export),
            "IMPORT" => Ok(Self::Import),
            other => Err(crate::PipelineError::invalid_parameter("direction", format!("unknown direction '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string() {
        assert_eq!(Direction::from_str("export").unwrap(), Direction::Export);
        assert_eq!(Direction::Import.to_string(), "IMPORT");
    }

    #[test]
    fn rejects_unknown() {
        assert!(Direction::from_str("SIDEWAYS").is_err());
    }
}
