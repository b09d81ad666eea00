// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse()                 │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration
///
/// Holds all CLI arguments after security validation. Every path has been
/// canonicalized and every numeric value is range-checked against the
/// bounds the corresponding stage command accepts.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub database_url: Option<String>,
}

/// Validated command variants, one per pipeline stage plus the full runner.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Ingest { raw_data_root: PathBuf, chunk_rows: Option<usize> },
    Standardize { chunk_rows: Option<usize> },
    ResolveIdentity { chunk_rows: Option<usize>, fuzzy_threshold: Option<f64> },
    LoadLedger { chunk_rows: Option<usize> },
    MirrorMatch { batch_size: Option<usize> },
    BuildProfiles { lookback_days: Option<i64> },
    RiskScore { lookback_days: Option<i64>, engine_version: Option<String>, batch_size: Option<usize> },
    RefreshServing,
    Run { raw_data_root: PathBuf },
}

/// Parse and validate CLI arguments
///
/// 1. Parse CLI with clap
/// 2. Validate all paths with `SecureArgParser`
/// 3. Validate all numeric values
/// 4. Return `ValidatedCli` on success
///
/// # Errors
///
/// Returns `ParseError` if any validation fails
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

/// Validate parsed CLI arguments
fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        SecureArgParser::validate_path(&path.to_string_lossy())?;
        Some(path.clone())
    } else {
        None
    };

    if let Some(ref url) = cli.database_url {
        SecureArgParser::validate_argument(url)?;
    }

    let command = match cli.command {
        Commands::Ingest { raw_data_root, chunk_rows } => {
            let validated_root = SecureArgParser::validate_path(&raw_data_root.to_string_lossy())?;
            let chunk_rows = validate_chunk_rows(chunk_rows)?;
            ValidatedCommand::Ingest { raw_data_root: validated_root, chunk_rows }
        }
        Commands::Standardize { chunk_rows } => ValidatedCommand::Standardize { chunk_rows: validate_chunk_rows(chunk_rows)? },
        Commands::ResolveIdentity { chunk_rows, fuzzy_threshold } => {
            let chunk_rows = validate_chunk_rows(chunk_rows)?;
            let fuzzy_threshold = match fuzzy_threshold {
                Some(t) => Some(SecureArgParser::validate_number("fuzzy-threshold", t, Some(0.0), Some(1.0))?),
                None => None,
            };
            ValidatedCommand::ResolveIdentity { chunk_rows, fuzzy_threshold }
        }
        Commands::LoadLedger { chunk_rows } => ValidatedCommand::LoadLedger { chunk_rows: validate_chunk_rows(chunk_rows)? },
        Commands::MirrorMatch { batch_size } => {
            let batch_size = match batch_size {
                Some(b) => Some(SecureArgParser::validate_number("batch-size", b, Some(1), Some(100_000))?),
                None => None,
            };
            ValidatedCommand::MirrorMatch { batch_size }
        }
        Commands::BuildProfiles { lookback_days } => {
            let lookback_days = validate_lookback_days(lookback_days)?;
            ValidatedCommand::BuildProfiles { lookback_days }
        }
        Commands::RiskScore { lookback_days, engine_version, batch_size } => {
            let lookback_days = validate_lookback_days(lookback_days)?;
            if let Some(ref v) = engine_version {
                SecureArgParser::validate_argument(v)?;
            }
            let batch_size = match batch_size {
                Some(b) => Some(SecureArgParser::validate_number("batch-size", b, Some(1), Some(100_000))?),
                None => None,
            };
            ValidatedCommand::RiskScore { lookback_days, engine_version, batch_size }
        }
        Commands::RefreshServing => ValidatedCommand::RefreshServing,
        Commands::Run { raw_data_root } => {
            let validated_root = SecureArgParser::validate_path(&raw_data_root.to_string_lossy())?;
            ValidatedCommand::Run { raw_data_root: validated_root }
        }
    };

    Ok(ValidatedCli { command, verbose: cli.verbose, config, database_url: cli.database_url })
}

fn validate_chunk_rows(chunk_rows: Option<usize>) -> Result<Option<usize>, ParseError> {
    match chunk_rows {
        Some(c) => Ok(Some(SecureArgParser::validate_number("chunk-rows", c, Some(1), Some(1_000_000))?)),
        None => Ok(None),
    }
}

fn validate_lookback_days(lookback_days: Option<i64>) -> Result<Option<i64>, ParseError> {
    match lookback_days {
        Some(d) => Ok(Some(SecureArgParser::validate_number("lookback-days", d, Some(0), Some(3650))?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn rejects_chunk_rows_out_of_range() {
        let cli = Cli::parse_from(["ledger-pipeline", "ingest", "--raw-data-root", ".", "--chunk-rows", "0"]);
        let result = validate_cli(cli);
        assert!(matches!(result, Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn accepts_refresh_serving_with_no_arguments() {
        let cli = Cli::parse_from(["ledger-pipeline", "refresh-serving"]);
        let validated = validate_cli(cli).unwrap();
        assert!(matches!(validated.command, ValidatedCommand::RefreshServing));
    }
}
