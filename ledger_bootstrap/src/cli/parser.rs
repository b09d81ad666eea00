// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap.
//!
//! This module defines the CLI structure and handles argument parsing.
//! Security validation happens in the validator module after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-pipeline")]
#[command(about = concat!("Trade-data ledger pipeline v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (ingestion_config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the Postgres connection string from the config file
    #[arg(long)]
    pub database_url: Option<String>,
}

/// CLI subcommands, one per pipeline stage plus a full-pipeline runner.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// S1 - walk the raw data root and register new source files
    Ingest {
        /// Root directory to scan (country/direction/format tree)
        #[arg(short, long)]
        raw_data_root: PathBuf,

        /// Rows to read per chunk
        #[arg(long)]
        chunk_rows: Option<usize>,
    },

    /// S2 - map raw rows onto the canonical schema
    Standardize {
        #[arg(long)]
        chunk_rows: Option<usize>,
    },

    /// S3 - resolve exporter/buyer names to organization identities
    ResolveIdentity {
        #[arg(long)]
        chunk_rows: Option<usize>,

        /// Fuzzy-match acceptance threshold, 0.0-1.0
        #[arg(long)]
        fuzzy_threshold: Option<f64>,
    },

    /// S4 - promote standardized rows into immutable ledger facts
    LoadLedger {
        #[arg(long)]
        chunk_rows: Option<usize>,
    },

    /// S5 - pair hidden-buyer exports with their likely import mirror
    MirrorMatch {
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// S6 - rebuild buyer/exporter/corridor/lane analytics profiles
    BuildProfiles {
        #[arg(long)]
        lookback_days: Option<i64>,
    },

    /// S7 - score shipments and buyers against the risk rule set
    RiskScore {
        #[arg(long)]
        lookback_days: Option<i64>,

        #[arg(long)]
        engine_version: Option<String>,

        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// S8 - recompute the materialized serving summary
    RefreshServing,

    /// Run every stage in order: S1-S4 sequentially, then S5-S8 concurrently
    Run {
        /// Root directory to scan for S1
        #[arg(short, long)]
        raw_data_root: PathBuf,
    },
}

/// Parse CLI arguments
///
/// This is the entry point for CLI parsing. It uses clap to parse
/// arguments and returns the parsed CLI structure.
///
/// # Panics
///
/// Clap will exit the process with appropriate error message if parsing fails
pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ingest_with_required_root() {
        let cli = Cli::parse_from(["ledger-pipeline", "ingest", "--raw-data-root", "/data"]);
        match cli.command {
            Commands::Ingest { raw_data_root, chunk_rows } => {
                assert_eq!(raw_data_root, PathBuf::from("/data"));
                assert_eq!(chunk_rows, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_run_with_verbose_flag() {
        let cli = Cli::parse_from(["ledger-pipeline", "--verbose", "run", "--raw-data-root", "/data"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Run { .. }));
    }
}
