// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Configuration
//!
//! Bootstrap-phase configuration - the handful of settings the composition
//! root needs before it can build the `ledger_pipeline` use cases. The
//! pipeline's own settings (raw data root, chunk sizes, lookback window)
//! live in `ledger_pipeline::infrastructure::config::IngestionConfig` and are
//! loaded separately; this structure only carries what the binary itself
//! needs to start up - log verbosity and where to find everything else.
//!
//! ## Immutability
//!
//! All configuration is **immutable** after creation. This ensures:
//! - Thread safety (no synchronization needed)
//! - Predictable behavior
//! - Safe sharing across async tasks
//!
//! ## Usage
//!
//! ```rust
//! use ledger_bootstrap::config::{AppConfig, LogLevel};
//! use std::path::PathBuf;
//!
//! let config = AppConfig::builder()
//!     .app_name("ledger-pipeline")
//!     .log_level(LogLevel::Info)
//!     .ingestion_config_path(PathBuf::from("/etc/ledger-pipeline/ingestion.toml"))
//!     .build();
//!
//! println!("Running: {}", config.app_name());
//! ```

use std::path::PathBuf;

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors (default)
    Info,
    /// All messages including debug
    Debug,
    /// All messages including trace
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Bootstrap-phase application configuration
///
/// Immutable configuration structure holding the settings the composition
/// root needs before it can wire the pipeline's repositories and use cases.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application name, used as the tracing span prefix
    app_name: String,

    /// Log level
    log_level: LogLevel,

    /// Path to the `IngestionConfig` TOML file, if overridden on the CLI
    ingestion_config_path: Option<PathBuf>,

    /// Postgres connection string, if overridden on the CLI
    database_url: Option<String>,

    /// Enable verbose output
    verbose: bool,
}

impl AppConfig {
    /// Create a new configuration builder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Get application name
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get log level
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Get the ingestion config file path
    pub fn ingestion_config_path(&self) -> Option<&PathBuf> {
        self.ingestion_config_path.as_ref()
    }

    /// Get the database connection string
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    app_name: Option<String>,
    log_level: Option<LogLevel>,
    ingestion_config_path: Option<PathBuf>,
    database_url: Option<String>,
    verbose: bool,
}

impl AppConfigBuilder {
    /// Set application name
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the ingestion config file path
    pub fn ingestion_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ingestion_config_path = Some(path.into());
        self
    }

    /// Set the database connection string
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Enable verbose mode
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Build the configuration
    ///
    /// # Panics
    ///
    /// Panics if app_name was not set
    pub fn build(self) -> AppConfig {
        AppConfig {
            app_name: self.app_name.expect("app_name is required"),
            log_level: self.log_level.unwrap_or_default(),
            ingestion_config_path: self.ingestion_config_path,
            database_url: self.database_url,
            verbose: self.verbose,
        }
    }

    /// Try to build the configuration
    ///
    /// Returns Err if required fields are missing
    pub fn try_build(self) -> Result<AppConfig, String> {
        Ok(AppConfig {
            app_name: self.app_name.ok_or("app_name is required")?,
            log_level: self.log_level.unwrap_or_default(),
            ingestion_config_path: self.ingestion_config_path,
            database_url: self.database_url,
            verbose: self.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_minimal_config_with_defaults() {
        let config = AppConfig::builder().app_name("ledger-pipeline").build();

        assert_eq!(config.app_name(), "ledger-pipeline");
        assert_eq!(config.log_level(), LogLevel::Info);
        assert!(config.ingestion_config_path().is_none());
        assert!(config.database_url().is_none());
        assert!(!config.is_verbose());
    }

    #[test]
    fn builds_full_config() {
        let config = AppConfig::builder()
            .app_name("ledger-pipeline")
            .log_level(LogLevel::Debug)
            .ingestion_config_path("/etc/ledger-pipeline/ingestion.toml")
            .database_url("postgres://localhost/ledger")
            .verbose(true)
            .build();

        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.ingestion_config_path(), Some(&PathBuf::from("/etc/ledger-pipeline/ingestion.toml")));
        assert_eq!(config.database_url(), Some("postgres://localhost/ledger"));
        assert!(config.is_verbose());
    }

    #[test]
    #[should_panic(expected = "app_name is required")]
    fn build_panics_without_app_name() {
        AppConfig::builder().build();
    }

    #[test]
    fn try_build_reports_missing_app_name() {
        let result = AppConfig::builder().try_build();
        assert_eq!(result.unwrap_err(), "app_name is required");
    }
}
